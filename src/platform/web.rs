//! Browser platform glue
//!
//! The host page owns the canvas and the requestAnimationFrame loop. It
//! creates a [`Playground`], forwards pointer events by entity id, calls
//! [`Playground::tick`] once per display refresh and uploads
//! [`Playground::instance_bytes`] to its renderer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioBuffer, AudioBufferSourceNode, AudioContext, GainNode};

use crate::assets::{Fetch, Resource, ResourceLoader, ResourceSink, SharedBytes};
use crate::audio::{AudioBackend, ImpactAudio};
use crate::camera::LookAtCamera;
use crate::governor::PerformanceGovernor;
use crate::renderer::{InstanceRaw, instance_bytes, write_instances};
use crate::settings::Settings;
use crate::sim::{
    EntityId, FrameClock, FrameOrchestrator, PointerEvent, RapierWorld, Scene, SceneConfig,
};
use crate::stats::FpsCounter;

pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
}

/// Fetches resources over HTTP relative to `base`
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    base: String,
}

impl HttpFetcher {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    fn full_url(&self, url: &str) -> String {
        if self.base.is_empty() {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.base.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
    let window = web_sys::window().ok_or("no window")?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| format!("{e:?}"))?;
    let response: web_sys::Response = response.dyn_into().map_err(|e| format!("{e:?}"))?;
    if !response.ok() {
        return Err(format!("HTTP {} {}", response.status(), response.status_text()));
    }
    let buffer = response.array_buffer().map_err(|e| format!("{e:?}"))?;
    let buffer = JsFuture::from(buffer).await.map_err(|e| format!("{e:?}"))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

impl Fetch for HttpFetcher {
    fn fetch(&mut self, url: &str, sink: ResourceSink) {
        let url = self.full_url(url);
        wasm_bindgen_futures::spawn_local(async move {
            let result = fetch_bytes(&url).await;
            sink.resolve(result);
        });
    }
}

/// Web Audio output
///
/// The shared clip is decoded once into an `AudioBuffer`. Each voice owns a
/// gain node; every play starts a fresh buffer source through it, since a
/// source node can only be started once.
pub struct WebAudio {
    ctx: Option<AudioContext>,
    buffer: Rc<RefCell<Option<AudioBuffer>>>,
    decoding: bool,
}

impl Default for WebAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl WebAudio {
    pub fn new() -> Self {
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            buffer: Rc::new(RefCell::new(None)),
            decoding: false,
        }
    }

    /// Browsers keep the context suspended until a user gesture
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }
    }

    /// Kick off decoding of the clip; voices are refused until it lands
    fn start_decode(&mut self, ctx: &AudioContext, clip: &SharedBytes) {
        if self.decoding {
            return;
        }
        self.decoding = true;
        let bytes = js_sys::Uint8Array::from(&clip[..]);
        let promise = match ctx.decode_audio_data(&bytes.buffer()) {
            Ok(promise) => promise,
            Err(e) => {
                log::warn!("Audio clip rejected: {e:?}");
                return;
            }
        };
        let slot = self.buffer.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let decoded = JsFuture::from(promise).await;
            match decoded.map(|value| value.dyn_into::<AudioBuffer>()) {
                Ok(Ok(buffer)) => {
                    log::info!("Audio clip decoded ({:.2}s)", buffer.duration());
                    *slot.borrow_mut() = Some(buffer);
                }
                Ok(Err(_)) | Err(_) => log::warn!("Audio clip could not be decoded"),
            }
        });
    }
}

/// One entity's voice: a gain stage plus the source of the current play
pub struct WebVoice {
    gain: GainNode,
    source: Option<AudioBufferSourceNode>,
    /// Cleared by the current source's `ended` event
    playing: Rc<Cell<bool>>,
    _on_ended: Option<Closure<dyn FnMut()>>,
}

impl AudioBackend for WebAudio {
    type Voice = WebVoice;

    fn create_voice(&mut self, clip: &SharedBytes, volume: f32) -> Option<WebVoice> {
        if clip.is_empty() {
            return None;
        }
        let ctx = self.ctx.clone()?;
        if self.buffer.borrow().is_none() {
            self.start_decode(&ctx, clip);
            return None;
        }
        let gain = ctx.create_gain().ok()?;
        gain.gain().set_value(volume);
        gain.connect_with_audio_node(&ctx.destination()).ok()?;
        Some(WebVoice {
            gain,
            source: None,
            playing: Rc::new(Cell::new(false)),
            _on_ended: None,
        })
    }

    fn play(&mut self, voice: &mut WebVoice) {
        let Some(ctx) = &self.ctx else { return };
        let buffer = self.buffer.borrow();
        let Some(buffer) = buffer.as_ref() else { return };
        self.resume();

        let Ok(source) = ctx.create_buffer_source() else {
            return;
        };
        source.set_buffer(Some(buffer));
        if source.connect_with_audio_node(&voice.gain).is_err() {
            return;
        }

        // A fresh flag per play so a stopped source's late `ended` event
        // cannot clear the flag of the play that replaced it
        let playing = Rc::new(Cell::new(true));
        let flag = playing.clone();
        let on_ended = Closure::<dyn FnMut()>::new(move || flag.set(false));
        source.set_onended(Some(on_ended.as_ref().unchecked_ref()));
        if source.start().is_err() {
            return;
        }

        voice.source = Some(source);
        voice.playing = playing;
        voice._on_ended = Some(on_ended);
    }

    fn stop(&mut self, voice: &mut WebVoice) {
        if let Some(source) = voice.source.take() {
            source.set_onended(None);
            let _ = source.stop();
        }
        voice.playing.set(false);
    }

    fn is_playing(&self, voice: &WebVoice) -> bool {
        voice.playing.get()
    }
}

/// Browser-facing handle over the whole frame loop
#[wasm_bindgen]
pub struct Playground {
    orchestrator: FrameOrchestrator<RapierWorld, WebAudio>,
    camera: LookAtCamera,
    loader: ResourceLoader<HttpFetcher>,
    texture: Resource,
    environment: Resource,
    counter: Rc<RefCell<FpsCounter>>,
    instances: Vec<InstanceRaw>,
}

#[wasm_bindgen]
impl Playground {
    /// Build the scene and start the non-blocking loads. `asset_base` is
    /// prefixed to every asset URL; pass "" to fetch relative to the page.
    #[wasm_bindgen(constructor)]
    pub fn new(asset_base: &str) -> Playground {
        let settings = Settings::load();
        let governor = PerformanceGovernor::from_settings(&settings);
        log::info!(
            "Bounce Pit starting: {} balls ({}), seed {:#x}",
            governor.population,
            settings.quality.as_str(),
            settings.seed
        );

        let mut loader = ResourceLoader::new(HttpFetcher::new(asset_base));
        let clip = loader.request(&settings.audio_url);
        let texture = loader.request(&settings.texture_url);
        let environment = loader.request(&settings.environment_url);

        let scene = Scene::build(&SceneConfig::new(&governor, &settings), Some(texture.clone()));
        let audio = ImpactAudio::new(
            WebAudio::new(),
            clip,
            &scene.registry,
            settings.impact_threshold,
            settings.effective_volume(),
        );
        let counter = Rc::new(RefCell::new(FpsCounter::new()));
        let mut orchestrator =
            FrameOrchestrator::new(scene, audio, FrameClock::new(governor.step));
        if settings.show_fps {
            orchestrator.set_probe(Some(Box::new(counter.clone())));
        }
        orchestrator.attach_world(RapierWorld::default());

        Playground {
            orchestrator,
            camera: LookAtCamera::default(),
            loader,
            texture,
            environment,
            counter,
            instances: Vec::new(),
        }
    }

    /// Run one frame; `dt` is the elapsed time in seconds since the last call
    pub fn tick(&mut self, dt: f32) {
        let now_ms = web_sys::window()
            .and_then(|w| w.performance())
            .map_or(0.0, |p| p.now());
        self.orchestrator.tick(dt, now_ms, &self.camera);
        let scene = self.orchestrator.scene();
        write_instances(&scene.renderables, &scene.interaction, &mut self.instances);
    }

    /// Orbit the camera (radians)
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        self.camera.orbit(yaw, pitch);
    }

    pub fn pointer_enter(&mut self, id: usize) {
        self.pointer(PointerEvent::Enter(EntityId(id)));
    }

    pub fn pointer_leave(&mut self, id: usize) {
        self.pointer(PointerEvent::Leave(EntityId(id)));
    }

    pub fn click(&mut self, id: usize) {
        // First gesture is what lets the audio context run
        self.orchestrator.audio().backend().resume();
        self.pointer(PointerEvent::Click(EntityId(id)));
    }

    /// Instance records for the last tick, one per entity in id order
    pub fn instance_bytes(&self) -> Vec<u8> {
        instance_bytes(&self.instances).to_vec()
    }

    pub fn entity_count(&self) -> usize {
        self.orchestrator.scene().renderables.len()
    }

    pub fn fps(&self) -> u32 {
        self.counter.borrow().fps()
    }

    pub fn texture_ready(&self) -> bool {
        self.texture.is_ready()
    }

    pub fn environment_ready(&self) -> bool {
        self.environment.is_ready()
    }

    /// Loads still in flight
    pub fn pending_loads(&self) -> usize {
        self.loader.pending_count()
    }
}

impl Playground {
    fn pointer(&mut self, event: PointerEvent) {
        if let Err(e) = self.orchestrator.pointer(event) {
            log::debug!("Pointer event ignored: {e}");
        }
    }
}

/// Module entry: logging only. The host page constructs the [`Playground`]
/// once its canvas and renderer are up.
#[wasm_bindgen(start)]
pub fn start() {
    init_logging();
    log::info!("Bounce Pit module loaded");
}
