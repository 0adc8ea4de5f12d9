//! Bounce Pit entry point
//!
//! Natively this runs the frame loop headless against the rapier
//! physics world and a logging audio backend. The browser build starts
//! from `platform::web::start` instead.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::rc::Rc;

    use bounce_pit::assets::ResourceLoader;
    use bounce_pit::audio::ImpactAudio;
    use bounce_pit::camera::LookAtCamera;
    use bounce_pit::consts::SIM_DT;
    use bounce_pit::platform::{FsFetcher, LogAudio, init_logging};
    use bounce_pit::renderer::{InstanceRaw, instance_bytes, write_instances};
    use bounce_pit::sim::{
        FrameClock, FrameOrchestrator, PointerEvent, RapierWorld, Scene, SceneConfig,
    };
    use bounce_pit::stats::FpsCounter;
    use bounce_pit::{PerformanceGovernor, Result, Settings};

    const DEFAULT_FRAMES: u64 = 600;

    pub fn run() -> Result<()> {
        init_logging();
        log::info!("Bounce Pit (headless) starting...");

        let frames = std::env::args()
            .nth(1)
            .and_then(|arg| arg.parse::<u64>().ok())
            .unwrap_or(DEFAULT_FRAMES);

        let settings = Settings::load();
        let governor = PerformanceGovernor::from_settings(&settings);

        // Loads run in the background; the loop never waits for them
        let mut loader = ResourceLoader::new(FsFetcher::new(&settings.asset_root));
        let clip = loader.request(&settings.audio_url);
        let texture = loader.request(&settings.texture_url);
        let environment = loader.request(&settings.environment_url);

        let scene = Scene::build(&SceneConfig::new(&governor, &settings), Some(texture.clone()));
        let audio = ImpactAudio::new(
            LogAudio::default(),
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

        let camera = LookAtCamera::default();
        let mut instances: Vec<InstanceRaw> = Vec::new();
        let clicked = orchestrator.scene().balls().next();

        for frame in 0..frames {
            let now_ms = frame as f64 * 1000.0 * f64::from(SIM_DT);
            // The world comes up a frame late, like an async physics init
            if frame == 1 {
                orchestrator.attach_world(RapierWorld::default());
            }
            if frame == frames / 2 {
                if let Some(ball) = clicked {
                    orchestrator.pointer(PointerEvent::Enter(ball))?;
                    orchestrator.pointer(PointerEvent::Click(ball))?;
                    log::info!("Clicked ball {}", ball.0);
                }
            }

            let report = orchestrator.tick(SIM_DT, now_ms, &camera);
            let scene = orchestrator.scene();
            write_instances(&scene.renderables, &scene.interaction, &mut instances);

            if frame % 60 == 59 {
                let awake = orchestrator.world().map_or(0, RapierWorld::awake_count);
                log::info!(
                    "frame {}: {} fps, {} awake, {} plays this frame, {} instance bytes",
                    report.frame,
                    counter.borrow().fps(),
                    awake,
                    report.impacts.plays,
                    instance_bytes(&instances).len(),
                );
            }
        }

        let counter = counter.borrow();
        log::info!(
            "Done: {} frames ({} skipped), {} impacts, {} plays, texture {}, environment {}",
            counter.frames(),
            counter.skipped(),
            counter.impacts(),
            orchestrator.audio().backend().plays(),
            if texture.is_ready() { "ready" } else { "fallback" },
            if environment.is_ready() { "ready" } else { "fallback" },
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = headless::run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
