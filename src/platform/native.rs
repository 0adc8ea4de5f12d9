//! Native platform glue

use std::path::{Path, PathBuf};

use crate::assets::{Fetch, ResourceSink, SharedBytes};
use crate::audio::AudioBackend;

pub fn init_logging() {
    // Ignore a second init from tests or embedding hosts
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Reads resources from a directory on a background thread per request.
/// URLs are resolved relative to `root`, ignoring a leading slash.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, url: &str) -> PathBuf {
        self.root.join(url.trim_start_matches('/'))
    }
}

impl Fetch for FsFetcher {
    fn fetch(&mut self, url: &str, sink: ResourceSink) {
        let path = self.resolve(url);
        log::debug!("Reading {}", path.display());
        let spawned = std::thread::Builder::new()
            .name("fetch".into())
            .spawn(move || {
                let result = std::fs::read(&path).map_err(|e| format!("{}: {e}", path.display()));
                sink.resolve(result);
            });
        if let Err(e) = spawned {
            // The sink moved into the failed closure and was dropped; the
            // resource stays pending and its consumers keep their fallback.
            log::error!("Failed to spawn fetch thread for {url}: {e}");
        }
    }
}

/// Audio backend without an output device. Voices never finish on their
/// own; every play is logged and counted.
#[derive(Debug, Default)]
pub struct LogAudio {
    playing: Vec<bool>,
    plays: u64,
    stops: u64,
}

impl LogAudio {
    pub fn plays(&self) -> u64 {
        self.plays
    }

    pub fn stops(&self) -> u64 {
        self.stops
    }

    pub fn voices(&self) -> usize {
        self.playing.len()
    }
}

impl AudioBackend for LogAudio {
    type Voice = usize;

    fn create_voice(&mut self, clip: &SharedBytes, volume: f32) -> Option<usize> {
        if clip.is_empty() {
            log::warn!("Refusing voice over an empty clip");
            return None;
        }
        let voice = self.playing.len();
        self.playing.push(false);
        log::debug!("Voice {voice} created ({} byte clip, volume {volume})", clip.len());
        Some(voice)
    }

    fn play(&mut self, voice: &mut usize) {
        if let Some(playing) = self.playing.get_mut(*voice) {
            *playing = true;
            self.plays += 1;
            log::trace!("Voice {voice} play");
        }
    }

    fn stop(&mut self, voice: &mut usize) {
        if let Some(playing) = self.playing.get_mut(*voice) {
            *playing = false;
            self.stops += 1;
        }
    }

    fn is_playing(&self, voice: &usize) -> bool {
        self.playing.get(*voice).copied().unwrap_or(false)
    }
}
