//! Impact audio
//!
//! One shared clip (loaded once through the resource loader) drives one
//! voice per dynamic ball. Each tick every ball's velocity is sampled; any
//! axis faster than the threshold is an impact, and an impact restarts the
//! ball's voice: stop if playing, then play from the start.
//!
//! The rule is evaluated per sample, not on a rising edge, so a ball that
//! stays above the threshold retriggers every tick (audible as a stutter
//! on vibrating balls). That is the expected behavior.

use glam::Vec3;

use crate::assets::{Resource, SharedBytes};
use crate::sim::{BodyKind, BodyRegistry, EntityId, PhysicsWorld};

/// Audio output capability
pub trait AudioBackend {
    type Voice;

    /// Create a voice over the shared clip; `None` if the clip is unusable
    fn create_voice(&mut self, clip: &SharedBytes, volume: f32) -> Option<Self::Voice>;
    /// Start playback from the beginning
    fn play(&mut self, voice: &mut Self::Voice);
    fn stop(&mut self, voice: &mut Self::Voice);
    fn is_playing(&self, voice: &Self::Voice) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// Per-entity voice. Created lazily on the first impact after the clip is
/// ready; never created (and never played) while the clip is unset.
#[derive(Debug)]
pub struct AudioVoice<V> {
    voice: Option<V>,
}

impl<V> Default for AudioVoice<V> {
    fn default() -> Self {
        Self { voice: None }
    }
}

impl<V> AudioVoice<V> {
    pub fn is_bound(&self) -> bool {
        self.voice.is_some()
    }

    pub fn state<B: AudioBackend<Voice = V>>(&self, backend: &B) -> PlaybackState {
        match &self.voice {
            Some(voice) if backend.is_playing(voice) => PlaybackState::Playing,
            _ => PlaybackState::Idle,
        }
    }

    pub fn handle(&self) -> Option<&V> {
        self.voice.as_ref()
    }
}

/// True when any velocity axis exceeds `threshold` in magnitude
#[inline]
pub fn is_impact(velocity: Vec3, threshold: f32) -> bool {
    velocity.abs().max_element() > threshold
}

/// What a single impact evaluation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactOutcome {
    /// Below threshold
    Quiet,
    /// Clip not ready (or unusable); event discarded
    Dropped,
    /// Voice was idle and started
    Played,
    /// Voice was playing; stopped then started
    Restarted,
}

/// Per-tick impact counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImpactTally {
    pub events: u32,
    pub plays: u32,
    pub restarts: u32,
    pub dropped: u32,
}

impl ImpactTally {
    fn record(&mut self, outcome: ImpactOutcome) {
        match outcome {
            ImpactOutcome::Quiet => return,
            ImpactOutcome::Dropped => self.dropped += 1,
            ImpactOutcome::Played => self.plays += 1,
            ImpactOutcome::Restarted => {
                self.plays += 1;
                self.restarts += 1;
            }
        }
        self.events += 1;
    }
}

/// Impact audio controller for the whole scene
pub struct ImpactAudio<B: AudioBackend> {
    backend: B,
    clip: Resource,
    /// Indexed by entity; `None` for static/kinematic entities
    voices: Vec<Option<AudioVoice<B::Voice>>>,
    threshold: f32,
    volume: f32,
}

impl<B: AudioBackend> ImpactAudio<B> {
    /// One voice slot per dynamic entity in `registry`
    pub fn new(
        backend: B,
        clip: Resource,
        registry: &BodyRegistry,
        threshold: f32,
        volume: f32,
    ) -> Self {
        let voices = (0..registry.len())
            .map(|i| {
                (registry.kind(EntityId(i)) == Some(BodyKind::Dynamic))
                    .then(AudioVoice::default)
            })
            .collect();
        Self {
            backend,
            clip,
            voices,
            threshold,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn clip(&self) -> &Resource {
        &self.clip
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn voice(&self, id: EntityId) -> Option<&AudioVoice<B::Voice>> {
        self.voices.get(id.0).and_then(Option::as_ref)
    }

    /// Number of entities carrying a voice slot
    pub fn voice_slots(&self) -> usize {
        self.voices.iter().filter(|v| v.is_some()).count()
    }

    pub fn state(&self, id: EntityId) -> PlaybackState {
        self.voice(id)
            .map_or(PlaybackState::Idle, |v| v.state(&self.backend))
    }

    /// Apply the impact rule to one velocity sample
    pub fn on_sample(&mut self, id: EntityId, velocity: Vec3) -> ImpactOutcome {
        if !is_impact(velocity, self.threshold) {
            return ImpactOutcome::Quiet;
        }
        let Some(Some(slot)) = self.voices.get_mut(id.0) else {
            return ImpactOutcome::Quiet;
        };
        let Some(clip) = self.clip.ready() else {
            return ImpactOutcome::Dropped;
        };
        if slot.voice.is_none() {
            slot.voice = self.backend.create_voice(clip, self.volume);
        }
        let Some(voice) = slot.voice.as_mut() else {
            return ImpactOutcome::Dropped;
        };

        let outcome = if self.backend.is_playing(voice) {
            self.backend.stop(voice);
            ImpactOutcome::Restarted
        } else {
            ImpactOutcome::Played
        };
        self.backend.play(voice);
        outcome
    }

    /// Sample every dynamic body once
    pub fn evaluate<W: PhysicsWorld + ?Sized>(
        &mut self,
        registry: &BodyRegistry,
        world: &W,
    ) -> ImpactTally {
        let mut tally = ImpactTally::default();
        for (id, handle) in registry.dynamic_bodies() {
            let Some(velocity) = world.velocity(handle) else {
                continue;
            };
            tally.record(self.on_sample(id, velocity));
        }
        if tally.dropped > 0 {
            log::trace!("{} impact(s) dropped, clip {} not ready", tally.dropped, self.clip.url());
        }
        tally
    }
}
