//! Test doubles for the external capabilities

use std::sync::Arc;

use glam::Vec3;

use super::body::{BodyDesc, BodyHandle, BodyKind, Transform};
use super::world::PhysicsWorld;
use crate::assets::{Fetch, ResourceSink, SharedBytes};
use crate::audio::AudioBackend;
use crate::camera::ViewCamera;

#[derive(Debug, Clone)]
struct ScriptedBody {
    kind: BodyKind,
    transform: Transform,
    velocity: Vec3,
}

/// Physics world without forces: dynamic bodies drift by their velocity,
/// everything else stays where it is put. Records velocity writes.
#[derive(Debug, Default)]
pub struct ScriptedWorld {
    bodies: Vec<ScriptedBody>,
    velocity_writes: Vec<(BodyHandle, Vec3)>,
    kinematic_writes: usize,
    steps: u32,
}

impl ScriptedWorld {
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn velocity_writes(&self) -> &[(BodyHandle, Vec3)] {
        &self.velocity_writes
    }

    pub fn kinematic_writes(&self) -> usize {
        self.kinematic_writes
    }

    /// Teleport a body (test setup, not recorded)
    pub fn place(&mut self, handle: BodyHandle, transform: Transform) {
        if let Some(body) = self.bodies.get_mut(handle.0 as usize) {
            body.transform = transform;
        }
    }

    /// Bring every body to rest (test setup, not recorded)
    pub fn settle(&mut self) {
        for body in &mut self.bodies {
            body.velocity = Vec3::ZERO;
        }
    }

    /// Overwrite a velocity without recording it as a write
    pub fn nudge(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle.0 as usize) {
            body.velocity = velocity;
        }
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn step(&mut self, dt: f32) {
        for body in &mut self.bodies {
            if body.kind == BodyKind::Dynamic {
                body.transform.position += body.velocity * dt;
            }
        }
        self.steps += 1;
    }

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(ScriptedBody {
            kind: desc.kind(),
            transform: desc.transform,
            velocity: Vec3::ZERO,
        });
        handle
    }

    fn transform(&self, handle: BodyHandle) -> Option<Transform> {
        self.bodies.get(handle.0 as usize).map(|b| b.transform)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies.get(handle.0 as usize).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle.0 as usize) {
            if body.kind == BodyKind::Dynamic {
                body.velocity = velocity;
                self.velocity_writes.push((handle, velocity));
            }
        }
    }

    fn set_kinematic_transform(&mut self, handle: BodyHandle, transform: Transform) {
        if let Some(body) = self.bodies.get_mut(handle.0 as usize) {
            if body.kind == BodyKind::Kinematic {
                body.transform = transform;
                self.kinematic_writes += 1;
            }
        }
    }
}

/// Camera with a fixed view direction
#[derive(Debug, Clone, Copy)]
pub struct FixedCamera(pub Vec3);

impl ViewCamera for FixedCamera {
    fn view_direction(&self) -> Vec3 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    Create(usize),
    Play(usize),
    Stop(usize),
}

/// Audio backend that records every call; voices are indices
#[derive(Debug, Default)]
pub struct RecordingAudio {
    calls: Vec<AudioCall>,
    playing: Vec<bool>,
    clips: Vec<usize>,
}

impl RecordingAudio {
    pub fn calls(&self) -> &[AudioCall] {
        &self.calls
    }

    pub fn plays(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, AudioCall::Play(_)))
            .count()
    }

    /// Distinct clip buffers voices were created from
    pub fn clips_seen(&self) -> usize {
        self.clips.len()
    }

    /// Playback reached the end of the clip
    pub fn finish(&mut self, voice: usize) {
        self.force_stop(voice);
    }

    /// Stop a voice outside the controller (not recorded)
    pub fn force_stop(&mut self, voice: usize) {
        if let Some(playing) = self.playing.get_mut(voice) {
            *playing = false;
        }
    }
}

impl AudioBackend for RecordingAudio {
    type Voice = usize;

    fn create_voice(&mut self, clip: &SharedBytes, _volume: f32) -> Option<usize> {
        if clip.is_empty() {
            return None;
        }
        let address = Arc::as_ptr(clip) as *const u8 as usize;
        if !self.clips.contains(&address) {
            self.clips.push(address);
        }
        let voice = self.playing.len();
        self.playing.push(false);
        self.calls.push(AudioCall::Create(voice));
        Some(voice)
    }

    fn play(&mut self, voice: &mut usize) {
        self.playing[*voice] = true;
        self.calls.push(AudioCall::Play(*voice));
    }

    fn stop(&mut self, voice: &mut usize) {
        self.playing[*voice] = false;
        self.calls.push(AudioCall::Stop(*voice));
    }

    fn is_playing(&self, voice: &usize) -> bool {
        self.playing.get(*voice).copied().unwrap_or(false)
    }
}

/// Fetcher whose requests are completed by the test
#[derive(Debug, Default)]
pub struct ManualFetcher {
    pending: Vec<ResourceSink>,
    requests: usize,
}

impl ManualFetcher {
    /// Total fetches issued
    pub fn requests(&self) -> usize {
        self.requests
    }

    fn take(&mut self, url: &str) -> Option<ResourceSink> {
        let index = self.pending.iter().position(|s| s.url() == url)?;
        Some(self.pending.swap_remove(index))
    }

    pub fn complete(&mut self, url: &str, bytes: Vec<u8>) {
        if let Some(sink) = self.take(url) {
            sink.resolve(Ok(bytes));
        }
    }

    pub fn fail(&mut self, url: &str, reason: &str) {
        if let Some(sink) = self.take(url) {
            sink.resolve(Err(reason.to_string()));
        }
    }
}

impl Fetch for ManualFetcher {
    fn fetch(&mut self, url: &str, sink: ResourceSink) {
        debug_assert_eq!(url, sink.url());
        self.requests += 1;
        self.pending.push(sink);
    }
}
