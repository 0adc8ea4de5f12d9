//! Per-frame orchestration
//!
//! Every tick runs, strictly in this order:
//! 1. physics step(s)
//! 2. body transforms copied into renderables
//! 3. pending click impulses consumed
//! 4. impact audio evaluated
//! 5. kinematic platform advanced
//!
//! Without an attached world the whole tick is skipped. Nothing in here
//! allocates per entity once the scene is built.

use glam::Vec3;

use super::interaction::PointerEvent;
use super::registry::EntityId;
use super::scene::Scene;
use super::world::PhysicsWorld;
use crate::audio::{AudioBackend, ImpactAudio, ImpactTally};
use crate::camera::ViewCamera;
use crate::consts::MAX_FRAME_DT;
use crate::error::{PlaygroundError, Result};
use crate::governor::StepMode;
use crate::stats::FrameProbe;

/// Physics steps to run this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPlan {
    pub steps: u32,
    pub dt: f32,
}

/// Turns frame deltas into physics steps
#[derive(Debug, Clone)]
pub struct FrameClock {
    mode: StepMode,
    accumulator: f32,
}

impl FrameClock {
    pub fn new(mode: StepMode) -> Self {
        Self {
            mode,
            accumulator: 0.0,
        }
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }

    pub fn advance(&mut self, frame_dt: f32) -> StepPlan {
        let frame_dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };

        match self.mode {
            StepMode::Fixed { dt, max_substeps } => {
                self.accumulator += frame_dt;
                let mut steps = 0;
                while self.accumulator >= dt && steps < max_substeps {
                    self.accumulator -= dt;
                    steps += 1;
                }
                // Drop backlog we could not catch up on
                if steps == max_substeps {
                    self.accumulator = self.accumulator.min(dt);
                }
                StepPlan { steps, dt }
            }
            StepMode::Variable { max_dt } => StepPlan {
                steps: u32::from(frame_dt > 0.0),
                dt: frame_dt.min(max_dt),
            },
        }
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    /// World not attached; nothing ran
    pub skipped: bool,
    pub substeps: u32,
    /// Renderables written from body transforms
    pub synced: usize,
    /// Velocities assigned from clicks
    pub impulses: u32,
    pub impacts: ImpactTally,
}

pub struct FrameOrchestrator<W: PhysicsWorld, B: AudioBackend> {
    world: Option<W>,
    scene: Scene,
    audio: ImpactAudio<B>,
    clock: FrameClock,
    probe: Option<Box<dyn FrameProbe>>,
    frame: u64,
    warned_uninitialized: bool,
}

impl<W: PhysicsWorld, B: AudioBackend> FrameOrchestrator<W, B> {
    pub fn new(scene: Scene, audio: ImpactAudio<B>, clock: FrameClock) -> Self {
        Self {
            world: None,
            scene,
            audio,
            clock,
            probe: None,
            frame: 0,
            warned_uninitialized: false,
        }
    }

    pub fn with_probe(mut self, probe: Box<dyn FrameProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn set_probe(&mut self, probe: Option<Box<dyn FrameProbe>>) {
        self.probe = probe;
    }

    /// Attach the physics world and create the scene's bodies in it
    pub fn attach_world(&mut self, mut world: W) {
        self.scene.registry.materialize(&mut world);
        self.world = Some(world);
        self.warned_uninitialized = false;
        log::info!("Physics world attached");
    }

    pub fn is_ready(&self) -> bool {
        self.world.is_some()
    }

    pub fn world(&self) -> Option<&W> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut W> {
        self.world.as_mut()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn audio(&self) -> &ImpactAudio<B> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut ImpactAudio<B> {
        &mut self.audio
    }

    pub fn probe(&self) -> Option<&dyn FrameProbe> {
        self.probe.as_deref()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Current velocity of an entity's body
    pub fn velocity(&self, id: EntityId) -> Result<Vec3> {
        let world = self.world.as_ref().ok_or(PlaygroundError::WorldUninitialized)?;
        self.scene
            .registry
            .velocity(world, id)
            .ok_or(PlaygroundError::UnknownEntity(id))
    }

    /// Forward a pointer event from the renderer's picking
    pub fn pointer(&mut self, event: PointerEvent) -> Result<()> {
        self.scene.interaction.handle(event)
    }

    /// Run one frame
    pub fn tick<C: ViewCamera + ?Sized>(
        &mut self,
        frame_dt: f32,
        now_ms: f64,
        camera: &C,
    ) -> FrameReport {
        self.frame += 1;
        let mut report = FrameReport {
            frame: self.frame,
            ..Default::default()
        };
        if let Some(probe) = self.probe.as_deref_mut() {
            probe.begin(now_ms);
        }

        match self.world.as_mut() {
            None => {
                report.skipped = true;
                if !self.warned_uninitialized {
                    log::warn!("Physics world not initialized; skipping frames");
                    self.warned_uninitialized = true;
                }
            }
            Some(world) => {
                let scene = &mut self.scene;

                let plan = self.clock.advance(frame_dt);
                for _ in 0..plan.steps {
                    world.step(plan.dt);
                }
                report.substeps = plan.steps;

                report.synced = scene
                    .registry
                    .sync_transforms(&*world, &mut scene.renderables);
                report.impulses = scene.interaction.consume(&scene.registry, world, camera);
                report.impacts = self.audio.evaluate(&scene.registry, &*world);

                if let Some(platform) = scene.platform.as_mut() {
                    platform.advance(&scene.registry, world, &mut scene.renderables);
                }
            }
        }

        if let Some(probe) = self.probe.as_deref_mut() {
            probe.end(&report);
        }
        log::trace!("Frame {}: {:?}", report.frame, report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ResourceLoader;
    use crate::audio::PlaybackState;
    use crate::consts::{PLATFORM_SPIN, SIM_DT};
    use crate::sim::scene::SceneConfig;
    use crate::sim::rapier_world::RapierWorld;
    use crate::sim::testing::{FixedCamera, ManualFetcher, RecordingAudio, ScriptedWorld};
    use crate::wrap_euler;
    use std::cell::Cell;
    use std::rc::Rc;

    const AUDIO: &str = "/bounce2.mp3";
    const VIEW: Vec3 = Vec3::new(0.0, -0.6, -0.8);

    type Orchestrator<W> = FrameOrchestrator<W, RecordingAudio>;

    fn fixed_clock() -> FrameClock {
        FrameClock::new(StepMode::Fixed {
            dt: SIM_DT,
            max_substeps: 4,
        })
    }

    fn build<W: PhysicsWorld>(population: usize) -> (Orchestrator<W>, ResourceLoader<ManualFetcher>) {
        let mut loader = ResourceLoader::new(ManualFetcher::default());
        let clip = loader.request(AUDIO);
        let scene = Scene::build(
            &SceneConfig {
                population,
                ..SceneConfig::default()
            },
            None,
        );
        let audio = ImpactAudio::new(RecordingAudio::default(), clip, &scene.registry, 0.1, 0.5);
        (FrameOrchestrator::new(scene, audio, fixed_clock()), loader)
    }

    fn ready(population: usize) -> (Orchestrator<ScriptedWorld>, ResourceLoader<ManualFetcher>) {
        let (mut orchestrator, loader) = build(population);
        orchestrator.attach_world(ScriptedWorld::default());
        (orchestrator, loader)
    }

    fn handle_of(o: &Orchestrator<ScriptedWorld>, id: EntityId) -> crate::sim::BodyHandle {
        o.scene().registry.handle(id).unwrap()
    }

    #[test]
    fn test_skipped_without_world() {
        let (mut orchestrator, _loader) = build::<ScriptedWorld>(3);
        assert!(matches!(
            orchestrator.velocity(EntityId(0)),
            Err(PlaygroundError::WorldUninitialized)
        ));
        let before: Vec<_> = orchestrator.scene().renderables.iter().map(|r| r.transform).collect();
        orchestrator.pointer(PointerEvent::Click(EntityId(0))).unwrap();

        let report = orchestrator.tick(SIM_DT, 0.0, &FixedCamera(VIEW));
        assert!(report.skipped);
        assert_eq!(report.substeps, 0);
        let after: Vec<_> = orchestrator.scene().renderables.iter().map(|r| r.transform).collect();
        assert_eq!(before, after);
        assert_eq!(orchestrator.scene().platform.as_ref().unwrap().ticks(), 0);
        // Click survives until a real tick consumes it
        assert!(orchestrator.scene().interaction.has_pending_impulse());

        orchestrator.attach_world(ScriptedWorld::default());
        let report = orchestrator.tick(SIM_DT, 16.0, &FixedCamera(VIEW));
        assert!(!report.skipped);
        assert_eq!(report.impulses, 1);
    }

    #[test]
    fn test_renderables_match_bodies_after_tick() {
        let (mut orchestrator, _loader) = ready(8);
        for (i, id) in (0..8).map(EntityId).enumerate() {
            let handle = handle_of(&orchestrator, id);
            let world = orchestrator.world_mut().unwrap();
            world.nudge(handle, Vec3::new(i as f32, -1.0, 0.5));
        }
        for _ in 0..5 {
            let report = orchestrator.tick(SIM_DT, 0.0, &FixedCamera(VIEW));
            assert_eq!(report.substeps, 1);
            let world = orchestrator.world().unwrap();
            for (id, handle) in orchestrator.scene().registry.dynamic_bodies() {
                assert_eq!(
                    Some(orchestrator.scene().renderables[id.0].transform),
                    world.transform(handle)
                );
            }
        }
    }

    #[test]
    fn test_impulse_fires_once_per_click() {
        let (mut orchestrator, _loader) = ready(4);
        orchestrator.pointer(PointerEvent::Click(EntityId(2))).unwrap();

        let report = orchestrator.tick(SIM_DT, 0.0, &FixedCamera(VIEW));
        assert_eq!(report.impulses, 1);
        let handle = handle_of(&orchestrator, EntityId(2));
        assert_eq!(orchestrator.world().unwrap().velocity_writes(), &[(handle, VIEW * 10.0)]);

        for _ in 0..10 {
            let report = orchestrator.tick(SIM_DT, 0.0, &FixedCamera(VIEW));
            assert_eq!(report.impulses, 0);
            assert!(!orchestrator.scene().interaction.has_pending_impulse());
        }
        assert_eq!(orchestrator.world().unwrap().velocity_writes().len(), 1);
    }

    #[test]
    fn test_click_on_resting_ball_moves_and_sounds() {
        let (mut orchestrator, mut loader) = ready(60);
        loader.fetcher_mut().complete(AUDIO, vec![1u8; 64]);

        // Everything at rest: quiet
        orchestrator.world_mut().unwrap().settle();
        let report = orchestrator.tick(SIM_DT, 0.0, &FixedCamera(VIEW));
        assert_eq!(report.impacts.events, 0);

        let clicked = EntityId(17);
        orchestrator.pointer(PointerEvent::Click(clicked)).unwrap();
        let report = orchestrator.tick(SIM_DT, 16.0, &FixedCamera(VIEW));

        assert_eq!(orchestrator.velocity(clicked).unwrap(), VIEW * 10.0);
        assert_eq!(report.impulses, 1);
        assert_eq!(report.impacts.plays, 1);
        assert_eq!(orchestrator.audio().state(clicked), PlaybackState::Playing);
        assert_eq!(orchestrator.audio().backend().plays(), 1);
    }

    #[test]
    fn test_audio_failure_is_silent() {
        let (mut orchestrator, mut loader) = ready(60);
        loader.fetcher_mut().fail(AUDIO, "404 Not Found");
        let handles: Vec<_> = orchestrator.scene().registry.dynamic_bodies().collect();
        for (_, handle) in handles {
            orchestrator.world_mut().unwrap().nudge(handle, Vec3::new(0.0, -4.0, 0.0));
        }

        let mut dropped = 0;
        for frame in 0..100 {
            let report = orchestrator.tick(SIM_DT, frame as f64 * 16.0, &FixedCamera(VIEW));
            assert_eq!(report.impacts.plays, 0);
            dropped += report.impacts.dropped;
        }
        assert_eq!(dropped, 100 * 60);
        assert!(orchestrator.audio().backend().calls().is_empty());
    }

    #[test]
    fn test_simultaneous_impacts_use_independent_voices() {
        let (mut orchestrator, mut loader) = ready(5);
        loader.fetcher_mut().complete(AUDIO, vec![1u8; 64]);
        for id in [EntityId(1), EntityId(3)] {
            let handle = handle_of(&orchestrator, id);
            orchestrator.world_mut().unwrap().nudge(handle, Vec3::new(0.0, -2.0, 0.0));
        }

        let report = orchestrator.tick(SIM_DT, 0.0, &FixedCamera(VIEW));
        assert_eq!(report.impacts.plays, 2);
        let voice = *orchestrator.audio().voice(EntityId(1)).unwrap().handle().unwrap();
        orchestrator.audio_mut().backend_mut().force_stop(voice);
        assert_eq!(orchestrator.audio().state(EntityId(1)), PlaybackState::Idle);
        assert_eq!(orchestrator.audio().state(EntityId(3)), PlaybackState::Playing);
    }

    #[test]
    fn test_continuous_motion_retriggers_every_tick() {
        let (mut orchestrator, mut loader) = ready(1);
        loader.fetcher_mut().complete(AUDIO, vec![1u8; 64]);
        let handle = handle_of(&orchestrator, EntityId(0));
        orchestrator.world_mut().unwrap().nudge(handle, Vec3::new(0.5, 0.0, 0.0));

        for _ in 0..3 {
            orchestrator.tick(SIM_DT, 0.0, &FixedCamera(VIEW));
        }
        // Three plays, the last two each preceded by a stop
        let backend = orchestrator.audio().backend();
        assert_eq!(backend.plays(), 3);
        assert_eq!(orchestrator.audio().state(EntityId(0)), PlaybackState::Playing);
    }

    #[test]
    fn test_platform_spins_unconditionally() {
        let (mut orchestrator, _loader) = ready(2);
        orchestrator.world_mut().unwrap().settle();
        for _ in 0..1000 {
            orchestrator.tick(SIM_DT, 0.0, &FixedCamera(VIEW));
        }
        let platform = orchestrator.scene().platform.as_ref().unwrap();
        let expected = wrap_euler(PLATFORM_SPIN * 1000.0);
        assert!((platform.euler() - expected).abs().max_element() < 1e-3);

        // Authored pose reached both the world and the renderable this tick
        let handle = handle_of(&orchestrator, platform.entity());
        assert_eq!(orchestrator.world().unwrap().transform(handle), Some(platform.transform()));
        assert_eq!(
            orchestrator.scene().renderables[platform.entity().0].transform,
            platform.transform()
        );
        assert_eq!(orchestrator.world().unwrap().kinematic_writes(), 1000);
    }

    #[test]
    fn test_probe_sees_every_frame() {
        struct Counting(Rc<Cell<(u32, u32)>>);
        impl FrameProbe for Counting {
            fn begin(&mut self, _now_ms: f64) {
                let (b, e) = self.0.get();
                self.0.set((b + 1, e));
            }
            fn end(&mut self, _report: &FrameReport) {
                let (b, e) = self.0.get();
                self.0.set((b, e + 1));
            }
        }

        let counts = Rc::new(Cell::new((0, 0)));
        let (orchestrator, _loader) = build::<ScriptedWorld>(1);
        let mut orchestrator = orchestrator.with_probe(Box::new(Counting(counts.clone())));
        orchestrator.tick(SIM_DT, 0.0, &FixedCamera(VIEW));
        orchestrator.attach_world(ScriptedWorld::default());
        orchestrator.tick(SIM_DT, 16.0, &FixedCamera(VIEW));
        assert_eq!(counts.get(), (2, 2));
    }

    #[test]
    fn test_balls_fall_in_rapier_world() {
        let (mut orchestrator, _loader) = build::<RapierWorld>(10);
        orchestrator.attach_world(RapierWorld::default());
        let start: Vec<f32> = (0..10)
            .map(|i| orchestrator.scene().renderables[i].transform.position.y)
            .collect();
        for frame in 0..60 {
            let report = orchestrator.tick(SIM_DT, frame as f64 * 16.0, &FixedCamera(VIEW));
            assert_eq!(report.synced, orchestrator.scene().registry.len());
        }
        for (i, y0) in start.iter().enumerate() {
            let y = orchestrator.scene().renderables[i].transform.position.y;
            assert!(y < *y0, "ball {i} did not fall: {y0} -> {y}");
        }
    }

    #[test]
    fn test_settled_pile_is_quiet_until_clicked() {
        let mut loader = ResourceLoader::new(ManualFetcher::default());
        let clip = loader.request(AUDIO);
        loader.fetcher_mut().complete(AUDIO, vec![1u8; 64]);
        let scene = Scene::build(
            &SceneConfig {
                population: 60,
                spawn_max: Vec3::new(5.0, 20.0, 5.0),
                platform: false,
                ..SceneConfig::default()
            },
            None,
        );
        let audio = ImpactAudio::new(RecordingAudio::default(), clip, &scene.registry, 0.1, 0.5);
        let mut orchestrator = FrameOrchestrator::new(scene, audio, fixed_clock());
        orchestrator.attach_world(RapierWorld::default());

        // Two minutes of simulated time is plenty for the pile to come to rest
        let mut frames = 0;
        while orchestrator.world().unwrap().awake_count() > 0 {
            assert!(frames < 120 * 60, "pile still moving after {frames} frames");
            orchestrator.tick(SIM_DT, frames as f64 * 16.0, &FixedCamera(VIEW));
            frames += 1;
        }

        let plays_at_rest = orchestrator.audio().backend().plays();
        let report = orchestrator.tick(SIM_DT, 0.0, &FixedCamera(VIEW));
        assert_eq!(report.impacts.events, 0);
        assert_eq!(orchestrator.audio().backend().plays(), plays_at_rest);

        let clicked = EntityId(17);
        orchestrator.pointer(PointerEvent::Enter(clicked)).unwrap();
        orchestrator.pointer(PointerEvent::Click(clicked)).unwrap();
        let report = orchestrator.tick(SIM_DT, 16.0, &FixedCamera(VIEW));

        assert_eq!(report.impulses, 1);
        assert_eq!(orchestrator.velocity(clicked).unwrap(), VIEW * 10.0);
        assert!(report.impacts.plays >= 1);
        assert_eq!(orchestrator.audio().state(clicked), PlaybackState::Playing);
        assert!(!orchestrator.world().unwrap().is_sleeping(
            orchestrator.scene().registry.handle(clicked).unwrap()
        ));
    }

    #[test]
    fn test_fixed_clock_accumulates() {
        let mut clock = fixed_clock();
        assert_eq!(clock.advance(SIM_DT * 0.5).steps, 0);
        assert_eq!(clock.advance(SIM_DT * 0.5).steps, 1);
        assert_eq!(clock.advance(SIM_DT * 2.0).steps, 2);
    }

    #[test]
    fn test_fixed_clock_caps_substeps() {
        let mut clock = fixed_clock();
        assert_eq!(clock.advance(1.0).steps, 4);
        // Backlog beyond one step was dropped
        assert!(clock.advance(0.0).steps <= 1);
        assert_eq!(clock.advance(f32::NAN).steps, 0);
    }

    #[test]
    fn test_variable_clock() {
        let mut clock = FrameClock::new(StepMode::Variable { max_dt: 0.05 });
        assert_eq!(clock.advance(0.02), StepPlan { steps: 1, dt: 0.02 });
        assert_eq!(clock.advance(0.5), StepPlan { steps: 1, dt: 0.05 });
        assert_eq!(clock.advance(0.0).steps, 0);
    }
}
