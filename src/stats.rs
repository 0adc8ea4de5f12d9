//! Frame instrumentation
//!
//! Probes are optional collaborators the orchestrator calls once at the
//! start and once at the end of every tick. Attaching and detaching them
//! is up to the host application.

use std::cell::RefCell;
use std::rc::Rc;

use crate::sim::FrameReport;

/// Number of frames averaged by [`FpsCounter`]
pub const FPS_WINDOW: usize = 60;

pub trait FrameProbe {
    fn begin(&mut self, now_ms: f64);
    fn end(&mut self, report: &FrameReport);
}

/// Rolling frame-rate counter over the last [`FPS_WINDOW`] frame starts
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frame_times: [f64; FPS_WINDOW],
    frame_index: usize,
    frames: u64,
    fps: u32,
    skipped: u64,
    impacts: u64,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            frame_times: [0.0; FPS_WINDOW],
            frame_index: 0,
            frames: 0,
            fps: 0,
            skipped: 0,
            impacts: 0,
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames whose tick was skipped (world not ready)
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Impact events seen across all frames
    pub fn impacts(&self) -> u64 {
        self.impacts
    }
}

impl FrameProbe for FpsCounter {
    fn begin(&mut self, now_ms: f64) {
        // Oldest sample is the one about to be overwritten
        let oldest = self.frame_times[self.frame_index];
        self.frame_times[self.frame_index] = now_ms;
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;
        self.frames += 1;

        if self.frames > FPS_WINDOW as u64 {
            let elapsed = now_ms - oldest;
            if elapsed > 0.0 {
                self.fps = (FPS_WINDOW as f64 * 1000.0 / elapsed).round() as u32;
            }
        }
    }

    fn end(&mut self, report: &FrameReport) {
        if report.skipped {
            self.skipped += 1;
        }
        self.impacts += u64::from(report.impacts.events);
    }
}

/// Shared probe: the host keeps a clone and reads it between frames
impl<P: FrameProbe> FrameProbe for Rc<RefCell<P>> {
    fn begin(&mut self, now_ms: f64) {
        self.borrow_mut().begin(now_ms);
    }

    fn end(&mut self, report: &FrameReport) {
        self.borrow_mut().end(report);
    }
}
