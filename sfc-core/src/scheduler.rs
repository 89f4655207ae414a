//! Frame-paced cooperative driver around [`SfcEmulator`].
//!
//! The emulator itself advances in scanline quanta; this wrapper adds
//! wall-clock pacing at the NTSC frame rate and a `running` flag sampled at
//! scanline boundaries so a host can pause and resume without losing state.

use crate::api::SfcEmulator;
use crate::ppu::PpuTickEffect;
use sfc_common::frontend::FrameSink;
use std::thread;
use std::time::{Duration, Instant};

pub const NTSC_FRAME_RATE: f64 = 60.0988;

#[derive(Debug, Clone, Copy)]
pub struct FramePacer {
    frame_duration: Duration,
}

impl FramePacer {
    pub fn new() -> Self {
        Self { frame_duration: Duration::from_secs_f64(1.0 / NTSC_FRAME_RATE) }
    }

    /// Sleep out the remainder of the frame, if any.
    pub fn wait_for_frame_end(&self, frame_start: Instant) {
        let elapsed = frame_start.elapsed();
        if elapsed < self.frame_duration {
            thread::sleep(self.frame_duration - elapsed);
        }
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Scheduler {
    emulator: SfcEmulator,
    pacer: FramePacer,
    running: bool,
}

impl Scheduler {
    pub fn new(emulator: SfcEmulator) -> Self {
        Self { emulator, pacer: FramePacer::new(), running: true }
    }

    pub fn emulator(&self) -> &SfcEmulator {
        &self.emulator
    }

    pub fn emulator_mut(&mut self) -> &mut SfcEmulator {
        &mut self.emulator
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance one scanline; a no-op while paused.
    pub fn step_scanline(&mut self) -> PpuTickEffect {
        if !self.running {
            return PpuTickEffect::None;
        }
        self.emulator.run_scanline()
    }

    /// Run one frame at the paced rate. Returns false without advancing if
    /// the scheduler is paused; the host's tick loop keeps control either
    /// way.
    pub fn run_frame<S: FrameSink>(&mut self, sink: &mut S) -> bool {
        if !self.running {
            return false;
        }

        let frame_start = Instant::now();

        loop {
            // Cooperative cancellation point, once per scanline
            if !self.running {
                return false;
            }

            if self.emulator.run_scanline() == PpuTickEffect::FrameComplete {
                break;
            }
        }

        sink.frame_ready(self.emulator.frame_buffer(), self.emulator.frame_size());

        self.pacer.wait_for_frame_end(frame_start);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SfcEmulatorConfig;
    use sfc_common::frontend::null_frame_sink;

    fn test_scheduler() -> Scheduler {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut rom = vec![0; 0x40000];
        // BRA $-2 at the reset target
        rom[0] = 0x80;
        rom[1] = 0xFE;
        rom[0x7FFC] = 0x00;
        rom[0x7FFD] = 0x80;

        let emulator = SfcEmulator::create(rom, SfcEmulatorConfig::default()).unwrap();
        Scheduler::new(emulator)
    }

    #[test]
    fn paused_scheduler_does_not_advance() {
        let mut scheduler = test_scheduler();
        scheduler.pause();

        assert!(!scheduler.run_frame(&mut null_frame_sink()));
        assert_eq!(scheduler.emulator().frame_count(), 0);

        scheduler.resume();
        assert!(scheduler.run_frame(&mut null_frame_sink()));
        assert_eq!(scheduler.emulator().frame_count(), 1);
    }

    #[test]
    fn scanline_stepping_reaches_frame_boundary() {
        let mut scheduler = test_scheduler();

        let mut effects = Vec::new();
        for _ in 0..crate::ppu::SCANLINES_PER_FRAME {
            effects.push(scheduler.step_scanline());
        }

        assert_eq!(effects.last(), Some(&PpuTickEffect::FrameComplete));
        assert_eq!(scheduler.emulator().frame_count(), 1);
    }
}
