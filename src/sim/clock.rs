//! Fixed-timestep accumulator

use crate::consts::{MAX_SUBSTEPS, SIM_DT};

/// Longest frame the clock will account for, in seconds
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Converts variable frame times into a whole number of fixed ticks
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    accumulator: f64,
    /// Total ticks handed out
    pub ticks: u64,
}

impl FixedClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame's elapsed time and return how many ticks to run now.
    ///
    /// At most `MAX_SUBSTEPS` ticks are returned; time beyond that is dropped.
    pub fn advance(&mut self, frame_seconds: f64) -> u32 {
        let dt = if frame_seconds.is_finite() {
            frame_seconds.clamp(0.0, MAX_FRAME_TIME)
        } else {
            0.0
        };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS && self.accumulator >= SIM_DT {
            log::debug!("dropping {:.3}s of simulation backlog", self.accumulator);
            self.accumulator = 0.0;
        }
        self.ticks += u64::from(substeps);
        substeps
    }

    /// Fraction of a tick left in the accumulator, for interpolation
    pub fn alpha(&self) -> f64 {
        self.accumulator / SIM_DT
    }
}
