/// Frame timing driven by host timestamps.

/// Timing of one frame
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Host timestamp of this frame, in seconds
    pub time: f64,

    /// Clamped time since the previous frame, in seconds
    pub dt: f32,

    /// Monotonic frame counter
    pub frame_index: u64,
}

/// Turns monotonically increasing host timestamps into clamped deltas
///
/// The first tick reports a zero delta. Later deltas are clamped to
/// `max_dt` so a frame after a long suspension does not jump the simulation.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<f64>,
    frame_index: u64,
    max_dt: f32,
}

impl FrameClock {
    pub fn new(max_dt: f32) -> Self {
        Self {
            last: None,
            frame_index: 0,
            max_dt: max_dt.max(0.0),
        }
    }

    /// Forget the previous timestamp, the next tick reports a zero delta
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn max_dt(&self) -> f32 {
        self.max_dt
    }

    /// Advance to `timestamp` (seconds)
    pub fn tick(&mut self, timestamp: f64) -> FrameTime {
        let dt = match self.last {
            Some(last) => ((timestamp - last).max(0.0) as f32).min(self.max_dt),
            None => 0.0,
        };
        self.last = Some(timestamp);

        let frame = FrameTime {
            time: timestamp,
            dt,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        frame
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(0.1)
    }
}

#[cfg(test)]
#[path = "frame_clock_tests.rs"]
mod tests;
