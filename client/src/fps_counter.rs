use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

const MEASUREMENTS: usize = 120;

pub struct FpsCounter {
    frame_durations: VecDeque<Duration>,
    last_frame_time: Instant,
}

impl FpsCounter {
    pub fn new() -> Self {
        FpsCounter {
            frame_durations: VecDeque::with_capacity(MEASUREMENTS),
            last_frame_time: Instant::now(),
        }
    }

    /// Records the time since the previous tick and returns it
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time);
        self.last_frame_time = now;

        if self.frame_durations.len() == MEASUREMENTS {
            self.frame_durations.pop_front();
        }
        self.frame_durations.push_back(delta);
        delta
    }

    pub fn average_frame_time(&self) -> Duration {
        if self.frame_durations.is_empty() {
            return Duration::ZERO;
        }

        let sum: Duration = self.frame_durations.iter().sum();
        sum / (self.frame_durations.len() as u32)
    }

    pub fn slowest_frame_time(&self) -> Duration {
        self.frame_durations
            .iter()
            .copied()
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
