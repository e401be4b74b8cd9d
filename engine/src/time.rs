use std::thread;
use std::time::{Duration, Instant};

const RATE_SAMPLE_COUNT: usize = 60;

/// Keeps a loop from running faster than its target rate.
pub struct Pacer {
    period: Duration,
    last: Instant,
}

impl Pacer {
    /// a pacer for `rate` iterations per second. a rate of zero or less never waits
    pub fn new(rate: f32) -> Self {
        let period = if rate > 0.0 && rate.is_finite() {
            Duration::from_secs_f32(1.0 / rate)
        } else {
            Duration::ZERO
        };
        Self {
            period,
            last: Instant::now(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// sleeps until at least one period has passed since the previous call (or since the pacer was made), then returns how many seconds actually passed
    pub fn wait(&mut self) -> f32 {
        let elapsed = self.last.elapsed();
        if elapsed < self.period {
            thread::sleep(self.period - elapsed);
        }
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

/// Rolling average of how often a loop actually runs.
#[derive(Debug, Clone)]
pub struct RateMeter {
    samples: [f32; RATE_SAMPLE_COUNT],
    sample_index: usize,
    pub smoothed_rate: f32,
}

impl RateMeter {
    /// starts out assuming the loop hits `expected_rate`
    pub fn new(expected_rate: f32) -> Self {
        let dt = if expected_rate > 0.0 {
            1.0 / expected_rate
        } else {
            0.0
        };
        Self {
            samples: [dt; RATE_SAMPLE_COUNT],
            sample_index: 0,
            smoothed_rate: expected_rate.max(0.0),
        }
    }

    /// records one iteration that took `dt` seconds
    pub fn record(&mut self, dt: f32) {
        self.samples[self.sample_index] = dt;
        self.sample_index = (self.sample_index + 1) % RATE_SAMPLE_COUNT;
        let avg_dt = self.samples.iter().sum::<f32>() / RATE_SAMPLE_COUNT as f32;
        self.smoothed_rate = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    pub fn rate(&self) -> f32 {
        self.smoothed_rate
    }
}

/// Says yes at most once per interval. For things like periodic log lines.
pub struct Every {
    interval: Duration,
    last: Instant,
}

impl Every {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    pub fn ready(&mut self) -> bool {
        if self.last.elapsed() >= self.interval {
            self.last = Instant::now();
            true
        } else {
            false
        }
    }
}
