use std::time::{Duration, Instant};

/// Timing of one completed frame, measured between consecutive GPU completions.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameSample {
    /// Completion-to-completion interval.
    pub elapsed: Duration,

    /// Monotonic counter of samples produced by the clock.
    pub index: u64,
}

impl FrameSample {
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_nanos() as f64 / 1_000_000.0
    }

    /// Frames per second implied by this interval.
    ///
    /// A zero interval reports `f64::INFINITY`.
    #[inline]
    pub fn fps(&self) -> f64 {
        1000.0 / self.elapsed_ms()
    }
}

/// Turns GPU completion timestamps into `FrameSample`s.
///
/// The first completion after construction (or after [`rearm`](Self::rearm))
/// only records its timestamp; there is no earlier completion to diff against.
#[derive(Debug, Clone, Default)]
pub struct CompletionClock {
    previous: Option<Instant>,
    samples: u64,
}

impl CompletionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the previous completion.
    ///
    /// Used after a pause so the paused interval is never reported.
    pub fn rearm(&mut self) {
        self.previous = None;
    }

    /// Records a completion at `at` and returns the interval since the previous one.
    pub fn record(&mut self, at: Instant) -> Option<FrameSample> {
        let previous = self.previous.replace(at)?;

        let sample = FrameSample {
            elapsed: at.saturating_duration_since(previous),
            index: self.samples,
        };
        self.samples = self.samples.wrapping_add(1);

        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_completion_yields_nothing() {
        let mut clock = CompletionClock::new();
        assert!(clock.record(Instant::now()).is_none());
        assert!(clock.previous.is_some());
    }

    #[test]
    fn second_completion_yields_interval() {
        let t0 = Instant::now();
        let mut clock = CompletionClock::new();
        clock.record(t0);

        let sample = clock.record(t0 + Duration::from_millis(20)).unwrap();
        assert_eq!(sample.elapsed, Duration::from_millis(20));
        assert_eq!(sample.index, 0);
        assert!((sample.elapsed_ms() - 20.0).abs() < 1e-9);
        assert!((sample.fps() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn samples_chain_from_the_latest_completion() {
        let t0 = Instant::now();
        let mut clock = CompletionClock::new();
        clock.record(t0);
        clock.record(t0 + Duration::from_millis(10));

        let sample = clock.record(t0 + Duration::from_millis(25)).unwrap();
        assert_eq!(sample.elapsed, Duration::from_millis(15));
        assert_eq!(sample.index, 1);
    }

    #[test]
    fn rearm_suppresses_the_next_sample() {
        let t0 = Instant::now();
        let mut clock = CompletionClock::new();
        clock.record(t0);
        clock.rearm();

        assert!(clock.record(t0 + Duration::from_secs(30)).is_none());
        let sample = clock.record(t0 + Duration::from_secs(30) + Duration::from_millis(16)).unwrap();
        assert_eq!(sample.elapsed, Duration::from_millis(16));
    }

    #[test]
    fn out_of_order_timestamps_saturate_to_zero() {
        let t0 = Instant::now() + Duration::from_secs(1);
        let mut clock = CompletionClock::new();
        clock.record(t0);

        let sample = clock.record(t0 - Duration::from_millis(5)).unwrap();
        assert_eq!(sample.elapsed, Duration::ZERO);
    }
}
