use std::time::Instant;
use tdigest::TDigest;

/// Collects query latencies, e.g. one per `recommend` call.
#[derive(Clone)]
pub struct Stopwatch {
    start_time: Instant,
    durations_micros: Vec<f64>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Stopwatch {
        Stopwatch {
            start_time: Instant::now(),
            durations_micros: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        self.start_time = Instant::now();
    }

    pub fn stop(&mut self) {
        let duration = self.start_time.elapsed();
        self.durations_micros.push(duration.as_micros() as f64);
    }

    pub fn record_micros(&mut self, duration_micros: f64) {
        self.durations_micros.push(duration_micros);
    }

    pub fn get_n(&self) -> usize {
        self.durations_micros.len()
    }

    /// Estimated latency at quantile `q` (0.0 ..= 1.0), or 0 without samples.
    pub fn get_percentile_in_micros(&self, q: f64) -> f64 {
        if self.durations_micros.is_empty() {
            return 0.0;
        }
        let t_digest = TDigest::new_with_size(100);
        let sorted_digest = t_digest.merge_unsorted(self.durations_micros.clone());
        sorted_digest.estimate_quantile(q)
    }
}

#[cfg(test)]
mod stopwatch_test {
    use super::*;

    #[test]
    fn should_estimate_percentiles() {
        let mut stopwatch = Stopwatch::new();
        for duration in 1..=100 {
            stopwatch.record_micros(duration as f64);
        }
        assert_eq!(100, stopwatch.get_n());
        assert!((stopwatch.get_percentile_in_micros(1.0) - 100.0).abs() < 1e-9);
        let p50 = stopwatch.get_percentile_in_micros(0.5);
        assert!(p50 > 40.0 && p50 < 60.0);
    }

    #[test]
    fn should_measure_elapsed_time() {
        let mut stopwatch = Stopwatch::default();
        stopwatch.start();
        stopwatch.stop();
        assert_eq!(1, stopwatch.get_n());
        assert!(stopwatch.get_percentile_in_micros(0.9) >= 0.0);
        assert!((Stopwatch::new().get_percentile_in_micros(0.9) - 0.0).abs() < f64::EPSILON);
    }
}
