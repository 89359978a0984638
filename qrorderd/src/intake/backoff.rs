use rand::Rng;
use std::time::Duration;

/// Exponential backoff for consecutive poll failures. The delay doubles per
/// failure up to a cap, with equal jitter: the returned delay lands in the
/// upper half of the exponential window.
#[derive(Debug, Clone, Copy)]
pub struct PollBackoff {
    base: Duration,
    cap: Duration,
}

impl PollBackoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    pub fn delay(&self, failures: u32) -> Duration {
        let mut rng = rand::thread_rng();
        self.delay_with_rng(failures, &mut rng)
    }

    pub fn delay_with_rng<R: Rng + ?Sized>(&self, failures: u32, rng: &mut R) -> Duration {
        let base_ms = self.base.as_millis().min(u128::from(u64::MAX)) as u64;
        let cap_ms = self.cap.as_millis().min(u128::from(u64::MAX)) as u64;
        let window = base_ms
            .saturating_mul(1u64 << failures.min(16))
            .min(cap_ms.max(1));
        let floor = window / 2;
        Duration::from_millis(rng.gen_range(floor..=window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn window_doubles_per_failure_until_capped() {
        let backoff = PollBackoff::new(Duration::from_millis(100), Duration::from_secs(1));
        let mut rng = StdRng::seed_from_u64(7);

        for failures in 0..8 {
            let window = 100u64.saturating_mul(1 << failures).min(1000);
            let delay = backoff.delay_with_rng(failures, &mut rng).as_millis() as u64;
            assert!(delay >= window / 2, "delay {delay} below floor for {failures}");
            assert!(delay <= window, "delay {delay} above window for {failures}");
        }
    }

    #[test]
    fn never_exceeds_cap() {
        let backoff = PollBackoff::new(Duration::from_millis(250), Duration::from_secs(5));
        let mut rng = StdRng::seed_from_u64(42);
        for failures in 0..32 {
            assert!(backoff.delay_with_rng(failures, &mut rng) <= Duration::from_secs(5));
        }
    }
}
