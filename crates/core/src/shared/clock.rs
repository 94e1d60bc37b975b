use std::time::{Duration, Instant};

/// Time source for the sampling loop.
///
/// The monitor reads `now` once per sample and sleeps between samples;
/// tests substitute a manual clock so debounce timing is deterministic.
pub trait Clock: Send {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Monotonic wall clock backed by `std::time`.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        clock.sleep(Duration::from_millis(1));
        let b = clock.now();
        assert!(b > a);
    }
}
