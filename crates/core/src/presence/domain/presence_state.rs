use std::time::{Duration, Instant};

/// A debounced presence transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceEvent {
    FaceDetected,
    FaceLost,
}

/// Two-state presence debouncer.
///
/// Appearance is reported on the first positive sample. Disappearance is
/// reported only after negative samples have covered `absence_threshold`
/// without interruption; any positive sample restarts that window.
#[derive(Clone, Debug)]
pub struct PresenceState {
    is_present: bool,
    absence_started_at: Option<Instant>,
    absence_threshold: Duration,
}

impl PresenceState {
    pub fn new(absence_threshold: Duration) -> Self {
        Self {
            is_present: false,
            absence_started_at: None,
            absence_threshold,
        }
    }

    pub fn is_present(&self) -> bool {
        self.is_present
    }

    pub fn absence_started_at(&self) -> Option<Instant> {
        self.absence_started_at
    }

    pub fn absence_threshold(&self) -> Duration {
        self.absence_threshold
    }

    /// Feeds one classified sample taken at `now`.
    ///
    /// Returns the transition this sample caused, if any. At most one event
    /// is produced per sample.
    pub fn observe(&mut self, has_face: bool, now: Instant) -> Option<PresenceEvent> {
        if has_face {
            self.absence_started_at = None;
            if self.is_present {
                return None;
            }
            self.is_present = true;
            return Some(PresenceEvent::FaceDetected);
        }

        if !self.is_present {
            return None;
        }

        let started = *self.absence_started_at.get_or_insert(now);
        if now.saturating_duration_since(started) < self.absence_threshold {
            return None;
        }

        self.is_present = false;
        self.absence_started_at = None;
        Some(PresenceEvent::FaceLost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const THRESHOLD: Duration = Duration::from_secs(3);

    fn at(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    /// A state that became present at `base`.
    fn present(base: Instant) -> PresenceState {
        let mut state = PresenceState::new(THRESHOLD);
        assert_eq!(state.observe(true, base), Some(PresenceEvent::FaceDetected));
        state
    }

    #[test]
    fn test_initial_state_is_absent_without_timer() {
        let state = PresenceState::new(THRESHOLD);
        assert!(!state.is_present());
        assert!(state.absence_started_at().is_none());
        assert_eq!(state.absence_threshold(), THRESHOLD);
    }

    #[test]
    fn test_negative_samples_while_absent_do_nothing() {
        let base = Instant::now();
        let mut state = PresenceState::new(THRESHOLD);
        for ms in (0..10_000).step_by(100) {
            assert_eq!(state.observe(false, at(base, ms)), None);
        }
        assert!(!state.is_present());
        assert!(state.absence_started_at().is_none());
    }

    #[test]
    fn test_first_positive_sample_detects_immediately() {
        let base = Instant::now();
        let mut state = PresenceState::new(THRESHOLD);
        assert_eq!(state.observe(false, base), None);
        assert_eq!(
            state.observe(true, at(base, 100)),
            Some(PresenceEvent::FaceDetected)
        );
        assert!(state.is_present());
        assert!(state.absence_started_at().is_none());
    }

    #[test]
    fn test_repeated_positive_samples_emit_once() {
        let base = Instant::now();
        let mut state = present(base);
        for ms in (100..5_000).step_by(100) {
            assert_eq!(state.observe(true, at(base, ms)), None);
        }
        assert!(state.is_present());
    }

    #[test]
    fn test_first_negative_sample_starts_timer_without_event() {
        let base = Instant::now();
        let mut state = present(base);
        let t = at(base, 500);
        assert_eq!(state.observe(false, t), None);
        assert!(state.is_present());
        assert_eq!(state.absence_started_at(), Some(t));
    }

    #[rstest]
    #[case::just_below(2_999, None)]
    #[case::exactly_at(3_000, Some(PresenceEvent::FaceLost))]
    #[case::beyond(3_100, Some(PresenceEvent::FaceLost))]
    fn test_loss_fires_at_threshold(
        #[case] elapsed_ms: u64,
        #[case] expected: Option<PresenceEvent>,
    ) {
        let base = Instant::now();
        let mut state = present(base);
        let t0 = at(base, 100);
        assert_eq!(state.observe(false, t0), None);
        assert_eq!(state.observe(false, at(base, 100 + elapsed_ms)), expected);
    }

    #[test]
    fn test_loss_fires_once_and_clears_timer() {
        let base = Instant::now();
        let mut state = present(base);
        let mut events = Vec::new();
        for ms in (100..=8_000).step_by(100) {
            events.extend(state.observe(false, at(base, ms)));
        }
        assert_eq!(events, vec![PresenceEvent::FaceLost]);
        assert!(!state.is_present());
        assert!(state.absence_started_at().is_none());
    }

    #[test]
    fn test_single_positive_sample_resets_absence_window() {
        let base = Instant::now();
        let mut state = present(base);

        // 2.9s of absence, then one positive sample at 3.0s
        for ms in (100..=3_000).step_by(100) {
            assert_eq!(state.observe(false, at(base, ms)), None);
        }
        assert_eq!(state.observe(true, at(base, 3_100)), None);
        assert!(state.absence_started_at().is_none());

        // The old window would have expired at 3.1s; the new one starts at 3.2s
        for ms in (3_200..6_200).step_by(100) {
            assert_eq!(state.observe(false, at(base, ms)), None, "at {ms}ms");
        }
        assert_eq!(
            state.observe(false, at(base, 6_200)),
            Some(PresenceEvent::FaceLost)
        );
    }

    #[test]
    fn test_redetection_after_loss_fires_immediately() {
        let base = Instant::now();
        let mut state = present(base);
        state.observe(false, at(base, 100));
        assert_eq!(
            state.observe(false, at(base, 3_100)),
            Some(PresenceEvent::FaceLost)
        );
        assert_eq!(
            state.observe(true, at(base, 3_200)),
            Some(PresenceEvent::FaceDetected)
        );
        assert!(state.is_present());
    }

    #[test]
    fn test_zero_threshold_loses_on_first_negative() {
        let base = Instant::now();
        let mut state = PresenceState::new(Duration::ZERO);
        state.observe(true, base);
        assert_eq!(
            state.observe(false, at(base, 100)),
            Some(PresenceEvent::FaceLost)
        );
    }

    #[test]
    fn test_clock_going_backwards_does_not_fire() {
        let base = Instant::now() + Duration::from_secs(10);
        let mut state = present(base);
        state.observe(false, base);
        assert_eq!(state.observe(false, base - Duration::from_secs(5)), None);
    }
}
