/// Fraction of the plan after which "about to finish" is posted.
pub const NEAR_END_FRACTION: f64 = 0.9;

/// Progress of the active plan towards its end.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    #[default]
    NotNearEnd,
    /// "About to finish" has been posted.
    NearEnd,
    /// Plan fully rendered, not one-shot.
    Finished,
    /// One-shot plan fully rendered and "playback complete" posted; waiting
    /// for the host to tear the stream down.
    AwaitingTeardown,
}

/// What to report once the plan has no units left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhausted {
    /// Post "playback complete" and stop the stream exceptionally.
    Complete,
    EndOfStream,
}

impl Completion {
    pub fn reset(&mut self) {
        *self = Completion::NotNearEnd;
    }

    /// Record the cursor position after a chunk. Returns `true` exactly once
    /// per plan, on the first call past the near-end threshold.
    pub fn observe(&mut self, position: usize, plan_len: usize) -> bool {
        if *self == Completion::NotNearEnd
            && position as f64 > plan_len as f64 * NEAR_END_FRACTION
        {
            *self = Completion::NearEnd;
            return true;
        }
        false
    }

    /// The cursor is at or past the end of the plan.
    pub fn exhausted(&mut self, one_shot: bool) -> Exhausted {
        match self {
            Completion::AwaitingTeardown => Exhausted::EndOfStream,
            _ if one_shot => {
                *self = Completion::AwaitingTeardown;
                Exhausted::Complete
            }
            _ => {
                *self = Completion::Finished;
                Exhausted::EndOfStream
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_end_fires_once() {
        let mut completion = Completion::default();
        assert!(!completion.observe(5, 10));
        assert!(!completion.observe(9, 10));
        assert!(completion.observe(10, 10));
        assert!(!completion.observe(10, 10));
        assert_eq!(completion, Completion::NearEnd);
    }

    #[test]
    fn threshold_is_strictly_greater() {
        let mut completion = Completion::default();
        assert!(!completion.observe(90, 100));
        assert!(completion.observe(91, 100));
    }

    #[test]
    fn repeat_mode_keeps_ending() {
        let mut completion = Completion::NearEnd;
        assert_eq!(completion.exhausted(false), Exhausted::EndOfStream);
        assert_eq!(completion, Completion::Finished);
        assert_eq!(completion.exhausted(false), Exhausted::EndOfStream);
    }

    #[test]
    fn one_shot_completes_once() {
        let mut completion = Completion::NearEnd;
        assert_eq!(completion.exhausted(true), Exhausted::Complete);
        assert_eq!(completion, Completion::AwaitingTeardown);
        assert_eq!(completion.exhausted(true), Exhausted::EndOfStream);
    }

    #[test]
    fn reset_rearms() {
        let mut completion = Completion::AwaitingTeardown;
        completion.reset();
        assert!(completion.observe(10, 10));
        assert_eq!(completion.exhausted(true), Exhausted::Complete);
    }
}
