use serde::Serialize;

/// Lifecycle of a [`RecursiveScanner`](super::RecursiveScanner).
///
/// `Idle → Running → {Paused ⇄ Running} → {Cancelled | Completed | Failed}`.
/// The three terminal states allow a new `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ScanState {
    #[default]
    Idle,
    Running,
    Paused,
    Cancelled,
    Completed,
    Failed,
}

impl ScanState {
    /// Running or paused: a traversal owns the scanner.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_and_terminal_are_disjoint() {
        for state in [
            ScanState::Idle,
            ScanState::Running,
            ScanState::Paused,
            ScanState::Cancelled,
            ScanState::Completed,
            ScanState::Failed,
        ] {
            assert!(!(state.is_active() && state.is_terminal()), "{state:?}");
        }
        assert!(!ScanState::Idle.is_active());
        assert!(!ScanState::Idle.is_terminal());
    }
}
