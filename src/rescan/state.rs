//! Lifecycle states of the rescan scheduler

use std::fmt;

/// Represents where the rescan loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// Constructed, loop not yet started
    Idle,

    /// Timer armed, waiting for a tick or a stop signal
    Running,

    /// Loading and ranking records for the current tick
    Scanning,

    /// Re-downloading the selected candidates
    Downloading,

    /// Loop has exited; terminal
    Stopped,
}

impl SchedulerState {
    /// Returns true if the loop can no longer make progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true while a tick's work is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Scanning | Self::Downloading)
    }

    /// Checks whether moving from `self` to `next` is allowed
    ///
    /// A tick run by hand on an idle scheduler returns to `Idle`.
    pub fn can_transition_to(&self, next: SchedulerState) -> bool {
        use SchedulerState::*;

        matches!(
            (*self, next),
            (Idle, Running)
                | (Idle, Stopped)
                | (Idle, Scanning)
                | (Running, Scanning)
                | (Running, Stopped)
                | (Scanning, Downloading)
                | (Scanning, Running)
                | (Scanning, Idle)
                | (Downloading, Running)
                | (Downloading, Idle)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Scanning => "scanning",
            Self::Downloading => "downloading",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_cycle_transitions() {
        use SchedulerState::*;

        assert!(Idle.can_transition_to(Running));
        assert!(Running.can_transition_to(Scanning));
        assert!(Scanning.can_transition_to(Downloading));
        assert!(Downloading.can_transition_to(Running));

        // A failed load goes straight back to waiting
        assert!(Scanning.can_transition_to(Running));
    }

    #[test]
    fn test_manual_tick_transitions() {
        use SchedulerState::*;

        assert!(Idle.can_transition_to(Scanning));
        assert!(Downloading.can_transition_to(Idle));
        assert!(Scanning.can_transition_to(Idle));
        assert!(!Idle.can_transition_to(Downloading));
    }

    #[test]
    fn test_stop_only_between_ticks() {
        use SchedulerState::*;

        assert!(Idle.can_transition_to(Stopped));
        assert!(Running.can_transition_to(Stopped));
        assert!(!Scanning.can_transition_to(Stopped));
        assert!(!Downloading.can_transition_to(Stopped));
    }

    #[test]
    fn test_stopped_is_terminal() {
        use SchedulerState::*;

        assert!(Stopped.is_terminal());
        for next in [Idle, Running, Scanning, Downloading, Stopped] {
            assert!(!Stopped.can_transition_to(next));
        }
    }

    #[test]
    fn test_is_busy() {
        assert!(SchedulerState::Scanning.is_busy());
        assert!(SchedulerState::Downloading.is_busy());
        assert!(!SchedulerState::Running.is_busy());
        assert!(!SchedulerState::Idle.is_busy());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", SchedulerState::Downloading), "downloading");
        assert_eq!(format!("{}", SchedulerState::Idle), "idle");
    }
}
