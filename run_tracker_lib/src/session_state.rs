use serde::{Deserialize, Serialize};

/// Lifecycle of one tracking session.
///
/// ```text
/// Idle -> AwaitingPermission -> Tracking -> Stopped
///              |
///              +-> Idle (permission denied)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingPermission,
    Tracking,
    Stopped,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, next),
            (Idle, AwaitingPermission)
                | (AwaitingPermission, Tracking)
                | (AwaitingPermission, Idle)
                | (Tracking, Stopped)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Stopped
    }
}
