//! Idempotent show/hide state of the mirror window.
//!
//! Both the pointer tracker and the active-window follower issue
//! [`VisibilityCommand`]s; the last one wins.  [`VisibilityState::apply`]
//! reports whether the command actually changes anything, so the caller
//! only touches the window when it must.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityCommand {
    Show,
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityState {
    raised: bool,
}

impl VisibilityState {
    /// A freshly mapped window starts on top of the stack.
    pub fn new(raised: bool) -> Self {
        Self { raised }
    }

    pub fn is_raised(&self) -> bool {
        self.raised
    }

    /// Applies `cmd`; returns `true` if the window must be raised or lowered.
    pub fn apply(&mut self, cmd: VisibilityCommand) -> bool {
        let want = cmd == VisibilityCommand::Show;
        if self.raised == want {
            return false;
        }
        self.raised = want;
        true
    }

    /// Marks the window lowered regardless of the current state (a click on
    /// the mirror always lowers it).
    pub fn force_hidden(&mut self) {
        self.raised = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_commands_are_no_ops() {
        let mut v = VisibilityState::default();
        assert!(v.apply(VisibilityCommand::Show));
        assert!(!v.apply(VisibilityCommand::Show));
        assert!(v.apply(VisibilityCommand::Hide));
        assert!(!v.apply(VisibilityCommand::Hide));
    }

    #[test]
    fn test_force_hidden_allows_next_show() {
        let mut v = VisibilityState::default();
        v.apply(VisibilityCommand::Show);
        v.force_hidden();
        assert!(!v.is_raised());
        assert!(v.apply(VisibilityCommand::Show));
    }
}
