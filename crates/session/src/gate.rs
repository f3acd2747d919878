/// Busy flags published by the session for gating and the working indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub busy: bool,
    pub revealing: bool,
}

/// What the session is doing while input is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Sending,
    Revealing,
}

impl Activity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Sending => "Finding a video…",
            Self::Revealing => "Explaining step by step…",
        }
    }
}

impl SessionStatus {
    pub fn is_idle(&self) -> bool {
        !self.busy && !self.revealing
    }

    /// Indicator to show, if any. Revealing wins because the orchestrator stays busy
    /// for the whole reveal.
    pub fn activity(&self) -> Option<Activity> {
        if self.revealing {
            Some(Activity::Revealing)
        } else if self.busy {
            Some(Activity::Sending)
        } else {
            None
        }
    }
}

/// How an Enter keystroke in the input box is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterAction {
    Submit,
    InsertNewline,
}

/// Derived predicate deciding whether the input surface accepts a submission.
pub struct InputGate;

impl InputGate {
    pub fn can_submit(status: SessionStatus, input: &str) -> bool {
        status.is_idle() && !input.trim().is_empty()
    }

    /// Whether the text field itself accepts edits.
    pub fn input_enabled(status: SessionStatus) -> bool {
        status.is_idle()
    }

    /// Plain Enter submits; Enter with the line-break or secondary modifier is text entry.
    pub fn classify_enter(shift: bool, secondary: bool) -> EnterAction {
        if shift || secondary {
            EnterAction::InsertNewline
        } else {
            EnterAction::Submit
        }
    }
}
