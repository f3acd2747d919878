use std::collections::VecDeque;
use std::time::Duration;

use crate::message::{MessageId, MessageKind, REVEAL_INTRO_TEXT};
use crate::state::SessionState;

/// Delay between two consecutive step insertions.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(800);

/// Step texts still waiting to be appended for one reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RevealJob {
    pending: VecDeque<String>,
    total: usize,
    revealed: usize,
}

impl RevealJob {
    fn new(steps: Vec<String>) -> Self {
        Self {
            total: steps.len(),
            pending: steps.into(),
            revealed: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.pending.len()
    }
}

/// Rejection reason for a reveal that cannot start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealRejection {
    AlreadyRevealing { revealed: usize, total: usize },
    EmptyJob,
}

/// Outcome of appending one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealProgress {
    /// More steps remain; wait [`StepRevealScheduler::step_delay`] before the next one.
    Continue(MessageId),
    /// The final step was appended and the job is gone.
    Finished(MessageId),
    /// No reveal is in progress.
    Idle,
}

/// Serializes the progressive display of multi-step answers.
///
/// The scheduler only mutates state; the caller owns the clock and waits
/// `step_delay` between calls to [`StepRevealScheduler::reveal_next`].
#[derive(Debug, Clone)]
pub struct StepRevealScheduler {
    job: Option<RevealJob>,
    step_delay: Duration,
}

impl StepRevealScheduler {
    pub fn new(step_delay: Duration) -> Self {
        Self {
            job: None,
            step_delay,
        }
    }

    pub fn is_revealing(&self) -> bool {
        self.job.is_some()
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    /// Claims the revealing slot and appends the intro message.
    pub fn begin(
        &mut self,
        state: &mut SessionState,
        steps: Vec<String>,
    ) -> Result<MessageId, RevealRejection> {
        if let Some(job) = &self.job {
            return Err(RevealRejection::AlreadyRevealing {
                revealed: job.revealed,
                total: job.total,
            });
        }
        if steps.is_empty() {
            return Err(RevealRejection::EmptyJob);
        }

        tracing::debug!(step_count = steps.len(), "starting step reveal");
        self.job = Some(RevealJob::new(steps));
        Ok(state.append_message(MessageKind::Bot, REVEAL_INTRO_TEXT))
    }

    /// Appends the next step; clears the revealing flag after the last one.
    pub fn reveal_next(&mut self, state: &mut SessionState) -> RevealProgress {
        let Some(job) = self.job.as_mut() else {
            return RevealProgress::Idle;
        };
        let Some(text) = job.pending.pop_front() else {
            self.job = None;
            return RevealProgress::Idle;
        };

        job.revealed += 1;
        let is_final = job.pending.is_empty();
        let id = state.append_message(
            MessageKind::Step {
                index: job.revealed,
                is_final,
            },
            text,
        );

        if is_final {
            tracing::debug!(step_count = job.total, "step reveal finished");
            self.job = None;
            RevealProgress::Finished(id)
        } else {
            RevealProgress::Continue(id)
        }
    }

    /// Drops the in-progress job, returning how many steps were never shown.
    pub fn cancel(&mut self) -> Option<usize> {
        self.job.take().map(|job| {
            tracing::debug!(
                revealed = job.revealed,
                remaining = job.remaining(),
                "step reveal cancelled"
            );
            job.remaining()
        })
    }
}

impl Default for StepRevealScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_DELAY)
    }
}
