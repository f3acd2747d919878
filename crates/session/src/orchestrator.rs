use vidchat_service::{ChatRequest, ChatResponse, ServiceResult};

use crate::message::{APOLOGY_TEXT, FALLBACK_REPLY_TEXT, MessageId, MessageKind, VideoReference};
use crate::scheduler::{RevealRejection, StepRevealScheduler};
use crate::state::SessionState;

/// Identifier of one submitted query, unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// User text between submission and resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub request_id: RequestId,
    pub text: String,
}

/// Lifecycle of the single outstanding remote exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrchestratorPhase {
    #[default]
    Idle,
    Sending(PendingQuery),
    /// The answer is being revealed step by step; busy until the scheduler finishes.
    DelegatingReveal(RequestId),
}

/// Rejection reason for a submit that must not start a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    EmptyQuery,
    RequestInFlight(RequestId),
    Revealing,
}

/// Rejection reason for a resolution that has no matching request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveRejection {
    NoPendingRequest,
}

/// What the orchestrator did with a resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// One bot message was appended and the orchestrator is idle again.
    Replied(MessageId),
    /// The scheduler owns the remaining steps; call
    /// [`RequestOrchestrator::reveal_finished`] once it completes.
    Revealing { step_count: usize },
    /// The call failed and the apology message was appended.
    Failed(MessageId),
    /// The scheduler refused the job; the apology message was appended instead.
    RevealRejected {
        rejection: RevealRejection,
        apology: MessageId,
    },
}

/// How a successful response turns into timeline entries.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplyPlan {
    Single(String),
    Steps(Vec<String>),
}

impl ReplyPlan {
    fn from_response(response: &ChatResponse) -> Self {
        let mut steps = response.step_texts();
        match steps.len() {
            0 => Self::Single(
                response
                    .reply_text()
                    .unwrap_or(FALLBACK_REPLY_TEXT)
                    .to_string(),
            ),
            1 => Self::Single(steps.remove(0)),
            _ => Self::Steps(steps),
        }
    }
}

/// Owns the lifecycle of exactly one outstanding request at a time.
#[derive(Debug, Clone, Default)]
pub struct RequestOrchestrator {
    phase: OrchestratorPhase,
    next_request_id: u64,
}

impl RequestOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &OrchestratorPhase {
        &self.phase
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self.phase, OrchestratorPhase::Idle)
    }

    pub fn pending_query(&self) -> Option<&PendingQuery> {
        match &self.phase {
            OrchestratorPhase::Sending(pending) => Some(pending),
            OrchestratorPhase::Idle | OrchestratorPhase::DelegatingReveal(_) => None,
        }
    }

    /// Appends the user message and enters `Sending`.
    ///
    /// Calls made while a request or reveal is active, or with blank text, change nothing.
    pub fn submit(
        &mut self,
        state: &mut SessionState,
        scheduler: &StepRevealScheduler,
        query: &str,
    ) -> Result<ChatRequest, SubmitRejection> {
        match &self.phase {
            OrchestratorPhase::Idle => {}
            OrchestratorPhase::Sending(pending) => {
                return Err(SubmitRejection::RequestInFlight(pending.request_id));
            }
            OrchestratorPhase::DelegatingReveal(request_id) => {
                return Err(SubmitRejection::RequestInFlight(*request_id));
            }
        }
        if scheduler.is_revealing() {
            return Err(SubmitRejection::Revealing);
        }

        let text = query.trim();
        if text.is_empty() {
            return Err(SubmitRejection::EmptyQuery);
        }

        self.next_request_id = self.next_request_id.saturating_add(1);
        let request_id = RequestId(self.next_request_id);

        state.append_message(MessageKind::User, text);
        self.phase = OrchestratorPhase::Sending(PendingQuery {
            request_id,
            text: text.to_string(),
        });

        tracing::debug!(request_id = request_id.0, query_len = text.len(), "request sending");
        Ok(ChatRequest::new(text))
    }

    /// Applies the outcome of the outstanding request.
    ///
    /// The video is replaced before any reply text is appended so both become visible together.
    pub fn resolve(
        &mut self,
        state: &mut SessionState,
        scheduler: &mut StepRevealScheduler,
        outcome: ServiceResult<ChatResponse>,
    ) -> Result<Resolution, ResolveRejection> {
        let pending = match &self.phase {
            OrchestratorPhase::Sending(pending) => pending.clone(),
            OrchestratorPhase::Idle | OrchestratorPhase::DelegatingReveal(_) => {
                return Err(ResolveRejection::NoPendingRequest);
            }
        };
        self.phase = OrchestratorPhase::Idle;

        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(
                    request_id = pending.request_id.0,
                    error = %error,
                    "answering service call failed"
                );
                let id = state.append_message(MessageKind::Bot, APOLOGY_TEXT);
                return Ok(Resolution::Failed(id));
            }
        };

        let plan = ReplyPlan::from_response(&response);
        state.set_video(
            VideoReference::new(
                response.video_id,
                response.video_title,
                response.video_views,
            )
            .with_url(response.video_url),
        );

        match plan {
            ReplyPlan::Single(text) => {
                let id = state.append_message(MessageKind::Bot, text);
                tracing::debug!(request_id = pending.request_id.0, "request answered");
                Ok(Resolution::Replied(id))
            }
            ReplyPlan::Steps(steps) => {
                let step_count = steps.len();
                match scheduler.begin(state, steps) {
                    Ok(_) => {
                        self.phase = OrchestratorPhase::DelegatingReveal(pending.request_id);
                        Ok(Resolution::Revealing { step_count })
                    }
                    Err(rejection) => {
                        tracing::error!(
                            request_id = pending.request_id.0,
                            ?rejection,
                            "step reveal rejected"
                        );
                        let apology = state.append_message(MessageKind::Bot, APOLOGY_TEXT);
                        Ok(Resolution::RevealRejected { rejection, apology })
                    }
                }
            }
        }
    }

    /// Returns to `Idle` once the scheduler has appended the final step.
    pub fn reveal_finished(&mut self) {
        if let OrchestratorPhase::DelegatingReveal(request_id) = self.phase {
            tracing::debug!(request_id = request_id.0, "request answered step by step");
            self.phase = OrchestratorPhase::Idle;
        }
    }

    /// Forgets the outstanding exchange without touching the timeline.
    pub fn abandon(&mut self) {
        self.phase = OrchestratorPhase::Idle;
    }
}
