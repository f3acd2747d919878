pub mod events;
pub mod follow;
pub mod gate;
pub mod message;
pub mod orchestrator;
pub mod scheduler;
pub mod session;
pub mod state;

pub use events::SessionIntent;
pub use follow::{ScrollTicket, ViewportFollow};
pub use gate::{Activity, EnterAction, InputGate, SessionStatus};
pub use message::{
    APOLOGY_TEXT, FALLBACK_REPLY_TEXT, Message, MessageId, MessageKind, REVEAL_INTRO_TEXT,
    VideoReference,
};
pub use orchestrator::{
    OrchestratorPhase, PendingQuery, RequestId, RequestOrchestrator, Resolution,
    ResolveRejection, SubmitRejection,
};
pub use scheduler::{DEFAULT_STEP_DELAY, RevealProgress, RevealRejection, StepRevealScheduler};
pub use session::{Session, SessionConfig, SessionHandle, SessionSnapshot, SessionWorker};
pub use state::{SessionState, TimelineObserver};
