use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot, watch};
use vidchat_service::{
    AnswerService, DEFAULT_REQUEST_TIMEOUT, RandomVideo, ServiceError, ServiceFuture,
    ServiceResult,
};

use crate::events::SessionIntent;
use crate::follow::{ScrollTicket, ViewportFollow};
use crate::gate::{Activity, InputGate, SessionStatus};
use crate::message::{Message, VideoReference};
use crate::orchestrator::{RequestOrchestrator, Resolution};
use crate::scheduler::{DEFAULT_STEP_DELAY, RevealProgress, StepRevealScheduler};
use crate::state::SessionState;

/// Future that drives one session until it is torn down.
pub type SessionWorker = BoxFuture<'static, ()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub step_delay: Duration,
    /// Upper bound for one answering service call; expiry counts as a failed call.
    pub request_timeout: Duration,
    /// Replace the placeholder with a random video when the session starts.
    pub fetch_initial_video: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            step_delay: DEFAULT_STEP_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fetch_initial_video: false,
        }
    }
}

/// Point-in-time, read-only view of a session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub timeline: Vec<Message>,
    pub video: VideoReference,
    pub status: SessionStatus,
    /// Changes on every timeline append; the transcript scrolls to its end when it does.
    pub scroll_epoch: u64,
}

impl SessionSnapshot {
    pub fn can_submit(&self, input: &str) -> bool {
        InputGate::can_submit(self.status, input)
    }

    pub fn activity(&self) -> Option<Activity> {
        self.status.activity()
    }
}

/// Presentation-side handle to a running session.
///
/// Dropping the handle tears the session down.
pub struct SessionHandle {
    intents: mpsc::UnboundedSender<SessionIntent>,
    snapshots: watch::Receiver<SessionSnapshot>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl SessionHandle {
    /// Queues a submission. Returns false once the session has stopped.
    pub fn submit(&self, content: impl Into<String>) -> bool {
        self.intents.send(SessionIntent::submit(content)).is_ok()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn can_submit(&self, input: &str) -> bool {
        self.snapshots.borrow().can_submit(input)
    }

    /// Stops the worker; the in-flight request and any pending step are dropped.
    pub fn shutdown(&mut self) -> bool {
        self.cancel_tx
            .take()
            .map(|tx| tx.send(()).is_ok())
            .unwrap_or(false)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
        }
    }
}

/// Single writer for one chat session.
///
/// Owns the timeline, the orchestrator and the scheduler. All mutation happens inside
/// the worker future returned by [`Session::start`], so two submissions can never
/// interleave and nothing is appended after teardown.
pub struct Session {
    state: SessionState,
    orchestrator: RequestOrchestrator,
    scheduler: StepRevealScheduler,
    scroll: ScrollTicket,
    service: Arc<dyn AnswerService>,
    config: SessionConfig,
    intents: mpsc::UnboundedReceiver<SessionIntent>,
    snapshots: watch::Sender<SessionSnapshot>,
    cancel_rx: oneshot::Receiver<()>,
    torn_down: bool,
}

impl Session {
    pub fn start(
        service: Arc<dyn AnswerService>,
        config: SessionConfig,
    ) -> (SessionHandle, SessionWorker) {
        let (follow, scroll) = ViewportFollow::new();
        let mut state = SessionState::new();
        state.add_observer(Box::new(follow));

        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot {
            timeline: Vec::new(),
            video: state.current_video().clone(),
            status: SessionStatus::default(),
            scroll_epoch: scroll.epoch(),
        });

        let session = Self {
            state,
            orchestrator: RequestOrchestrator::new(),
            scheduler: StepRevealScheduler::new(config.step_delay),
            scroll,
            service,
            config,
            intents: intent_rx,
            snapshots: snapshot_tx,
            cancel_rx,
            torn_down: false,
        };

        let handle = SessionHandle {
            intents: intent_tx,
            snapshots: snapshot_rx,
            cancel_tx: Some(cancel_tx),
        };

        (handle, Box::pin(session.run()))
    }

    fn status(&self) -> SessionStatus {
        SessionStatus {
            busy: self.orchestrator.is_busy(),
            revealing: self.scheduler.is_revealing(),
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(SessionSnapshot {
            timeline: self.state.timeline().to_vec(),
            video: self.state.current_video().clone(),
            status: self.status(),
            scroll_epoch: self.scroll.epoch(),
        });
    }

    async fn run(mut self) {
        tracing::debug!(service = self.service.name(), "session worker started");

        let mut initial_video: Option<ServiceFuture<RandomVideo>> = self
            .config
            .fetch_initial_video
            .then(|| self.service.random_video());

        loop {
            let intent = tokio::select! {
                biased;
                _ = &mut self.cancel_rx => break,
                Some(result) = poll_slot(&mut initial_video) => {
                    initial_video = None;
                    self.apply_initial_video(result);
                    continue;
                }
                intent = self.intents.recv() => intent,
            };

            match intent {
                Some(SessionIntent::Submit { content }) => {
                    if self.handle_submit(content).await {
                        // A submitted answer always brings its own video.
                        initial_video = None;
                    }
                    if self.torn_down {
                        break;
                    }
                }
                None => break,
            }
        }

        self.teardown();
    }

    /// Runs one submission to completion. Returns whether a request was issued.
    async fn handle_submit(&mut self, content: String) -> bool {
        let request = match self
            .orchestrator
            .submit(&mut self.state, &self.scheduler, &content)
        {
            Ok(request) => request,
            Err(rejection) => {
                tracing::debug!(?rejection, "submit ignored");
                return false;
            }
        };
        self.publish();

        let request_timeout = self.config.request_timeout;
        let call = tokio::time::timeout(request_timeout, self.service.chat(request));
        let Some(outcome) = self.suspend(call).await else {
            return true;
        };
        let outcome: ServiceResult<_> = outcome.unwrap_or_else(|_| {
            Err(ServiceError::TimedOut {
                stage: "await-chat-response",
                after: request_timeout,
            })
        });

        match self
            .orchestrator
            .resolve(&mut self.state, &mut self.scheduler, outcome)
        {
            Ok(Resolution::Revealing { step_count }) => {
                tracing::debug!(step_count, "revealing answer step by step");
                self.publish();
                self.run_reveal().await;
            }
            Ok(_) => {}
            Err(rejection) => {
                tracing::warn!(?rejection, "dropping response without a pending request");
            }
        }

        if !self.torn_down {
            self.publish();
        }
        true
    }

    /// Appends the remaining steps, waiting the step delay before each one.
    async fn run_reveal(&mut self) {
        loop {
            let step_delay = self.scheduler.step_delay();
            if self.suspend(tokio::time::sleep(step_delay)).await.is_none() {
                return;
            }

            let progress = self.scheduler.reveal_next(&mut self.state);
            self.publish();
            match progress {
                RevealProgress::Continue(_) => {}
                RevealProgress::Finished(_) | RevealProgress::Idle => break,
            }
        }

        self.orchestrator.reveal_finished();
    }

    /// Awaits `future` while rejecting intents that arrive in the meantime.
    ///
    /// Returns `None` when the session is torn down before `future` completes.
    async fn suspend<F>(&mut self, future: F) -> Option<F::Output>
    where
        F: Future,
    {
        tokio::pin!(future);

        loop {
            tokio::select! {
                biased;
                _ = &mut self.cancel_rx => {
                    self.torn_down = true;
                    return None;
                }
                output = &mut future => return Some(output),
                intent = self.intents.recv() => match intent {
                    Some(SessionIntent::Submit { content }) => self.reject_while_busy(&content),
                    None => {
                        self.torn_down = true;
                        return None;
                    }
                },
            }
        }
    }

    fn reject_while_busy(&self, content: &str) {
        debug_assert!(!self.status().is_idle());
        tracing::debug!(
            query_len = content.len(),
            status = ?self.status(),
            "submit ignored while session is busy"
        );
    }

    fn apply_initial_video(&mut self, result: ServiceResult<RandomVideo>) {
        match result {
            Ok(video) if self.state.video_revision() == 0 && self.status().is_idle() => {
                tracing::info!(video_id = %video.video_id, "loaded starting video");
                self.state.set_video(
                    VideoReference::new(video.video_id, video.title, video.views)
                        .with_url(video.video_url),
                );
                self.publish();
            }
            Ok(_) => {
                tracing::debug!("starting video arrived after an answer; keeping current video");
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to load starting video; keeping placeholder");
            }
        }
    }

    fn teardown(&mut self) {
        let unrevealed = self.scheduler.cancel();
        self.orchestrator.abandon();
        tracing::debug!(
            timeline_len = self.state.timeline().len(),
            unrevealed = ?unrevealed,
            "session worker stopped"
        );
    }
}

async fn poll_slot<F>(slot: &mut Option<F>) -> Option<F::Output>
where
    F: Future + Unpin,
{
    match slot.as_mut() {
        Some(future) => Some(future.await),
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;
    use tokio::time::Instant;
    use vidchat_service::{ChatRequest, ChatResponse};

    use super::*;
    use crate::message::{APOLOGY_TEXT, MessageKind, REVEAL_INTRO_TEXT};

    enum Scripted {
        After(Duration, ServiceResult<ChatResponse>),
        Never,
    }

    #[derive(Default)]
    struct ScriptedService {
        replies: Mutex<VecDeque<Scripted>>,
        random: Mutex<Option<(Duration, RandomVideo)>>,
        queries: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedService {
        fn replying(replies: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AnswerService for ScriptedService {
        fn name(&self) -> &str {
            "scripted"
        }

        fn chat(&self, request: ChatRequest) -> ServiceFuture<ChatResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(request.message);
            match self.replies.lock().unwrap().pop_front() {
                Some(Scripted::After(delay, result)) => async move {
                    tokio::time::sleep(delay).await;
                    result
                }
                .boxed(),
                Some(Scripted::Never) | None => futures::future::pending().boxed(),
            }
        }

        fn random_video(&self) -> ServiceFuture<RandomVideo> {
            match self.random.lock().unwrap().take() {
                Some((delay, video)) => async move {
                    tokio::time::sleep(delay).await;
                    Ok(video)
                }
                .boxed(),
                None => futures::future::pending().boxed(),
            }
        }

        fn health(&self) -> ServiceFuture<String> {
            async { Ok("ok".to_string()) }.boxed()
        }
    }

    fn steps_response() -> ChatResponse {
        ChatResponse {
            video_id: "abc123".to_string(),
            video_title: "Basics".to_string(),
            video_views: 42,
            video_url: None,
            reply: None,
            reply_steps: Some(vec![
                "First, 2 means two units.".to_string(),
                "Then add another two units.".to_string(),
                "Result: 4.".to_string(),
            ]),
        }
    }

    fn reply_response() -> ChatResponse {
        ChatResponse {
            video_id: "xyz".to_string(),
            video_title: "Greetings".to_string(),
            video_views: 5,
            video_url: None,
            reply: Some("Hi there!".to_string()),
            reply_steps: None,
        }
    }

    fn start(service: Arc<ScriptedService>, config: SessionConfig) -> SessionHandle {
        let (handle, worker) = Session::start(service, config);
        tokio::spawn(worker);
        handle
    }

    async fn wait_for(
        rx: &mut watch::Receiver<SessionSnapshot>,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        rx.wait_for(predicate)
            .await
            .expect("session publishes snapshots")
            .clone()
    }

    fn texts(snapshot: &SessionSnapshot) -> Vec<&str> {
        snapshot
            .timeline
            .iter()
            .map(|message| message.text.as_str())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn multi_step_answer_is_revealed_progressively() {
        let service =
            ScriptedService::replying(vec![Scripted::After(Duration::ZERO, Ok(steps_response()))]);
        let handle = start(service.clone(), SessionConfig::default());
        let mut rx = handle.subscribe();

        let submitted_at = Instant::now();
        assert!(handle.submit("2+2"));

        let mut appended_at = Vec::new();
        let mut seen = 0;
        loop {
            rx.changed().await.expect("session is running");
            let snapshot = rx.borrow_and_update().clone();

            if snapshot.video.video_id == "abc123" {
                assert!(
                    snapshot.timeline.iter().any(|m| m.text == REVEAL_INTRO_TEXT),
                    "video must not appear before the intro"
                );
            }
            while seen < snapshot.timeline.len() {
                appended_at.push(Instant::now());
                seen += 1;
            }
            if snapshot.status.is_idle() && seen == 5 {
                break;
            }
        }

        let snapshot = handle.snapshot();
        assert_eq!(
            texts(&snapshot),
            vec![
                "2+2",
                REVEAL_INTRO_TEXT,
                "First, 2 means two units.",
                "Then add another two units.",
                "Result: 4.",
            ]
        );
        assert_eq!(snapshot.timeline[0].kind, MessageKind::User);
        assert_eq!(snapshot.timeline[1].kind, MessageKind::Bot);
        let step_kinds = snapshot.timeline[2..]
            .iter()
            .map(|message| message.kind)
            .collect::<Vec<_>>();
        assert_eq!(
            step_kinds,
            vec![
                MessageKind::Step {
                    index: 1,
                    is_final: false
                },
                MessageKind::Step {
                    index: 2,
                    is_final: false
                },
                MessageKind::Step {
                    index: 3,
                    is_final: true
                },
            ]
        );
        assert_eq!(snapshot.video, VideoReference::new("abc123", "Basics", 42));
        assert_eq!(snapshot.scroll_epoch, 5);

        // Intro arrives with the response; each step follows the previous one by the step delay.
        assert!(appended_at[1] - submitted_at < Duration::from_millis(5));
        for pair in appended_at[1..].windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= DEFAULT_STEP_DELAY, "step arrived after {gap:?}");
            assert!(gap < DEFAULT_STEP_DELAY + Duration::from_millis(5));
        }
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn single_reply_appends_one_bot_message() {
        let service =
            ScriptedService::replying(vec![Scripted::After(Duration::ZERO, Ok(reply_response()))]);
        let handle = start(service, SessionConfig::default());
        let mut rx = handle.subscribe();

        handle.submit("hello");
        let snapshot = wait_for(&mut rx, |s| s.timeline.len() == 2 && s.status.is_idle()).await;

        assert_eq!(texts(&snapshot), vec!["hello", "Hi there!"]);
        assert_eq!(snapshot.timeline[1].kind, MessageKind::Bot);
        assert_eq!(snapshot.video, VideoReference::new("xyz", "Greetings", 5));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.snapshot().timeline.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_call_appends_apology_and_reopens_gate() {
        let service = ScriptedService::replying(vec![Scripted::After(
            Duration::from_millis(50),
            Err(ServiceError::UnexpectedStatus {
                stage: "test",
                status: 500,
                body: "Error processing chat".to_string(),
            }),
        )]);
        let handle = start(service, SessionConfig::default());
        let mut rx = handle.subscribe();

        handle.submit("2+2");
        let busy = wait_for(&mut rx, |s| s.timeline.len() == 1).await;
        assert!(busy.status.busy);
        assert!(!busy.can_submit("next"));

        let snapshot = wait_for(&mut rx, |s| s.timeline.len() == 2 && s.status.is_idle()).await;
        assert_eq!(texts(&snapshot), vec!["2+2", APOLOGY_TEXT]);
        assert_eq!(snapshot.video, VideoReference::placeholder());
        assert!(snapshot.can_submit("next"));
    }

    #[tokio::test(start_paused = true)]
    async fn blank_submission_makes_no_call() {
        let service = ScriptedService::replying(Vec::new());
        let handle = start(service.clone(), SessionConfig::default());

        handle.submit("   \n ");
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(handle.snapshot().timeline.is_empty());
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn submissions_while_busy_are_ignored() {
        let service = ScriptedService::replying(vec![
            Scripted::After(Duration::from_secs(1), Ok(steps_response())),
            Scripted::After(Duration::ZERO, Ok(reply_response())),
        ]);
        let handle = start(service.clone(), SessionConfig::default());
        let mut rx = handle.subscribe();

        handle.submit("2+2");
        wait_for(&mut rx, |s| s.timeline.len() == 1).await;
        handle.submit("while sending");

        let revealing = wait_for(&mut rx, |s| s.status.revealing).await;
        assert!(!revealing.can_submit("while revealing"));
        handle.submit("while revealing");

        let done = wait_for(&mut rx, |s| s.timeline.len() == 5 && s.status.is_idle()).await;
        assert!(done.timeline.iter().all(|m| !m.text.starts_with("while")));
        assert_eq!(service.calls(), 1);

        handle.submit("hello");
        let snapshot = wait_for(&mut rx, |s| s.timeline.len() == 7 && s.status.is_idle()).await;
        assert_eq!(&texts(&snapshot)[5..], &["hello", "Hi there!"]);
        assert_eq!(
            *service.queries.lock().unwrap(),
            vec!["2+2".to_string(), "hello".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_mid_reveal_stops_appends() {
        let service =
            ScriptedService::replying(vec![Scripted::After(Duration::ZERO, Ok(steps_response()))]);
        let (handle, worker) = Session::start(service, SessionConfig::default());
        let worker = tokio::spawn(worker);
        let mut rx = handle.subscribe();

        handle.submit("2+2");
        wait_for(&mut rx, |s| s.timeline.len() == 3).await;
        drop(handle);

        worker.await.expect("worker exits cleanly");
        tokio::time::sleep(Duration::from_secs(10)).await;

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.timeline.len(), 3);
        assert_eq!(snapshot.timeline[2].step_index(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_during_request_drops_the_response() {
        let service = ScriptedService::replying(vec![Scripted::After(
            Duration::from_secs(1),
            Ok(reply_response()),
        )]);
        let (handle, worker) = Session::start(service.clone(), SessionConfig::default());
        let worker = tokio::spawn(worker);
        let mut rx = handle.subscribe();

        handle.submit("hello");
        let sending = wait_for(&mut rx, |s| s.timeline.len() == 1).await;
        assert!(sending.status.busy);
        drop(handle);

        worker.await.expect("worker exits cleanly");
        tokio::time::sleep(Duration::from_secs(5)).await;

        let snapshot = rx.borrow().clone();
        assert_eq!(texts(&snapshot), vec!["hello"]);
        assert_eq!(snapshot.video, VideoReference::placeholder());
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_request_times_out_into_apology() {
        let service = ScriptedService::replying(vec![Scripted::Never]);
        let config = SessionConfig {
            request_timeout: Duration::from_secs(2),
            ..SessionConfig::default()
        };
        let handle = start(service, config);
        let mut rx = handle.subscribe();

        let submitted_at = Instant::now();
        handle.submit("anyone there?");
        let snapshot = wait_for(&mut rx, |s| s.timeline.len() == 2).await;

        let waited = Instant::now() - submitted_at;
        assert!(waited >= Duration::from_secs(2));
        assert!(waited < Duration::from_millis(2_005));
        assert_eq!(texts(&snapshot), vec!["anyone there?", APOLOGY_TEXT]);
        assert!(snapshot.status.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn starting_video_replaces_placeholder() {
        let service = ScriptedService::replying(Vec::new());
        *service.random.lock().unwrap() = Some((
            Duration::from_millis(100),
            RandomVideo {
                video_id: "r1".to_string(),
                title: "Trending".to_string(),
                views: 1000,
                video_url: None,
            },
        ));
        let config = SessionConfig {
            fetch_initial_video: true,
            ..SessionConfig::default()
        };
        let handle = start(service, config);
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| s.video.video_id == "r1").await;

        assert_eq!(snapshot.video, VideoReference::new("r1", "Trending", 1000));
        assert!(snapshot.timeline.is_empty());
        assert_eq!(snapshot.scroll_epoch, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn submission_abandons_starting_video() {
        let service =
            ScriptedService::replying(vec![Scripted::After(Duration::ZERO, Ok(reply_response()))]);
        *service.random.lock().unwrap() = Some((
            Duration::from_secs(5),
            RandomVideo {
                video_id: "r1".to_string(),
                title: "Trending".to_string(),
                views: 1000,
                video_url: None,
            },
        ));
        let config = SessionConfig {
            fetch_initial_video: true,
            ..SessionConfig::default()
        };
        let handle = start(service, config);
        let mut rx = handle.subscribe();

        handle.submit("hello");
        wait_for(&mut rx, |s| s.timeline.len() == 2).await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(handle.snapshot().video.video_id, "xyz");
    }
}
