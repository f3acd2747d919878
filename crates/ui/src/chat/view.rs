use std::sync::Arc;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, v_flex};
use gpui_tokio_bridge::Tokio;
use tokio::sync::watch;
use vidchat_service::{AnswerService, ServiceConfig, ServiceError, create_service};
use vidchat_session::{Activity, Session, SessionConfig, SessionHandle, SessionSnapshot};

use crate::chat::events::{OpenVideo, Submit};
use crate::chat::{MessageInput, MessageList, VideoPanel};
use crate::settings::{ClientSettings, SettingsStore};

/// Coordinator between the session worker and the transcript, input and video views.
pub struct ChatView {
    video_panel: Entity<VideoPanel>,
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    settings: SettingsStore,
    service: Option<Arc<dyn AnswerService>>,
    service_error: Option<String>,
    session_config: SessionConfig,
    session: Option<SessionHandle>,
    session_worker_task: Option<Task<Result<(), gpui_tokio_bridge::JoinError>>>,
    snapshot_reader_task: Option<Task<()>>,
    activity: Option<Activity>,
}

impl ChatView {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let video_panel = cx.new(VideoPanel::new);
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(window, cx));

        let settings = SettingsStore::load();
        let client_settings = settings.settings();
        let (service, service_error) = Self::initialize_service(&client_settings);

        let mut this = Self {
            video_panel: video_panel.clone(),
            message_list,
            message_input: message_input.clone(),
            settings,
            service,
            service_error,
            session_config: client_settings.to_session_config(),
            session: None,
            session_worker_task: None,
            snapshot_reader_task: None,
            activity: None,
        };

        cx.subscribe(&message_input, |this, _, event: &Submit, cx| {
            this.handle_submit(event, cx);
        })
        .detach();

        cx.subscribe(&video_panel, |_, _, event: &OpenVideo, cx| {
            tracing::info!(url = %event.url, "opening video");
            cx.open_url(&event.url);
        })
        .detach();

        this.probe_service_health(cx);
        this.start_session(cx);
        this
    }

    pub fn video_panel(&self) -> &Entity<VideoPanel> {
        &self.video_panel
    }

    pub fn service_url(&self) -> String {
        self.settings.settings().service_url.clone()
    }

    /// Tears down the running session and starts a fresh one.
    pub fn new_session(&mut self, cx: &mut Context<Self>) {
        tracing::info!("starting new session");
        self.start_session(cx);
    }

    pub fn toggle_theme_mode(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let updated = self.settings.settings().as_ref().clone().with_toggled_theme_mode();
        updated.apply_theme(Some(window), cx);

        if let Err(error) = self.settings.set_theme_mode(updated.theme_mode) {
            tracing::error!(error = %error, "failed to persist theme mode");
        }
        cx.refresh_windows();
    }

    fn initialize_service(
        settings: &ClientSettings,
    ) -> (Option<Arc<dyn AnswerService>>, Option<String>) {
        match create_service(settings.to_service_config()) {
            Ok(service) => {
                tracing::info!(
                    service = service.name(),
                    url = %settings.service_url,
                    "initialized answering service"
                );
                return (Some(service), None);
            }
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    url = %settings.service_url,
                    "failed to create answering service from settings, falling back to default"
                );
            }
        }

        match create_service(ServiceConfig::default()) {
            Ok(service) => (Some(service), None),
            Err(error) => {
                tracing::error!(error = %error, "failed to initialize answering service");
                (None, Some(Self::describe_service_error(&error)))
            }
        }
    }

    fn describe_service_error(error: &ServiceError) -> String {
        format!("Answering service unavailable: {error}")
    }

    fn probe_service_health(&self, cx: &mut Context<Self>) {
        let Some(service) = self.service.clone() else {
            return;
        };

        Tokio::spawn(cx, async move {
            match service.health().await {
                Ok(banner) => {
                    tracing::info!(banner = %banner, "answering service is reachable");
                }
                Err(error) => {
                    tracing::warn!(error = %error, "answering service health probe failed");
                }
            }
        })
        .detach();
    }

    fn start_session(&mut self, cx: &mut Context<Self>) {
        self.stop_session();

        let Some(service) = self.service.clone() else {
            cx.notify();
            return;
        };

        let (handle, worker) = Session::start(service, self.session_config);
        self.session_worker_task = Some(Tokio::spawn(cx, worker));
        self.spawn_snapshot_reader(handle.subscribe(), cx);

        self.message_list.update(cx, |list, cx| {
            list.reset_scroll_tracking(cx);
        });
        self.apply_snapshot(handle.snapshot(), cx);
        self.session = Some(handle);
    }

    fn stop_session(&mut self) {
        // Dropping the handle signals the worker; dropping the reader stops UI updates.
        if let Some(mut session) = self.session.take() {
            session.shutdown();
        }
        self.snapshot_reader_task = None;
        self.session_worker_task = None;
    }

    fn spawn_snapshot_reader(
        &mut self,
        mut snapshots: watch::Receiver<SessionSnapshot>,
        cx: &mut Context<Self>,
    ) {
        self.snapshot_reader_task = Some(cx.spawn(async move |this, cx| {
            while snapshots.changed().await.is_ok() {
                let snapshot = snapshots.borrow_and_update().clone();
                if this
                    .update(cx, |this, cx| this.apply_snapshot(snapshot, cx))
                    .is_err()
                {
                    break;
                }
            }
        }));
    }

    fn apply_snapshot(&mut self, snapshot: SessionSnapshot, cx: &mut Context<Self>) {
        self.activity = snapshot.activity();

        self.message_input.update(cx, |input, cx| {
            input.set_status(snapshot.status, cx);
        });
        self.video_panel.update(cx, |panel, cx| {
            panel.set_video(snapshot.video.clone(), cx);
        });
        self.message_list.update(cx, |list, cx| {
            list.set_timeline(snapshot.timeline, snapshot.scroll_epoch, cx);
        });

        cx.notify();
    }

    fn handle_submit(&mut self, event: &Submit, _cx: &mut Context<Self>) {
        let Some(session) = self.session.as_ref() else {
            tracing::warn!("submit ignored: no running session");
            return;
        };

        if !session.can_submit(&event.content) {
            tracing::debug!("submit ignored: input gate closed");
            return;
        }

        if !session.submit(event.content.clone()) {
            tracing::warn!("submit dropped: session worker has stopped");
        }
    }

    fn render_activity(&self, cx: &Context<Self>) -> Option<impl IntoElement> {
        let activity = self.activity?;
        let theme = cx.theme();

        Some(
            h_flex()
                .id("chat-view-activity")
                .w_full()
                .gap_2()
                .px_4()
                .py_1()
                .items_center()
                .child(div().size(px(8.)).rounded_full().bg(theme.primary))
                .child(
                    Label::new(activity.label())
                        .text_xs()
                        .text_color(theme.foreground.opacity(0.65)),
                ),
        )
    }
}

impl Render for ChatView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let service_error = self.service_error.clone();

        v_flex()
            .id("chat-view")
            .relative()
            .size_full()
            .min_h_0()
            .overflow_hidden()
            .bg(theme.background)
            .when_some(service_error, |view, error| {
                view.child(
                    div()
                        .id("chat-view-service-error")
                        .w_full()
                        .px_4()
                        .py_2()
                        .border_b_1()
                        .border_color(theme.border)
                        .child(Label::new(error).text_xs().text_color(theme.danger)),
                )
            })
            .child(
                div()
                    .id("chat-view-message-list")
                    .flex_1()
                    .min_h_0()
                    .child(self.message_list.clone()),
            )
            .children(self.render_activity(cx))
            .child(
                div()
                    .id("chat-view-message-input")
                    .flex_shrink_0()
                    .w_full()
                    .border_t_1()
                    .border_color(theme.border)
                    .child(self.message_input.clone()),
            )
    }
}
