use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    label::Label,
    v_flex,
};
use vidchat_session::VideoReference;

use crate::chat::events::OpenVideo;

/// Playback surface for the session's current video.
pub struct VideoPanel {
    video: VideoReference,
}

impl EventEmitter<OpenVideo> for VideoPanel {}

impl VideoPanel {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            video: VideoReference::placeholder(),
        }
    }

    pub fn video(&self) -> &VideoReference {
        &self.video
    }

    pub fn set_video(&mut self, video: VideoReference, cx: &mut Context<Self>) {
        if self.video == video {
            return;
        }

        tracing::debug!(video_id = %video.video_id, "video panel updated");
        self.video = video;
        cx.notify();
    }

    fn open_video(&mut self, cx: &mut Context<Self>) {
        cx.emit(OpenVideo {
            url: self.video.watch_url(),
        });
    }
}

impl Render for VideoPanel {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("video-panel")
            .size_full()
            .gap_3()
            .p_4()
            .bg(theme.background)
            .child(
                div()
                    .id("video-panel-frame")
                    .w_full()
                    .h(px(200.))
                    .rounded_lg()
                    .bg(theme.muted)
                    .border_1()
                    .border_color(theme.border)
                    .flex()
                    .items_center()
                    .justify_center()
                    .cursor_pointer()
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.open_video(cx);
                    }))
                    .child(
                        Label::new(self.video.embed_url())
                            .text_xs()
                            .text_color(theme.muted_foreground),
                    ),
            )
            .child(Label::new(self.video.title.clone()).text_sm())
            .child(
                Label::new(format_view_count(self.video.view_count))
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.6)),
            )
            .child(
                Button::new("open-video")
                    .small()
                    .outline()
                    .icon(IconName::ExternalLink)
                    .child("Watch")
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.open_video(cx);
                    })),
            )
    }
}

/// Renders a view count with thousands separators, e.g. `1,000,000,000 views`.
pub fn format_view_count(view_count: u64) -> String {
    let digits = view_count.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let noun = if view_count == 1 { "view" } else { "views" };
    format!("{grouped} {noun}")
}
