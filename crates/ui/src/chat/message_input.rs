use gpui::*;
use gpui_component::{
    ActiveTheme, Disableable as _, IconName, Sizable,
    button::{Button, ButtonVariants},
    input::{Input, InputEvent, InputState},
    v_flex,
};
use vidchat_session::{EnterAction, InputGate, SessionStatus};

use crate::chat::events::Submit;

/// Enabled state of the text field and the Send button for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InputControls {
    field_enabled: bool,
    send_enabled: bool,
}

impl InputControls {
    fn resolve(status: SessionStatus, draft: &str) -> Self {
        Self {
            field_enabled: InputGate::input_enabled(status),
            send_enabled: InputGate::can_submit(status, draft),
        }
    }
}

pub struct MessageInput {
    input_state: Entity<InputState>,
    status: SessionStatus,
    pending_newline: bool,
}

impl EventEmitter<Submit> for MessageInput {}

impl MessageInput {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let input_state = cx.new(|cx| {
            InputState::new(window, cx)
                .placeholder("Ask a question...")
                .clean_on_escape()
                .auto_grow(1, 6)
        });

        cx.subscribe_in(
            &input_state,
            window,
            |this, _, event: &InputEvent, window, cx| {
                if let InputEvent::PressEnter { secondary } = event {
                    // Shift+Enter inserts a newline manually and then still emits PressEnter.
                    let shift = std::mem::take(&mut this.pending_newline);
                    match InputGate::classify_enter(shift, *secondary) {
                        EnterAction::InsertNewline => {}
                        EnterAction::Submit => {
                            this.trim_trailing_newline(window, cx);
                            this.handle_submit(window, cx);
                        }
                    }
                }
            },
        )
        .detach();

        // Re-render on every edit so the Send button tracks the draft.
        cx.observe(&input_state, |_, _, cx| cx.notify()).detach();

        Self {
            input_state,
            status: SessionStatus::default(),
            pending_newline: false,
        }
    }

    pub fn set_status(&mut self, status: SessionStatus, cx: &mut Context<Self>) {
        if self.status == status {
            return;
        }

        self.status = status;
        if !InputGate::input_enabled(status) {
            self.pending_newline = false;
        }
        cx.notify();
    }

    pub fn clear(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state.update(cx, |state, cx| {
            state.set_value("", window, cx);
        });
        self.pending_newline = false;
    }

    fn handle_shift_enter(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if !InputGate::input_enabled(self.status) {
            return;
        }

        self.pending_newline = true;
        self.input_state.update(cx, |state, cx| {
            state.insert("\n", window, cx);
        });
        cx.notify();
    }

    fn trim_trailing_newline(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state.update(cx, |state, cx| {
            let value = state.value().to_string();
            if let Some(trimmed) = value.strip_suffix('\n') {
                state.set_value(trimmed.to_string(), window, cx);
            }
        });
    }

    fn handle_submit(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let content = self.input_state.read(cx).value().to_string();
        if !InputGate::can_submit(self.status, &content) {
            return;
        }

        cx.emit(Submit::new(content));
        self.clear(window, cx);
    }
}

impl Render for MessageInput {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let controls = InputControls::resolve(self.status, &self.input_state.read(cx).value());
        let theme = cx.theme();

        v_flex()
            .bg(theme.background)
            .gap_2()
            .p_3()
            .child(
                div()
                    .w_full()
                    .px_3()
                    .py_2()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.background)
                    .on_key_down(cx.listener(|this, event: &KeyDownEvent, window, cx| {
                        if event.keystroke.key == "enter" && event.keystroke.modifiers.shift {
                            this.handle_shift_enter(window, cx);
                        }
                    }))
                    .child(
                        Input::new(&self.input_state)
                            .w_full()
                            .disabled(!controls.field_enabled),
                    ),
            )
            .child(
                div().w_full().flex().justify_end().child(
                    Button::new("send")
                        .small()
                        .primary()
                        .icon(IconName::ArrowUp)
                        .child("Send")
                        .disabled(!controls.send_enabled)
                        .on_click(cx.listener(|this, _, window, cx| {
                            this.handle_submit(window, cx);
                        })),
                ),
            )
    }
}
