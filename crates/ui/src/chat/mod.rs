/// Event contracts for chat module wiring.
pub mod events;
pub mod message_input;
pub mod message_list;
pub mod scroll_manager;
pub mod video_panel;
pub mod view;

pub use events::{OpenVideo, Submit};
pub use message_input::MessageInput;
pub use message_list::MessageList;
pub use scroll_manager::ScrollManager;
pub use video_panel::VideoPanel;
pub use view::ChatView;
