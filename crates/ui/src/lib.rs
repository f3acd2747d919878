#![deny(unsafe_code)]

/// Video chat application shell and components.
///
/// This crate provides the desktop client built with GPUI and gpui-component: a video
/// panel next to a chat transcript driven by a `vidchat-session` worker.
pub mod app;
/// Chat view components that render session snapshots.
pub mod chat;
/// Client settings persistence.
pub mod settings;
