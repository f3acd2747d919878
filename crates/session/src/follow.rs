use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::message::Message;
use crate::state::TimelineObserver;

/// Bumps a scroll-request epoch on every timeline append.
///
/// The view compares the epoch it last honored with [`ScrollTicket::epoch`] and
/// scrolls the transcript to its end whenever they differ.
pub struct ViewportFollow {
    epoch: Arc<AtomicU64>,
}

/// Read side of [`ViewportFollow`].
#[derive(Debug, Clone)]
pub struct ScrollTicket {
    epoch: Arc<AtomicU64>,
}

impl ViewportFollow {
    pub fn new() -> (Self, ScrollTicket) {
        let epoch = Arc::new(AtomicU64::new(0));
        (
            Self {
                epoch: epoch.clone(),
            },
            ScrollTicket { epoch },
        )
    }
}

impl TimelineObserver for ViewportFollow {
    fn message_appended(&mut self, _message: &Message) {
        self.epoch.fetch_add(1, Ordering::Relaxed);
    }
}

impl ScrollTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Relaxed)
    }
}
