use gpui::{Bounds, Pixels, point};
use gpui_component::VirtualListScrollHandle;

/// Keeps the transcript pinned to its newest message.
///
/// The session bumps a scroll epoch on every timeline append; each new epoch
/// schedules one scroll to the end of the list on the next render.
pub struct ScrollManager {
    scroll_handle: VirtualListScrollHandle,
    pending_scroll_to_bottom: bool,
    last_epoch: u64,
}

impl ScrollManager {
    pub fn new() -> Self {
        Self {
            scroll_handle: VirtualListScrollHandle::new(),
            pending_scroll_to_bottom: false,
            last_epoch: 0,
        }
    }

    pub fn handle(&self) -> &VirtualListScrollHandle {
        &self.scroll_handle
    }

    /// Records the latest scroll epoch. Returns true when it differs from the last one seen.
    pub fn observe_epoch(&mut self, epoch: u64) -> bool {
        if epoch == self.last_epoch {
            return false;
        }

        self.last_epoch = epoch;
        self.pending_scroll_to_bottom = true;
        true
    }

    pub fn has_pending_scroll(&self) -> bool {
        self.pending_scroll_to_bottom
    }

    /// Forgets the previous session's epoch; a fresh session starts counting from zero.
    pub fn reset(&mut self) {
        self.last_epoch = 0;
        self.pending_scroll_to_bottom = true;
    }

    pub fn apply_pending_scroll(&mut self) -> bool {
        if !self.pending_scroll_to_bottom {
            return false;
        }

        let max_offset = self.scroll_handle.max_offset().height;
        let current_x = self.scroll_handle.offset().x;
        // GPUI uses negative Y offsets for scrolling down.
        let target_y = if max_offset > Pixels::ZERO {
            -max_offset
        } else {
            Pixels::ZERO
        };
        self.scroll_handle.set_offset(point(current_x, target_y));

        self.pending_scroll_to_bottom = false;
        true
    }

    pub fn bounds(&self) -> Bounds<Pixels> {
        self.scroll_handle.bounds()
    }
}

impl Default for ScrollManager {
    fn default() -> Self {
        Self::new()
    }
}
