//! Ordered focus handles for editable cells

use crate::models::RecordId;

/// One focusable cell, named by its record so it survives reordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusHandle {
    pub record_id: RecordId,
    pub column_key: String,
}

/// Moves input focus along an ordered list of handles
pub trait FocusController {
    /// Focusable cells in visiting order
    fn focus_handles(&self) -> Vec<FocusHandle>;

    /// Focus the handle at `index`. Returns false when there is no such handle.
    fn focus(&mut self, index: usize) -> bool;

    fn focus_next(&mut self, current: usize) -> bool {
        self.focus(current + 1)
    }

    /// Index of `handle` in [`FocusController::focus_handles`]
    fn handle_index(&self, handle: &FocusHandle) -> Option<usize> {
        self.focus_handles().iter().position(|h| h == handle)
    }
}
