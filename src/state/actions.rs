//! Action types for MVU/Reducer pattern.
//!
//! All state mutations are triggered via `App::update(action)` so that
//! transitions are explicit and testable without a terminal.

use crate::state::AppTab;

/// Actions that can modify application state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ===== Tab Navigation =====
    /// Move to the next tab.
    TabNext,
    /// Move to the previous tab.
    TabPrev,
    /// Set the current tab directly.
    TabSet(AppTab),

    // ===== Request Tab =====
    /// Move focus to the next form field.
    FocusNext,
    /// Move focus to the previous form field.
    FocusPrev,
    /// Select the next command preset and load its template.
    CommandNext,
    /// Select the previous command preset and load its template.
    CommandPrev,
    /// Reload the current command's template into the editor.
    TemplateReset,
    /// Validate, frame and send the request.
    Send,

    // ===== Response Tab =====
    ResponseScrollUp,
    ResponseScrollDown,
    ResponsePageUp,
    ResponsePageDown,
    ResponseScrollTop,

    // ===== History Tab =====
    HistorySelectNext,
    HistorySelectPrev,
    /// Load the selected record back into the form and response view.
    HistoryLoad,

    // ===== General =====
    /// Clear the current error message.
    ErrorClear,
    /// Quit the application.
    Quit,
}
