//! Confirmation prompt — asks the user before a destructive command.

/// Yes/no question shown before deleting or cancelling something.
///
/// Any `Fn(&str) -> bool` is a prompt, which keeps tests and non-interactive
/// callers simple.
pub trait ConfirmationPrompt: Send + Sync {
    /// Return `true` when the user accepts `message`.
    fn confirm(&self, message: &str) -> bool;
}

impl<F> ConfirmationPrompt for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Prompt that accepts everything. Used by non-interactive callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmationPrompt for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}
