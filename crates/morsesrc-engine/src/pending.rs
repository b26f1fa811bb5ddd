/// Single-slot mailbox for a text that has been requested but not yet
/// applied by the render side.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingText {
    text: Option<String>,
}

impl PendingText {
    /// Store `text`, replacing any value not yet taken. Empty text is
    /// ignored; returns whether the request was accepted.
    pub fn request(&mut self, text: &str) -> bool {
        if text.is_empty() {
            tracing::warn!("empty text provided, ignoring");
            return false;
        }
        if let Some(previous) = self.text.replace(text.to_string()) {
            tracing::debug!(%previous, "replacing unapplied text");
        }
        true
    }

    /// Take the pending value, leaving the slot empty.
    pub fn take(&mut self) -> Option<String> {
        self.text.take()
    }
}
