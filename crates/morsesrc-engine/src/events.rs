use crossbeam_channel::Sender;

/// Notifications the engine posts to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// More than 90% of the active plan has been rendered.
    AboutToFinish,
    /// A one-shot plan has been fully rendered.
    PlaybackComplete,
    /// Ask the host to move the engine to its ready state. Posted after
    /// `PlaybackComplete`; the host must act on it outside of `produce_chunk`.
    RequestReady,
    /// A new text replaced the plan while the host was playing; timestamps
    /// restart at zero.
    NewSegment,
    /// The active plan changed, and with it the stream duration.
    DurationChanged,
}

/// Host side of the notification path.
pub trait HostNotifier: Send + Sync {
    fn notify(&self, event: EngineEvent);
}

impl HostNotifier for Sender<EngineEvent> {
    fn notify(&self, event: EngineEvent) {
        if self.send(event).is_err() {
            tracing::debug!(?event, "host notification channel closed");
        }
    }
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl HostNotifier for NullNotifier {
    fn notify(&self, _event: EngineEvent) {}
}
