//! Queue event publication
//!
//! Events are notifications about registry transitions that already
//! happened; publishing never feeds back into queue state.

pub mod publisher;

pub use publisher::{
    BroadcastEventPublisher, EventPublisher, LogEventPublisher, DEFAULT_EVENT_BUFFER,
};

#[cfg(test)]
pub use publisher::RecordingEventPublisher;
