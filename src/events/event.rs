//! # Recorded events: one capability method call, frozen for replay.
//!
//! An [`Event`] is produced inside `Publisher::publish` and is the only
//! currency the dispatch machinery moves around: it lands in the sticky
//! cache (at most one per capability per node) and in in-flight delivery
//! jobs. It is immutable and cheap to clone (the invocation record sits
//! behind an `Arc`).
//!
//! Replay goes through an erased receiver handle. The handle's concrete
//! type is checked against the capability that recorded the event, so a
//! stored value is never trusted blindly at retrieval time — a mismatch
//! surfaces as [`BusError::CapabilityMismatch`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::BusError;
use crate::events::capability::{Capability, EventType, EventTypeId};

/// Immutable record of one capability method invocation.
///
/// Carries the erased capability identity plus the recorded invocation.
/// Replayable any number of times against any receiver implementing the
/// capability's listener trait.
#[derive(Clone)]
pub struct Event {
    event_type: EventTypeId,
    invocation: Arc<dyn ErasedInvocation>,
}

impl Event {
    /// Records one invocation of a method of capability `C`.
    pub fn record<C: Capability>(event_type: EventType<C>, invocation: C::Invocation) -> Self {
        Self {
            event_type: event_type.id(),
            invocation: Arc::new(Recorded::<C> { invocation }),
        }
    }

    /// Erased identity of the capability this event belongs to.
    pub fn event_type(&self) -> EventTypeId {
        self.event_type
    }

    /// Method identity of the recorded invocation.
    pub fn method(&self) -> &'static str {
        self.invocation.method()
    }

    /// Replays the recorded invocation against an erased receiver handle.
    ///
    /// The handle must contain an `Arc<C::Listener>` for the capability `C`
    /// that recorded this event.
    pub(crate) fn replay(&self, receiver: &(dyn Any + Send + Sync)) -> Result<(), BusError> {
        self.invocation.replay(receiver)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("capability", &self.event_type.name())
            .field("method", &self.invocation.method())
            .finish()
    }
}

/// Object-safe view of a typed invocation record.
trait ErasedInvocation: Send + Sync {
    fn method(&self) -> &'static str;
    fn replay(&self, receiver: &(dyn Any + Send + Sync)) -> Result<(), BusError>;
}

/// Typed invocation record for capability `C`.
struct Recorded<C: Capability> {
    invocation: C::Invocation,
}

impl<C: Capability> ErasedInvocation for Recorded<C> {
    fn method(&self) -> &'static str {
        C::method(&self.invocation)
    }

    fn replay(&self, receiver: &(dyn Any + Send + Sync)) -> Result<(), BusError> {
        let listener = receiver
            .downcast_ref::<Arc<C::Listener>>()
            .ok_or(BusError::CapabilityMismatch {
                capability: C::NAME,
                method: C::method(&self.invocation),
            })?;
        C::deliver(&self.invocation, listener.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::Arc;

    use crate::testing::{
        journal, lines, AuditListener, Probe, ProjectCall, ProjectEvents, PROJECT,
    };
    use crate::Event;

    #[test]
    fn test_replay_invokes_recorded_method_with_arguments() {
        let event = Event::record::<ProjectEvents>(PROJECT, ProjectCall::Saved("demo".into(), 7));
        let log = journal();
        let probe = Probe::listener("r1", &log);

        let erased: &(dyn Any + Send + Sync) = &probe;
        event.replay(erased).unwrap();
        event.replay(erased).unwrap();

        assert_eq!(lines(&log), vec!["r1:saved:demo:7", "r1:saved:demo:7"]);
    }

    #[test]
    fn test_replay_against_foreign_listener_is_a_typed_error() {
        struct Silent;
        impl AuditListener for Silent {
            fn note(&self, _line: &str) {}
        }

        let event = Event::record::<ProjectEvents>(PROJECT, ProjectCall::Opened("demo".into()));
        let audit: Arc<dyn AuditListener> = Arc::new(Silent);

        let erased: &(dyn Any + Send + Sync) = &audit;
        let err = event.replay(erased).unwrap_err();
        assert_eq!(err.as_label(), "capability_mismatch");
    }

    #[test]
    fn test_debug_names_capability_and_method() {
        let event = Event::record::<ProjectEvents>(PROJECT, ProjectCall::Opened("demo".into()));
        let debug = format!("{event:?}");
        assert!(debug.contains("project"));
        assert!(debug.contains("opened"));
        assert_eq!(event.method(), "opened");
        assert_eq!(event.event_type().name(), "project");
    }
}
