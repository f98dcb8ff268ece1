//! ---
//! sw_section: "02-deployment-engine"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Progress sink for streaming deployment status."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
use tracing::info;

/// A deployment progress notification. Fire-and-forget relative to core
/// correctness; renderers must not influence the deployment outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent<'a> {
    /// A change set is being proposed for the named stack.
    Proposing {
        /// Target stack name.
        stack: &'a str,
        /// Human-readable label for the operation.
        description: &'a str,
    },
    /// The remote backend accepted the proposal and returned a change set.
    ChangeSetCreated {
        /// Target stack name.
        stack: &'a str,
        /// Opaque change-set identifier.
        change_set_id: &'a str,
    },
}

/// Receives progress events during a deployment attempt.
pub trait ProgressSink: Send + Sync {
    /// Publish one event. Implementations render spinners, write to a
    /// terminal, or log; failures stay internal to the sink.
    fn publish(&self, event: ProgressEvent<'_>);
}

/// Default sink reporting progress through the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn publish(&self, event: ProgressEvent<'_>) {
        match event {
            ProgressEvent::Proposing { stack, description } => {
                info!(stack = %stack, "{description}");
            }
            ProgressEvent::ChangeSetCreated {
                stack,
                change_set_id,
            } => {
                info!(stack = %stack, change_set = %change_set_id, "change set created");
            }
        }
    }
}

/// Sink discarding every event, for tests.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn publish(&self, _event: ProgressEvent<'_>) {}
}
