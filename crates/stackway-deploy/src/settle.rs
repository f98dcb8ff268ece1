//! ---
//! sw_section: "02-deployment-engine"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Settlement waiter blocking until no remote operation is in flight."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
use stackway_common::stack::StackDescription;
use tokio::sync::broadcast;
use tracing::debug;

use crate::backend::StackEngine;
use crate::{DeployError, Result};

/// States of the settlement wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettleState {
    /// Read the remote stack and decide whether it is settled.
    Describe,
    /// An operation is in flight; drain it before re-describing.
    Drain,
}

/// Block until the named stack has no mutating operation in flight and
/// return its description.
///
/// The wait has no iteration cap: the only exits are a failed describe, a
/// cancellation signal, or a settled status. A describe failure aborts
/// immediately because inability to read remote state is not recoverable by
/// waiting. An error from the backend's best-effort `wait_for_update` is
/// swallowed; the subsequent describe re-establishes ground truth.
pub async fn settle(
    engine: &dyn StackEngine,
    stack_name: &str,
    mut cancel: broadcast::Receiver<()>,
) -> Result<StackDescription> {
    let mut state = SettleState::Describe;
    loop {
        match state {
            SettleState::Describe => {
                let description =
                    engine
                        .describe(stack_name)
                        .await
                        .map_err(|source| DeployError::Describe {
                            stack: stack_name.to_owned(),
                            source,
                        })?;
                if !description.in_progress() {
                    return Ok(description);
                }
                debug!(stack = %stack_name, status = %description.status, "operation in flight; waiting for it to settle");
                state = SettleState::Drain;
            }
            SettleState::Drain => {
                tokio::select! {
                    _ = cancel.recv() => {
                        debug!(stack = %stack_name, "settlement wait cancelled");
                        return Err(DeployError::Cancelled {
                            stack: stack_name.to_owned(),
                        });
                    }
                    outcome = engine.wait_for_update(stack_name) => {
                        if let Err(err) = outcome {
                            debug!(stack = %stack_name, error = %err, "best-effort wait failed; re-describing");
                        }
                        state = SettleState::Describe;
                    }
                }
            }
        }
    }
}
