//! ---
//! sw_section: "02-deployment-engine"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Stack deployment reconciliation engine."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
//! Deployment engine reconciling desired environment stacks against a remote
//! provisioning backend. The engine settles any in-flight remote operation
//! before submitting its own, merges previously deployed parameters with the
//! newly desired set under a controller-ownership policy, and drives
//! create-versus-update lifecycle transitions while publishing progress.
#![warn(missing_docs)]

pub mod backend;
pub mod deployer;
pub mod params;
pub mod progress;
pub mod settle;
pub mod stack;
pub mod testkit;

use stackway_common::arn::ResourceNameError;

/// Shared result type for deployment operations.
pub type Result<T> = std::result::Result<T, DeployError>;

/// Errors surfaced by the deployment engine.
///
/// Upload and submission failures propagate the collaborator's error
/// unchanged; describe failures carry the stack name because inability to
/// read remote state is not recoverable by waiting.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The configured artifact bucket reference could not be parsed.
    #[error("parse artifact bucket reference {reference:?}: {source}")]
    InvalidReference {
        /// The offending reference as supplied by the caller.
        reference: String,
        /// Underlying parse failure.
        #[source]
        source: ResourceNameError,
    },
    /// Describing the remote stack failed.
    #[error("describe stack {stack}: {source}")]
    Describe {
        /// Target stack name.
        stack: String,
        /// Error reported by the remote backend.
        #[source]
        source: anyhow::Error,
    },
    /// Rendering the stack template failed.
    #[error("render template for stack {stack}: {source}")]
    Template {
        /// Target stack name.
        stack: String,
        /// Error reported by the template source.
        #[source]
        source: anyhow::Error,
    },
    /// Uploading the template body to the artifact store failed.
    #[error(transparent)]
    Upload(anyhow::Error),
    /// The remote backend rejected a create, update, or delete request.
    #[error(transparent)]
    Submit(anyhow::Error),
    /// The caller cancelled the deployment while waiting for an in-flight
    /// remote operation to settle.
    #[error("stack {stack}: wait for in-flight operation was cancelled")]
    Cancelled {
        /// Target stack name.
        stack: String,
    },
}

pub use backend::{ArtifactStore, StackEngine, TemplateSource};
pub use deployer::{DeployCanceller, Deployer, Environment};
pub use params::{reconcile, ControllerManagedKeys};
pub use progress::{NullProgress, ProgressEvent, ProgressSink, TracingProgress};
pub use stack::{stack_name, with_extra_tags, with_role_arn, EnvironmentInput, StackOption};
