//! ---
//! sw_section: "02-deployment-engine"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Collaborator traits for the remote backend and artifact storage."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
use async_trait::async_trait;
use stackway_common::stack::{Stack, StackDescription};

use crate::stack::EnvironmentInput;

/// Remote provisioning backend consumed by the deployment engine.
///
/// Implementations wrap the provider SDK. Errors are opaque at this seam;
/// the engine adds stack and operation context where the contract requires
/// it and otherwise propagates them unchanged.
#[async_trait]
pub trait StackEngine: Send + Sync {
    /// Return a snapshot of the named stack.
    async fn describe(&self, stack_name: &str) -> anyhow::Result<StackDescription>;

    /// Propose creation of a new stack, returning a change-set identifier.
    async fn create(&self, stack: &Stack) -> anyhow::Result<String>;

    /// Propose an update to an existing stack, returning a change-set
    /// identifier.
    async fn update(&self, stack: &Stack) -> anyhow::Result<String>;

    /// Update an existing stack and block until the operation finishes.
    async fn update_and_wait(&self, stack: &Stack) -> anyhow::Result<()>;

    /// Delete the named stack using the supplied execution role and block
    /// until deletion completes or fails remotely.
    async fn delete_and_wait_with_role(
        &self,
        stack_name: &str,
        role_arn: &str,
    ) -> anyhow::Result<()>;

    /// Best-effort wait for an in-flight operation on the named stack to
    /// finish. May itself fail; callers re-describe to establish ground
    /// truth.
    async fn wait_for_update(&self, stack_name: &str) -> anyhow::Result<()>;

    /// Return the deployed template body of the named stack.
    async fn template_body(&self, stack_name: &str) -> anyhow::Result<String>;
}

/// Blob storage collaborator receiving rendered template bodies.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Upload `body` under `key` in the bucket named by `bucket`, returning
    /// a retrievable URL. Retry policy, if any, belongs to the
    /// implementation.
    async fn upload(&self, bucket: &str, key: &str, body: &str) -> anyhow::Result<String>;
}

/// Template rendering collaborator producing environment stack bodies.
pub trait TemplateSource: Send + Sync {
    /// Render the minimal bootstrap template used for first-time environment
    /// creation.
    fn bootstrap_template(&self, input: &EnvironmentInput) -> anyhow::Result<String>;

    /// Render the full environment template used for updates.
    fn environment_template(&self, input: &EnvironmentInput) -> anyhow::Result<String>;
}
