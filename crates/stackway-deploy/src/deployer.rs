//! ---
//! sw_section: "02-deployment-engine"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Top-level deployment orchestrator for environment stacks."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::sync::Arc;

use stackway_common::stack::{Parameter, Stack};
use tokio::sync::broadcast;
use tracing::info;

use crate::backend::{ArtifactStore, StackEngine, TemplateSource};
use crate::params::{reconcile, ControllerManagedKeys};
use crate::progress::{ProgressEvent, ProgressSink, TracingProgress};
use crate::settle::settle;
use crate::stack::{
    stack_name, uploaded_stack, BootstrapEnvConfig, EnvConfig, EnvironmentInput, StackOption,
};
use crate::{DeployError, Result};

/// Environment metadata recovered from the remote stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Owning application name.
    pub app_name: String,
    /// Environment name.
    pub env_name: String,
    /// Outputs exported by the environment stack.
    pub outputs: BTreeMap<String, String>,
}

/// Cancels an in-flight settlement wait. Cloneable; safe to trigger from a
/// signal handler task.
#[derive(Debug, Clone)]
pub struct DeployCanceller {
    cancel: broadcast::Sender<()>,
}

impl DeployCanceller {
    /// Abort any settlement wait currently in progress. Requests already
    /// submitted to the remote backend are unaffected.
    pub fn cancel(&self) {
        let _ = self.cancel.send(());
    }
}

enum Submission {
    Create,
    Update,
}

/// Orchestrates environment stack deployments against the remote backend.
///
/// One logical deployment executes per call; the settlement wait is the sole
/// suspension point and honours cooperative cancellation through
/// [`DeployCanceller`]. No locking is performed between concurrent callers
/// targeting the same stack; ordering is arbitrated entirely by the remote
/// backend. A race window between settlement and submission is an accepted
/// limitation.
pub struct Deployer {
    engine: Arc<dyn StackEngine>,
    artifacts: Arc<dyn ArtifactStore>,
    templates: Arc<dyn TemplateSource>,
    controller_managed: ControllerManagedKeys,
    progress: Arc<dyn ProgressSink>,
    cancel: broadcast::Sender<()>,
}

impl Deployer {
    /// Construct a deployer over the given collaborators.
    /// `controller_managed` names the parameter keys owned by the running
    /// environment controller; their deployed values survive updates.
    pub fn new(
        engine: Arc<dyn StackEngine>,
        artifacts: Arc<dyn ArtifactStore>,
        templates: Arc<dyn TemplateSource>,
        controller_managed: ControllerManagedKeys,
    ) -> Self {
        let (cancel, _) = broadcast::channel(4);
        Self {
            engine,
            artifacts,
            templates,
            controller_managed,
            progress: Arc::new(TracingProgress),
            cancel,
        }
    }

    /// Replace the progress sink.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Handle that aborts in-flight settlement waits.
    pub fn canceller(&self) -> DeployCanceller {
        DeployCanceller {
            cancel: self.cancel.clone(),
        }
    }

    /// Create the environment stack for the first time, returning the
    /// change-set identifier. Uses the minimal bootstrap configuration; no
    /// settlement or reconciliation is needed because no prior deployed
    /// state exists.
    pub async fn create_environment(&self, input: &EnvironmentInput) -> Result<String> {
        let config = BootstrapEnvConfig::new(input, self.templates.as_ref());
        let stack =
            uploaded_stack(self.artifacts.as_ref(), &input.artifact_bucket, &config).await?;
        self.propose(&stack, Submission::Create).await
    }

    /// Update the environment stack, returning the change-set identifier.
    ///
    /// Builds the full configuration, applies the caller's stack options,
    /// waits for any in-flight remote operation to settle, reconciles
    /// parameters against the settled state under controller ownership, and
    /// submits the update. A describe or settlement failure aborts the whole
    /// operation; no partial update is attempted.
    pub async fn update_environment(
        &self,
        input: &EnvironmentInput,
        opts: Vec<StackOption>,
    ) -> Result<String> {
        let config = EnvConfig::new(input, self.templates.as_ref());
        let mut stack =
            uploaded_stack(self.artifacts.as_ref(), &input.artifact_bucket, &config).await?;
        for opt in opts {
            opt(&mut stack);
        }

        let description = settle(self.engine.as_ref(), &stack.name, self.cancel.subscribe()).await?;
        stack.parameters = reconcile(
            &stack.parameters,
            &description.parameters,
            &self.controller_managed,
        );

        self.propose(&stack, Submission::Update).await
    }

    /// Delete the environment stack using the supplied execution role,
    /// blocking until deletion completes or fails remotely. Targets the
    /// canonical bootstrap stack name.
    pub async fn delete_environment(
        &self,
        app_name: &str,
        env_name: &str,
        execution_role_arn: &str,
    ) -> Result<()> {
        let name = stack_name(app_name, env_name);
        self.engine
            .delete_and_wait_with_role(&name, execution_role_arn)
            .await
            .map_err(DeployError::Submit)?;
        info!(stack = %name, "environment stack deleted");
        Ok(())
    }

    /// Return environment metadata from the deployed bootstrap stack.
    pub async fn environment(&self, app_name: &str, env_name: &str) -> Result<Environment> {
        let name = stack_name(app_name, env_name);
        let description = self.describe(&name).await?;
        Ok(Environment {
            app_name: app_name.to_owned(),
            env_name: env_name.to_owned(),
            outputs: description.outputs,
        })
    }

    /// Return the environment stack's deployed template body.
    pub async fn environment_template(&self, app_name: &str, env_name: &str) -> Result<String> {
        let name = stack_name(app_name, env_name);
        self.engine
            .template_body(&name)
            .await
            .map_err(|source| DeployError::Describe {
                stack: name,
                source,
            })
    }

    /// Return the environment stack's deployed parameters.
    pub async fn environment_parameters(
        &self,
        app_name: &str,
        env_name: &str,
    ) -> Result<Vec<Parameter>> {
        let name = stack_name(app_name, env_name);
        Ok(self.describe(&name).await?.parameters)
    }

    /// Replace the environment stack's template body while keeping its
    /// deployed parameters and tags, then block until the update finishes.
    pub async fn update_environment_template(
        &self,
        app_name: &str,
        env_name: &str,
        template_body: &str,
        execution_role_arn: &str,
    ) -> Result<()> {
        let name = stack_name(app_name, env_name);
        let description = self.describe(&name).await?;
        let mut stack = Stack::new(name, template_body)
            .parameters(description.parameters)
            .tags(description.tags);
        stack.role_arn = Some(execution_role_arn.to_owned());
        self.engine
            .update_and_wait(&stack)
            .await
            .map_err(DeployError::Submit)
    }

    async fn describe(
        &self,
        name: &str,
    ) -> Result<stackway_common::stack::StackDescription> {
        self.engine
            .describe(name)
            .await
            .map_err(|source| DeployError::Describe {
                stack: name.to_owned(),
                source,
            })
    }

    async fn propose(&self, stack: &Stack, submission: Submission) -> Result<String> {
        let label = format!(
            "Proposing infrastructure changes for the {} environment.",
            stack.name
        );
        self.progress.publish(ProgressEvent::Proposing {
            stack: &stack.name,
            description: &label,
        });
        let outcome = match submission {
            Submission::Create => self.engine.create(stack).await,
            Submission::Update => self.engine.update(stack).await,
        };
        let change_set_id = outcome.map_err(DeployError::Submit)?;
        self.progress.publish(ProgressEvent::ChangeSetCreated {
            stack: &stack.name,
            change_set_id: &change_set_id,
        });
        info!(stack = %stack.name, change_set = %change_set_id, "change set submitted");
        Ok(change_set_id)
    }
}

#[cfg(test)]
mod tests {
    use stackway_common::stack::StackStatus;

    use super::*;
    use crate::stack::{with_role_arn, APP_NAME_PARAM, ENV_NAME_PARAM};
    use crate::testkit::{
        described, described_with, InMemoryArtifactStore, InMemoryStackEngine, StaticTemplates,
    };
    use crate::NullProgress;

    struct Harness {
        engine: Arc<InMemoryStackEngine>,
        artifacts: Arc<InMemoryArtifactStore>,
        deployer: Deployer,
    }

    fn harness(controller_managed: ControllerManagedKeys) -> Harness {
        let engine = Arc::new(InMemoryStackEngine::default());
        let artifacts = Arc::new(InMemoryArtifactStore::default());
        let templates = Arc::new(StaticTemplates::new("bootstrap: {}", "environment: {}"));
        let deployer = Deployer::new(
            engine.clone(),
            artifacts.clone(),
            templates,
            controller_managed,
        )
        .with_progress(Arc::new(NullProgress));
        Harness {
            engine,
            artifacts,
            deployer,
        }
    }

    fn input() -> EnvironmentInput {
        EnvironmentInput {
            app_name: "demo".into(),
            env_name: "test".into(),
            artifact_bucket: "arn:aws:s3:::demo-artifacts".into(),
            features: BTreeMap::from([("Feature".into(), "on".into())]),
            custom_tags: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn create_uploads_bootstrap_template_and_submits() {
        let h = harness(ControllerManagedKeys::default());

        let change_set = h
            .deployer
            .create_environment(&input())
            .await
            .expect("create succeeds");

        assert_eq!(change_set, "changeset-1");
        let uploads = h.artifacts.uploads();
        assert_eq!(uploads[0].body, "bootstrap: {}");
        let created = h.engine.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "demo-test");
        assert_eq!(
            created[0].parameters,
            vec![
                Parameter::new(APP_NAME_PARAM, "demo"),
                Parameter::new(ENV_NAME_PARAM, "test"),
            ]
        );
    }

    #[tokio::test]
    async fn update_settles_then_reconciles_controller_managed_parameters() {
        let h = harness(ControllerManagedKeys::new(["Feature"]));
        h.engine.push_describe(described(StackStatus::UpdateInProgress));
        h.engine.push_describe(described_with(
            StackStatus::UpdateComplete,
            vec![
                Parameter::new(APP_NAME_PARAM, "demo"),
                Parameter::new(ENV_NAME_PARAM, "test"),
                Parameter::new("Feature", "off"),
                Parameter::new("Legacy", "x"),
            ],
        ));

        let change_set = h
            .deployer
            .update_environment(&input(), vec![with_role_arn("arn:aws:iam::1:role/exec")])
            .await
            .expect("update succeeds");

        assert_eq!(change_set, "changeset-1");
        assert_eq!(h.engine.wait_calls(), 1);
        let updated = h.engine.updated();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].role_arn.as_deref(), Some("arn:aws:iam::1:role/exec"));
        assert_eq!(
            updated[0].parameters,
            vec![
                Parameter::new(APP_NAME_PARAM, "demo"),
                Parameter::new(ENV_NAME_PARAM, "test"),
                Parameter::previous("Feature"),
            ]
        );
        assert_eq!(h.artifacts.uploads()[0].body, "environment: {}");
    }

    #[tokio::test]
    async fn update_aborts_when_describe_fails() {
        let h = harness(ControllerManagedKeys::default());
        h.engine.push_describe_error("backend unreachable");

        let err = h
            .deployer
            .update_environment(&input(), Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Describe { .. }));
        assert!(h.engine.updated().is_empty());
    }

    #[tokio::test]
    async fn submission_rejection_propagates() {
        let h = harness(ControllerManagedKeys::default());
        h.engine.fail_submissions("no changes");

        let err = h.deployer.create_environment(&input()).await.unwrap_err();

        assert!(matches!(err, DeployError::Submit(_)));
    }

    #[tokio::test]
    async fn delete_targets_canonical_bootstrap_stack_name() {
        let h = harness(ControllerManagedKeys::default());

        h.deployer
            .delete_environment("demo", "test", "arn:aws:iam::1:role/exec")
            .await
            .expect("delete succeeds");

        assert_eq!(
            h.engine.deleted(),
            vec![("demo-test".to_owned(), "arn:aws:iam::1:role/exec".to_owned())]
        );
    }

    #[tokio::test]
    async fn environment_accessors_surface_remote_state() {
        let h = harness(ControllerManagedKeys::default());
        h.engine.set_template_body("demo-test", "deployed: {}");
        let mut description = described_with(
            StackStatus::CreateComplete,
            vec![Parameter::new(APP_NAME_PARAM, "demo")],
        );
        description
            .outputs
            .insert("EnabledFeatures".into(), "Feature".into());
        h.engine.push_describe(description);

        let environment = h
            .deployer
            .environment("demo", "test")
            .await
            .expect("environment");
        assert_eq!(environment.app_name, "demo");
        assert_eq!(environment.outputs.get("EnabledFeatures").unwrap(), "Feature");

        let body = h
            .deployer
            .environment_template("demo", "test")
            .await
            .expect("template body");
        assert_eq!(body, "deployed: {}");
    }

    #[tokio::test]
    async fn template_update_keeps_deployed_parameters_and_tags() {
        let h = harness(ControllerManagedKeys::default());
        let mut description = described_with(
            StackStatus::UpdateComplete,
            vec![Parameter::new("Feature", "on")],
        );
        description.tags.insert("team".into(), "platform".into());
        h.engine.push_describe(description);

        h.deployer
            .update_environment_template("demo", "test", "new: {}", "arn:aws:iam::1:role/exec")
            .await
            .expect("template update succeeds");

        let submitted = h.engine.updated_and_waited();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].template_body.as_deref(), Some("new: {}"));
        assert_eq!(submitted[0].parameters, vec![Parameter::new("Feature", "on")]);
        assert_eq!(submitted[0].tags.get("team").unwrap(), "platform");
        assert_eq!(
            submitted[0].role_arn.as_deref(),
            Some("arn:aws:iam::1:role/exec")
        );
    }
}
