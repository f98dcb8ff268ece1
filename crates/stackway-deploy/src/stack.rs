//! ---
//! sw_section: "02-deployment-engine"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Stack configuration variants and the uploaded-stack builder."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stackway_common::arn::ResourceName;
use stackway_common::stack::{Parameter, Stack};

use crate::backend::{ArtifactStore, TemplateSource};
use crate::{DeployError, Result};

/// Parameter key carrying the owning application name.
pub const APP_NAME_PARAM: &str = "AppName";
/// Parameter key carrying the environment name.
pub const ENV_NAME_PARAM: &str = "EnvironmentName";

const APP_TAG: &str = "stackway-application";
const ENV_TAG: &str = "stackway-environment";

/// Canonical stack name for an environment of an application.
pub fn stack_name(app_name: &str, env_name: &str) -> String {
    format!("{app_name}-{env_name}")
}

/// Caller-supplied input describing the environment to deploy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentInput {
    /// Owning application name.
    pub app_name: String,
    /// Environment name, unique within the application.
    pub env_name: String,
    /// Resource name of the artifact bucket receiving the rendered template.
    pub artifact_bucket: String,
    /// Desired values for feature parameters, keyed by parameter key.
    #[serde(default)]
    pub features: BTreeMap<String, String>,
    /// Additional tags applied on top of the canonical application and
    /// environment tags.
    #[serde(default)]
    pub custom_tags: BTreeMap<String, String>,
}

/// Mutation applied to a built stack before submission, such as attaching an
/// execution role or extra tags.
pub type StackOption = Box<dyn FnOnce(&mut Stack) + Send>;

/// Stack option attaching an execution role.
pub fn with_role_arn(role_arn: impl Into<String>) -> StackOption {
    let role_arn = role_arn.into();
    Box::new(move |stack: &mut Stack| {
        stack.role_arn = Some(role_arn);
    })
}

/// Stack option merging extra tags into the built stack. Existing keys are
/// overwritten.
pub fn with_extra_tags(tags: BTreeMap<String, String>) -> StackOption {
    Box::new(move |stack: &mut Stack| {
        stack.tags.extend(tags);
    })
}

/// A source of deployable stack settings: canonical name, rendered template,
/// initial parameters, and tags.
pub trait StackConfig: Send + Sync {
    /// Canonical stack name.
    fn stack_name(&self) -> String;
    /// Rendered template body.
    fn template(&self) -> anyhow::Result<String>;
    /// Initial template parameters.
    fn parameters(&self) -> Vec<Parameter>;
    /// Tags applied to the stack.
    fn tags(&self) -> BTreeMap<String, String>;
}

fn base_parameters(input: &EnvironmentInput) -> Vec<Parameter> {
    vec![
        Parameter::new(APP_NAME_PARAM, &input.app_name),
        Parameter::new(ENV_NAME_PARAM, &input.env_name),
    ]
}

fn base_tags(input: &EnvironmentInput) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    tags.insert(APP_TAG.to_owned(), input.app_name.clone());
    tags.insert(ENV_TAG.to_owned(), input.env_name.clone());
    tags.extend(input.custom_tags.clone());
    tags
}

/// Minimal stack configuration used for first-time environment creation and
/// for delete targeting.
pub struct BootstrapEnvConfig<'a> {
    input: &'a EnvironmentInput,
    templates: &'a dyn TemplateSource,
}

impl<'a> BootstrapEnvConfig<'a> {
    /// Wrap the deployment input in its bootstrap configuration.
    pub fn new(input: &'a EnvironmentInput, templates: &'a dyn TemplateSource) -> Self {
        Self { input, templates }
    }
}

impl StackConfig for BootstrapEnvConfig<'_> {
    fn stack_name(&self) -> String {
        stack_name(&self.input.app_name, &self.input.env_name)
    }

    fn template(&self) -> anyhow::Result<String> {
        self.templates.bootstrap_template(self.input)
    }

    fn parameters(&self) -> Vec<Parameter> {
        base_parameters(self.input)
    }

    fn tags(&self) -> BTreeMap<String, String> {
        base_tags(self.input)
    }
}

/// Full environment stack configuration used for updates, including feature
/// parameters.
pub struct EnvConfig<'a> {
    input: &'a EnvironmentInput,
    templates: &'a dyn TemplateSource,
}

impl<'a> EnvConfig<'a> {
    /// Wrap the deployment input in its full configuration.
    pub fn new(input: &'a EnvironmentInput, templates: &'a dyn TemplateSource) -> Self {
        Self { input, templates }
    }
}

impl StackConfig for EnvConfig<'_> {
    fn stack_name(&self) -> String {
        stack_name(&self.input.app_name, &self.input.env_name)
    }

    fn template(&self) -> anyhow::Result<String> {
        self.templates.environment_template(self.input)
    }

    fn parameters(&self) -> Vec<Parameter> {
        let mut parameters = base_parameters(self.input);
        for (key, value) in &self.input.features {
            parameters.push(Parameter::new(key, value));
        }
        parameters
    }

    fn tags(&self) -> BTreeMap<String, String> {
        base_tags(self.input)
    }
}

/// Assemble a deployable stack: resolve the artifact bucket reference, upload
/// the rendered template, and construct the definition with the
/// configuration's name, parameters, and tags. No execution role is set;
/// deployment options attach one later.
pub(crate) async fn uploaded_stack(
    artifacts: &dyn ArtifactStore,
    artifact_bucket: &str,
    config: &dyn StackConfig,
) -> Result<Stack> {
    let bucket: ResourceName =
        artifact_bucket
            .parse()
            .map_err(|source| DeployError::InvalidReference {
                reference: artifact_bucket.to_owned(),
                source,
            })?;
    let name = config.stack_name();
    let body = config.template().map_err(|source| DeployError::Template {
        stack: name.clone(),
        source,
    })?;
    let key = format!("templates/{name}.yml");
    let url = artifacts
        .upload(&bucket.resource, &key, &body)
        .await
        .map_err(DeployError::Upload)?;
    Ok(Stack::with_template_url(name, url)
        .parameters(config.parameters())
        .tags(config.tags()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{InMemoryArtifactStore, StaticTemplates};

    fn input() -> EnvironmentInput {
        EnvironmentInput {
            app_name: "demo".into(),
            env_name: "test".into(),
            artifact_bucket: "arn:aws:s3:::demo-artifacts".into(),
            features: BTreeMap::from([("LoadBalancedWorkloads".into(), "api,web".into())]),
            custom_tags: BTreeMap::from([("team".into(), "platform".into())]),
        }
    }

    #[tokio::test]
    async fn builds_stack_from_uploaded_template() {
        let input = input();
        let templates = StaticTemplates::new("bootstrap: {}", "environment: {}");
        let artifacts = InMemoryArtifactStore::default();
        let config = EnvConfig::new(&input, &templates);

        let stack = uploaded_stack(&artifacts, &input.artifact_bucket, &config)
            .await
            .expect("builds");

        assert_eq!(stack.name, "demo-test");
        let uploads = artifacts.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].bucket, "demo-artifacts");
        assert_eq!(uploads[0].key, "templates/demo-test.yml");
        assert_eq!(uploads[0].body, "environment: {}");
        assert_eq!(stack.template_url.as_deref(), Some(uploads[0].url.as_str()));
        assert!(stack.role_arn.is_none());
        assert_eq!(stack.tags.get("stackway-application").unwrap(), "demo");
        assert_eq!(stack.tags.get("team").unwrap(), "platform");
    }

    #[test]
    fn full_config_includes_feature_parameters() {
        let input = input();
        let templates = StaticTemplates::new("b", "e");
        let config = EnvConfig::new(&input, &templates);

        let parameters = config.parameters();

        assert_eq!(
            parameters,
            vec![
                Parameter::new(APP_NAME_PARAM, "demo"),
                Parameter::new(ENV_NAME_PARAM, "test"),
                Parameter::new("LoadBalancedWorkloads", "api,web"),
            ]
        );
    }

    #[test]
    fn bootstrap_config_carries_minimal_parameters() {
        let input = input();
        let templates = StaticTemplates::new("b", "e");
        let config = BootstrapEnvConfig::new(&input, &templates);

        assert_eq!(config.stack_name(), "demo-test");
        assert_eq!(config.template().unwrap(), "b");
        assert_eq!(config.parameters().len(), 2);
    }

    #[tokio::test]
    async fn malformed_bucket_reference_fails_without_uploading() {
        let input = input();
        let templates = StaticTemplates::new("b", "e");
        let artifacts = InMemoryArtifactStore::default();
        let config = BootstrapEnvConfig::new(&input, &templates);

        let err = uploaded_stack(&artifacts, "not-a-reference", &config)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::InvalidReference { .. }));
        assert!(artifacts.uploads().is_empty());
    }

    #[tokio::test]
    async fn upload_failure_propagates() {
        let input = input();
        let templates = StaticTemplates::new("b", "e");
        let artifacts = InMemoryArtifactStore::default();
        artifacts.fail_uploads("bucket unavailable");
        let config = BootstrapEnvConfig::new(&input, &templates);

        let err = uploaded_stack(&artifacts, &input.artifact_bucket, &config)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Upload(_)));
    }

    #[test]
    fn stack_options_mutate_built_stack() {
        let mut stack = Stack::new("demo-test", "body");
        with_role_arn("arn:aws:iam::1:role/exec")(&mut stack);
        with_extra_tags(BTreeMap::from([("env".into(), "test".into())]))(&mut stack);

        assert_eq!(stack.role_arn.as_deref(), Some("arn:aws:iam::1:role/exec"));
        assert_eq!(stack.tags.get("env").unwrap(), "test");
    }
}
