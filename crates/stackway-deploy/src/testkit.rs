//! ---
//! sw_section: "02-deployment-engine"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "In-memory backend doubles for tests and single-process integration."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
//! In-memory implementations of the collaborator traits, primarily for tests
//! and single-process integration. Describe responses are scripted; every
//! submitted request is recorded for later inspection.

use std::collections::{HashMap, VecDeque};

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use stackway_common::stack::{Parameter, Stack, StackDescription, StackStatus};

use crate::backend::{ArtifactStore, StackEngine, TemplateSource};
use crate::stack::EnvironmentInput;

/// Build a description with the given status and no parameters.
pub fn described(status: StackStatus) -> StackDescription {
    described_with(status, Vec::new())
}

/// Build a description with the given status and deployed parameters.
pub fn described_with(status: StackStatus, parameters: Vec<Parameter>) -> StackDescription {
    StackDescription {
        status,
        parameters,
        tags: Default::default(),
        outputs: Default::default(),
    }
}

#[derive(Default)]
struct EngineInner {
    describe_script: VecDeque<Result<StackDescription, String>>,
    wait_calls: usize,
    wait_error: Option<String>,
    wait_forever: bool,
    submit_error: Option<String>,
    next_change_set: usize,
    created: Vec<Stack>,
    updated: Vec<Stack>,
    updated_and_waited: Vec<Stack>,
    deleted: Vec<(String, String)>,
    templates: HashMap<String, String>,
}

/// Scripted in-memory stack engine.
#[derive(Default)]
pub struct InMemoryStackEngine {
    inner: Mutex<EngineInner>,
}

impl InMemoryStackEngine {
    /// Queue a successful describe response.
    pub fn push_describe(&self, description: StackDescription) {
        self.inner.lock().describe_script.push_back(Ok(description));
    }

    /// Queue a failing describe response.
    pub fn push_describe_error(&self, message: impl Into<String>) {
        self.inner
            .lock()
            .describe_script
            .push_back(Err(message.into()));
    }

    /// Make every best-effort wait fail with the given message.
    pub fn fail_waits(&self, message: impl Into<String>) {
        self.inner.lock().wait_error = Some(message.into());
    }

    /// Make every best-effort wait pend forever, for cancellation tests.
    pub fn set_wait_forever(&self, wait_forever: bool) {
        self.inner.lock().wait_forever = wait_forever;
    }

    /// Make create/update/delete submissions fail with the given message.
    pub fn fail_submissions(&self, message: impl Into<String>) {
        self.inner.lock().submit_error = Some(message.into());
    }

    /// Register a deployed template body for `template_body` lookups.
    pub fn set_template_body(&self, stack_name: impl Into<String>, body: impl Into<String>) {
        self.inner
            .lock()
            .templates
            .insert(stack_name.into(), body.into());
    }

    /// Number of best-effort waits performed so far.
    pub fn wait_calls(&self) -> usize {
        self.inner.lock().wait_calls
    }

    /// Stacks submitted through `create`.
    pub fn created(&self) -> Vec<Stack> {
        self.inner.lock().created.clone()
    }

    /// Stacks submitted through `update`.
    pub fn updated(&self) -> Vec<Stack> {
        self.inner.lock().updated.clone()
    }

    /// Stacks submitted through `update_and_wait`.
    pub fn updated_and_waited(&self) -> Vec<Stack> {
        self.inner.lock().updated_and_waited.clone()
    }

    /// `(stack_name, role_arn)` pairs submitted through
    /// `delete_and_wait_with_role`.
    pub fn deleted(&self) -> Vec<(String, String)> {
        self.inner.lock().deleted.clone()
    }

    fn submit(&self, record: impl FnOnce(&mut EngineInner)) -> anyhow::Result<String> {
        let mut inner = self.inner.lock();
        if let Some(message) = &inner.submit_error {
            return Err(anyhow!("{message}"));
        }
        inner.next_change_set += 1;
        let id = format!("changeset-{}", inner.next_change_set);
        record(&mut inner);
        Ok(id)
    }
}

#[async_trait]
impl StackEngine for InMemoryStackEngine {
    async fn describe(&self, stack_name: &str) -> anyhow::Result<StackDescription> {
        match self.inner.lock().describe_script.pop_front() {
            Some(Ok(description)) => Ok(description),
            Some(Err(message)) => Err(anyhow!("{message}")),
            None => Err(anyhow!("no describe response scripted for {stack_name}")),
        }
    }

    async fn create(&self, stack: &Stack) -> anyhow::Result<String> {
        let stack = stack.clone();
        self.submit(move |inner| inner.created.push(stack))
    }

    async fn update(&self, stack: &Stack) -> anyhow::Result<String> {
        let stack = stack.clone();
        self.submit(move |inner| inner.updated.push(stack))
    }

    async fn update_and_wait(&self, stack: &Stack) -> anyhow::Result<()> {
        let stack = stack.clone();
        self.submit(move |inner| inner.updated_and_waited.push(stack))
            .map(|_| ())
    }

    async fn delete_and_wait_with_role(
        &self,
        stack_name: &str,
        role_arn: &str,
    ) -> anyhow::Result<()> {
        let record = (stack_name.to_owned(), role_arn.to_owned());
        self.submit(move |inner| inner.deleted.push(record))
            .map(|_| ())
    }

    async fn wait_for_update(&self, _stack_name: &str) -> anyhow::Result<()> {
        let (wait_forever, wait_error) = {
            let mut inner = self.inner.lock();
            if inner.wait_forever {
                (true, None)
            } else {
                inner.wait_calls += 1;
                (false, inner.wait_error.clone())
            }
        };
        if wait_forever {
            std::future::pending::<()>().await;
        }
        match wait_error {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }

    async fn template_body(&self, stack_name: &str) -> anyhow::Result<String> {
        self.inner
            .lock()
            .templates
            .get(stack_name)
            .cloned()
            .ok_or_else(|| anyhow!("no template registered for {stack_name}"))
    }
}

/// One artifact recorded by [`InMemoryArtifactStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedArtifact {
    /// Bucket resource path the artifact was uploaded to.
    pub bucket: String,
    /// Object key within the bucket.
    pub key: String,
    /// Uploaded content.
    pub body: String,
    /// URL returned to the uploader.
    pub url: String,
}

#[derive(Default)]
struct StoreInner {
    uploads: Vec<UploadedArtifact>,
    upload_error: Option<String>,
}

/// In-memory artifact store recording every upload.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryArtifactStore {
    /// Make every upload fail with the given message.
    pub fn fail_uploads(&self, message: impl Into<String>) {
        self.inner.lock().upload_error = Some(message.into());
    }

    /// Artifacts uploaded so far.
    pub fn uploads(&self) -> Vec<UploadedArtifact> {
        self.inner.lock().uploads.clone()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn upload(&self, bucket: &str, key: &str, body: &str) -> anyhow::Result<String> {
        let mut inner = self.inner.lock();
        if let Some(message) = &inner.upload_error {
            return Err(anyhow!("{message}"));
        }
        let url = format!("https://{bucket}.artifacts.invalid/{key}");
        inner.uploads.push(UploadedArtifact {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            body: body.to_owned(),
            url: url.clone(),
        });
        Ok(url)
    }
}

/// Template source returning fixed bodies for both variants.
#[derive(Debug, Clone)]
pub struct StaticTemplates {
    bootstrap: String,
    environment: String,
}

impl StaticTemplates {
    /// Fixed bootstrap and environment template bodies.
    pub fn new(bootstrap: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            bootstrap: bootstrap.into(),
            environment: environment.into(),
        }
    }
}

impl TemplateSource for StaticTemplates {
    fn bootstrap_template(&self, _input: &EnvironmentInput) -> anyhow::Result<String> {
        Ok(self.bootstrap.clone())
    }

    fn environment_template(&self, _input: &EnvironmentInput) -> anyhow::Result<String> {
        Ok(self.environment.clone())
    }
}
