//! ---
//! sw_section: "01-core-primitives"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Stack data model shared between the engine and its backends."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A single template parameter submitted alongside a stack.
///
/// When `use_previous_value` is set the remote backend retains whatever value
/// is currently deployed for `key` and `value` is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter key, unique within a stack.
    pub key: String,
    /// Explicit desired value. Ignored by the backend when
    /// `use_previous_value` is set.
    #[serde(default)]
    pub value: String,
    /// Instructs the backend to keep the currently deployed value.
    #[serde(default)]
    pub use_previous_value: bool,
}

impl Parameter {
    /// Construct a parameter carrying an explicit value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            use_previous_value: false,
        }
    }

    /// Construct a parameter that retains its previously deployed value.
    pub fn previous(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: String::new(),
            use_previous_value: true,
        }
    }
}

/// Remote lifecycle status of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum StackStatus {
    CreateInProgress,
    CreateComplete,
    CreateFailed,
    UpdateInProgress,
    UpdateCompleteCleanupInProgress,
    UpdateComplete,
    UpdateFailed,
    UpdateRollbackInProgress,
    UpdateRollbackCompleteCleanupInProgress,
    UpdateRollbackComplete,
    UpdateRollbackFailed,
    RollbackInProgress,
    RollbackComplete,
    RollbackFailed,
    DeleteInProgress,
    DeleteComplete,
    DeleteFailed,
    ReviewInProgress,
}

impl StackStatus {
    /// Whether the status represents a mutating operation still in flight.
    /// Every other status is settled.
    pub fn in_progress(self) -> bool {
        matches!(
            self,
            StackStatus::CreateInProgress
                | StackStatus::UpdateInProgress
                | StackStatus::UpdateCompleteCleanupInProgress
                | StackStatus::UpdateRollbackInProgress
                | StackStatus::UpdateRollbackCompleteCleanupInProgress
                | StackStatus::RollbackInProgress
                | StackStatus::DeleteInProgress
                | StackStatus::ReviewInProgress
        )
    }
}

/// A deployable stack definition.
///
/// Owned by the orchestrator for the duration of a single deployment call and
/// treated as immutable once submitted to the remote backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    /// Unique stack name within an account/region scope.
    pub name: String,
    /// Retrievable URL of an uploaded template body.
    #[serde(default)]
    pub template_url: Option<String>,
    /// Inline template body, used when no uploaded URL exists.
    #[serde(default)]
    pub template_body: Option<String>,
    /// Ordered template parameters, keys unique.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Tags applied to every resource in the stack.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Execution role assumed by the backend for this stack, if any.
    #[serde(default)]
    pub role_arn: Option<String>,
}

impl Stack {
    /// Construct a stack definition with an inline template body.
    pub fn new(name: impl Into<String>, template_body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template_url: None,
            template_body: Some(template_body.into()),
            parameters: Vec::new(),
            tags: BTreeMap::new(),
            role_arn: None,
        }
    }

    /// Construct a stack definition referencing an uploaded template URL.
    pub fn with_template_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template_url: Some(url.into()),
            template_body: None,
            parameters: Vec::new(),
            tags: BTreeMap::new(),
            role_arn: None,
        }
    }

    /// Builder-style helper attaching parameters.
    pub fn parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Builder-style helper attaching tags.
    pub fn tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Point-in-time snapshot of a remote stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDescription {
    /// Lifecycle status at describe time.
    pub status: StackStatus,
    /// Parameters currently deployed.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Tags currently applied.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Stack outputs keyed by output name.
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

impl StackDescription {
    /// Whether the described stack has a mutating operation in flight.
    pub fn in_progress(&self) -> bool {
        self.status.in_progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_progress_statuses_cover_all_mutating_operations() {
        let in_flight = [
            StackStatus::CreateInProgress,
            StackStatus::UpdateInProgress,
            StackStatus::UpdateCompleteCleanupInProgress,
            StackStatus::UpdateRollbackInProgress,
            StackStatus::UpdateRollbackCompleteCleanupInProgress,
            StackStatus::RollbackInProgress,
            StackStatus::DeleteInProgress,
            StackStatus::ReviewInProgress,
        ];
        for status in in_flight {
            assert!(status.in_progress(), "{status} should be in progress");
        }
        let settled = [
            StackStatus::CreateComplete,
            StackStatus::CreateFailed,
            StackStatus::UpdateComplete,
            StackStatus::UpdateFailed,
            StackStatus::UpdateRollbackComplete,
            StackStatus::UpdateRollbackFailed,
            StackStatus::RollbackComplete,
            StackStatus::RollbackFailed,
            StackStatus::DeleteComplete,
            StackStatus::DeleteFailed,
        ];
        for status in settled {
            assert!(!status.in_progress(), "{status} should be settled");
        }
    }

    #[test]
    fn status_round_trips_through_screaming_snake_case() {
        let status: StackStatus = "UPDATE_ROLLBACK_IN_PROGRESS".parse().expect("parse status");
        assert_eq!(status, StackStatus::UpdateRollbackInProgress);
        assert_eq!(status.to_string(), "UPDATE_ROLLBACK_IN_PROGRESS");
    }

    #[test]
    fn parameter_serde_defaults_previous_value_flag() {
        let parameter: Parameter =
            serde_json::from_str(r#"{"key":"AppName","value":"demo"}"#).expect("decode parameter");
        assert_eq!(parameter, Parameter::new("AppName", "demo"));
    }
}
