//! ---
//! sw_section: "01-core-primitives"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Resource name parsing for artifact and role references."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const RESOURCE_NAME_PREFIX: &str = "arn";
const RESOURCE_NAME_SECTIONS: usize = 6;

/// Error raised when a resource name reference cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceNameError {
    /// The reference does not start with the `arn` scheme.
    #[error("resource name {0:?} does not start with \"{RESOURCE_NAME_PREFIX}\"")]
    MissingPrefix(String),
    /// The reference has fewer than the six colon-separated sections.
    #[error("resource name {0:?} must have {RESOURCE_NAME_SECTIONS} colon-separated sections")]
    MalformedSections(String),
}

/// A parsed six-section resource name of the form
/// `arn:partition:service:region:account:resource`.
///
/// The trailing resource section may itself contain colons; everything after
/// the fifth separator belongs to `resource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceName {
    /// Partition the resource lives in.
    pub partition: String,
    /// Owning service identifier.
    pub service: String,
    /// Region, possibly empty for global resources.
    pub region: String,
    /// Account identifier, possibly empty.
    pub account: String,
    /// Resource path, e.g. a bucket name.
    pub resource: String,
}

impl FromStr for ResourceName {
    type Err = ResourceNameError;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        let mut sections = reference.splitn(RESOURCE_NAME_SECTIONS, ':');
        let prefix = sections.next().unwrap_or_default();
        if prefix != RESOURCE_NAME_PREFIX {
            return Err(ResourceNameError::MissingPrefix(reference.to_owned()));
        }
        let parts: Vec<&str> = sections.collect();
        if parts.len() != RESOURCE_NAME_SECTIONS - 1 {
            return Err(ResourceNameError::MalformedSections(reference.to_owned()));
        }
        Ok(Self {
            partition: parts[0].to_owned(),
            service: parts[1].to_owned(),
            region: parts[2].to_owned(),
            account: parts[3].to_owned(),
            resource: parts[4].to_owned(),
        })
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{RESOURCE_NAME_PREFIX}:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account, self.resource
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bucket_reference() {
        let name: ResourceName = "arn:aws:s3:::stackway-artifacts".parse().expect("parse");
        assert_eq!(name.service, "s3");
        assert_eq!(name.resource, "stackway-artifacts");
        assert!(name.region.is_empty());
    }

    #[test]
    fn resource_section_keeps_embedded_colons() {
        let name: ResourceName = "arn:aws:iam::123456789012:role/exec:extra"
            .parse()
            .expect("parse");
        assert_eq!(name.resource, "role/exec:extra");
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = "s3://stackway-artifacts".parse::<ResourceName>().unwrap_err();
        assert!(matches!(err, ResourceNameError::MissingPrefix(_)));
    }

    #[test]
    fn rejects_truncated_reference() {
        let err = "arn:aws:s3".parse::<ResourceName>().unwrap_err();
        assert!(matches!(err, ResourceNameError::MalformedSections(_)));
    }

    #[test]
    fn display_round_trips() {
        let raw = "arn:aws:s3:::stackway-artifacts";
        let name: ResourceName = raw.parse().expect("parse");
        assert_eq!(name.to_string(), raw);
    }
}
