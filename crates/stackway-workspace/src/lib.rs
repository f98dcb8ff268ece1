//! ---
//! sw_section: "03-local-workspace"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Local project workspace storing per-application manifests."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
//! Service managing a user's local workspace: creating the manifest
//! directory, reading and writing the workspace summary, and managing
//! per-application manifest files. A typical workspace looks like:
//!
//! ```text
//! .
//! ├── stackway               (manifest directory)
//! │   ├── .stackway-workspace (workspace summary)
//! │   └── api-app.yml        (manifest)
//! └── api                    (application sources)
//! ```
#![warn(missing_docs)]

pub mod errors;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use errors::WorkspaceError;

/// Name of the directory where application manifests are stored.
pub const MANIFEST_DIRECTORY_NAME: &str = "stackway";

const SUMMARY_FILE_NAME: &str = ".stackway-workspace";
const MANIFEST_FILE_SUFFIX: &str = "-app.yml";
const MAX_PARENT_DIRS_TO_SEARCH: usize = 5;

/// Shared result type for workspace operations.
pub type Result<T> = std::result::Result<T, WorkspaceError>;

/// Summary associating a workspace with its owning project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    /// Name of the project the workspace belongs to.
    pub project: String,
    /// Timestamp (UTC) when the workspace was registered.
    pub created_at: DateTime<Utc>,
}

/// Manages a local workspace rooted near a working directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    working_dir: PathBuf,
}

impl Workspace {
    /// Open a workspace service anchored at the current working directory.
    pub fn new() -> Result<Self> {
        Ok(Self {
            working_dir: std::env::current_dir()?,
        })
    }

    /// Open a workspace service anchored at an explicit directory.
    pub fn from_dir(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    /// Create the manifest directory in the working directory if none is
    /// discoverable, and record the owning project in the workspace summary.
    /// Fails when the workspace is already registered to a different
    /// project; succeeds without changes when it is registered to the same
    /// one.
    pub fn create(&self, project: &str) -> Result<()> {
        if self.manifest_directory().is_err() {
            fs::create_dir(self.working_dir.join(MANIFEST_DIRECTORY_NAME))?;
        }

        match self.summary() {
            Ok(existing) if existing.project == project => Ok(()),
            Ok(existing) => Err(WorkspaceError::ExistingProject {
                existing: existing.project,
            }),
            Err(WorkspaceError::NoProjectAssociated) => self.write_summary(project),
            Err(err) => Err(err),
        }
    }

    /// Read the workspace summary, including the owning project name.
    pub fn summary(&self) -> Result<WorkspaceSummary> {
        let summary_path = self.summary_path()?;
        if !summary_path.exists() {
            return Err(WorkspaceError::NoProjectAssociated);
        }
        let content = fs::read_to_string(&summary_path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Names of all applications with a local manifest.
    pub fn local_apps(&self) -> Result<Vec<String>> {
        let manifests = self.list_manifest_files()?;
        Ok(manifests
            .iter()
            .filter_map(|file| file.strip_suffix(MANIFEST_FILE_SUFFIX))
            .map(str::to_owned)
            .collect())
    }

    /// File names of all local manifests.
    pub fn list_manifest_files(&self) -> Result<Vec<String>> {
        let manifest_dir = self.manifest_directory()?;
        let mut manifests = Vec::new();
        for entry in fs::read_dir(manifest_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_file() && name.ends_with(MANIFEST_FILE_SUFFIX) {
                manifests.push(name);
            }
        }
        manifests.sort();
        Ok(manifests)
    }

    /// Read the raw bytes of a manifest file (e.g. `api-app.yml`).
    pub fn read_manifest(&self, manifest_file: &str) -> Result<Vec<u8>> {
        let path = self.manifest_directory()?.join(manifest_file);
        if !path.exists() {
            return Err(WorkspaceError::ManifestNotFound {
                name: manifest_file.to_owned(),
            });
        }
        Ok(fs::read(path)?)
    }

    /// Write a manifest blob for the named application, returning the path
    /// of the manifest file.
    pub fn write_manifest(&self, manifest: &[u8], app_name: &str) -> Result<PathBuf> {
        let path = self
            .manifest_directory()?
            .join(format!("{app_name}{MANIFEST_FILE_SUFFIX}"));
        fs::write(&path, manifest)?;
        debug!(path = %path.display(), app = %app_name, "manifest written");
        Ok(path)
    }

    fn write_summary(&self, project: &str) -> Result<()> {
        let summary = WorkspaceSummary {
            project: project.to_owned(),
            created_at: Utc::now(),
        };
        let serialized = serde_yaml::to_string(&summary)?;
        fs::write(self.summary_path()?, serialized)?;
        Ok(())
    }

    fn summary_path(&self) -> Result<PathBuf> {
        Ok(self.manifest_directory()?.join(SUMMARY_FILE_NAME))
    }

    /// Locate the manifest directory: the working directory itself when it
    /// is named after the manifest directory, otherwise the closest
    /// `stackway/` child found walking up at most five parent directories.
    fn manifest_directory(&self) -> Result<PathBuf> {
        if self.working_dir.file_name() == Some(std::ffi::OsStr::new(MANIFEST_DIRECTORY_NAME)) {
            return Ok(self.working_dir.clone());
        }

        let mut searching_dir: &Path = &self.working_dir;
        for _ in 0..MAX_PARENT_DIRS_TO_SEARCH {
            let candidate = searching_dir.join(MANIFEST_DIRECTORY_NAME);
            if candidate.is_dir() {
                return Ok(candidate);
            }
            match searching_dir.parent() {
                Some(parent) => searching_dir = parent,
                None => break,
            }
        }
        Err(WorkspaceError::NotFound {
            current_dir: self.working_dir.clone(),
            directory_name: MANIFEST_DIRECTORY_NAME,
            levels_checked: MAX_PARENT_DIRS_TO_SEARCH,
        })
    }
}
