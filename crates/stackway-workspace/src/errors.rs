//! ---
//! sw_section: "03-local-workspace"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Typed errors for local workspace operations."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
use std::path::PathBuf;

/// Errors raised by local workspace operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// No manifest directory was found walking up from the current
    /// directory.
    #[error(
        "no {directory_name} directory found within {levels_checked} levels above {current_dir}"
    )]
    NotFound {
        /// Directory the search started from.
        current_dir: PathBuf,
        /// Name of the manifest directory searched for.
        directory_name: &'static str,
        /// Number of parent levels inspected.
        levels_checked: usize,
    },
    /// The workspace exists but carries no summary associating it with a
    /// project.
    #[error("workspace is not associated with any project")]
    NoProjectAssociated,
    /// The workspace summary names a different project.
    #[error("workspace is already registered to project {existing}")]
    ExistingProject {
        /// Project recorded in the existing summary.
        existing: String,
    },
    /// The requested manifest file does not exist in the workspace.
    #[error("manifest {name} not found in workspace")]
    ManifestNotFound {
        /// Manifest file name as requested.
        name: String,
    },
    /// Filesystem access failed.
    #[error("workspace io: {0}")]
    Io(#[from] std::io::Error),
    /// The workspace summary could not be encoded or decoded.
    #[error("workspace summary: {0}")]
    Summary(#[from] serde_yaml::Error),
}
