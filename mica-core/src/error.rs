use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("toolchain environment not resolved at {0}; run the '{1}' stage first")]
    EnvironmentMissing(PathBuf, String),
    #[error("toolchain not found: nothing matched {0}")]
    ToolchainNotFound(String),
    #[error("environment file {path} is corrupt: {reason}")]
    ConfigCorrupt { path: PathBuf, reason: String },
    #[error("source not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("compilation failed (exit code {exit_code}):\n{output}")]
    Compile { exit_code: i32, output: String },
    #[error("artifact pair for module '{0}' is inconsistent (interface or object missing)")]
    PartialArtifact(String),
    #[error("module '{module}' requires '{dependency}' but its artifacts are absent")]
    DependencyMissing { module: String, dependency: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
