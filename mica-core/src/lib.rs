//! Core build pipeline for the Mica dialect.
//!
//! Mica sources are transliterated into C++ and compiled through an
//! external MSVC toolchain as precompiled modules. The pipeline is:
//!
//!   resolve toolchain environment (persisted once, read thereafter)
//!     -> build micastd   (runtime module, .ifc + .obj)
//!     -> build micalib   (library module, imports micastd)
//!     -> build program   (single .mica unit, links everything)
//!
//! The dialect has no semantics of its own; the only correctness
//! oracle is the external compiler. This crate owns the sequencing and
//! artifact bookkeeping around it. Higher-level tools (the CLI) should
//! depend on this crate rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Environment discovery and source preprocessing
// ---------------------------------------------------------------------

pub mod env;
pub mod preprocess;

// ---------------------------------------------------------------------
// Artifact bookkeeping and build units
// ---------------------------------------------------------------------

pub mod artifact;
pub mod unit;

// ---------------------------------------------------------------------
// Toolchain boundary, builders, and orchestration
// ---------------------------------------------------------------------

pub mod builder;
pub mod pipeline;
pub mod program;
pub mod toolchain;

#[cfg(test)]
mod testing;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use artifact::{ArtifactStatus, ArtifactStore, ModuleArtifact};
pub use builder::ModuleBuilder;
pub use env::{EnvironmentConfig, MsvcLocator, RESOLVE_STAGE, ToolchainLocator};
pub use error::BuildError;
pub use pipeline::{Pipeline, PipelineOutcome, PipelineState};
pub use preprocess::{PreprocessOptions, preprocess};
pub use program::{ProgramBuilder, find_program_source};
pub use toolchain::{ProcessRunner, RunOutput, ToolchainInvocation, ToolchainRunner};
pub use unit::{BuildUnit, standard_modules};
