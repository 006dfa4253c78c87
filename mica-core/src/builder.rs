use std::path::{Path, PathBuf};

use crate::artifact::{ArtifactStore, ModuleArtifact};
use crate::env::EnvironmentConfig;
use crate::error::BuildError;
use crate::toolchain::{ToolchainRunner, module_invocation};
use crate::unit::BuildUnit;

/// Compiles one module's source into its interface/object pair.
pub struct ModuleBuilder<'a> {
    env: &'a EnvironmentConfig,
    store: &'a ArtifactStore,
    runner: &'a dyn ToolchainRunner,
    working_dir: PathBuf,
}

impl<'a> ModuleBuilder<'a> {
    pub fn new(
        env: &'a EnvironmentConfig,
        store: &'a ArtifactStore,
        runner: &'a dyn ToolchainRunner,
        working_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            env,
            store,
            runner,
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }

    /// Builds `module` from `unit`.
    ///
    /// Every dependency's artifact pair must already be complete; that
    /// is checked before anything touches the toolchain or the
    /// filesystem, so a sequencing mistake never triggers a compile.
    pub fn build(&self, module: &str, unit: &BuildUnit) -> Result<ModuleArtifact, BuildError> {
        for dep in &unit.deps {
            if !self.store.exists(dep) {
                return Err(BuildError::DependencyMissing {
                    module: module.to_string(),
                    dependency: dep.clone(),
                });
            }
        }
        if !unit.source.exists() {
            return Err(BuildError::SourceNotFound(unit.source.clone()));
        }

        self.store.ensure_clean(module)?;
        let invocation = module_invocation(unit, module, self.env, self.store, &self.working_dir);
        let run = self.runner.run(&invocation)?;
        if !run.success() {
            return Err(BuildError::Compile {
                exit_code: run.exit_code,
                output: run.output,
            });
        }
        // The invocation reporting success is not enough; a partial or
        // interrupted write still fails the build here.
        self.store.verify(module)
    }
}
