use std::path::{Path, PathBuf};

use crate::artifact::ArtifactStore;
use crate::builder::ModuleBuilder;
use crate::env::{EnvironmentConfig, ToolchainLocator};
use crate::error::BuildError;
use crate::preprocess::PreprocessOptions;
use crate::program::{ProgramBuilder, find_program_source};
use crate::toolchain::ToolchainRunner;
use crate::unit::{BuildUnit, SOURCE_EXT, standard_modules};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    ResolveEnvironment,
    BuildModule(String),
    BuildProgram,
    Done,
    Failed { stage: String },
}

impl PipelineState {
    fn stage(&self) -> String {
        match self {
            PipelineState::ResolveEnvironment => "resolve-environment".to_string(),
            PipelineState::BuildModule(module) => module.clone(),
            PipelineState::BuildProgram => "program".to_string(),
            PipelineState::Done => "done".to_string(),
            PipelineState::Failed { stage } => stage.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub executable: PathBuf,
    /// Modules compiled during this run, chain order.
    pub rebuilt: Vec<String>,
    /// Modules whose artifact pairs were already complete.
    pub skipped: Vec<String>,
}

/// Sequences the whole build: environment resolution, then each module
/// in dependency order, then the final program.
///
/// Each `BuildModule` state advances only once the artifact store
/// confirms the pair on disk; any error halts the machine in `Failed`
/// with the stage that broke. Single-threaded and blocking throughout;
/// concurrent builds of one project directory are unsupported.
pub struct Pipeline<'a> {
    project_dir: PathBuf,
    units: Vec<BuildUnit>,
    options: PreprocessOptions,
    locator: &'a dyn ToolchainLocator,
    runner: &'a dyn ToolchainRunner,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        project_dir: impl AsRef<Path>,
        locator: &'a dyn ToolchainLocator,
        runner: &'a dyn ToolchainRunner,
    ) -> Self {
        let project_dir = project_dir.as_ref().to_path_buf();
        let units = standard_modules(&project_dir);
        Self {
            project_dir,
            units,
            options: PreprocessOptions::default(),
            locator,
            runner,
            state: PipelineState::ResolveEnvironment,
        }
    }

    /// Replaces the standard chain with an arbitrary topologically
    /// sorted unit list. A module-less unit is built as the final
    /// program; when the list has none, the top-level source is
    /// discovered in the project directory instead.
    pub fn with_units(mut self, units: Vec<BuildUnit>) -> Self {
        self.units = units;
        self
    }

    pub fn with_options(mut self, options: PreprocessOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn run(&mut self) -> Result<PipelineOutcome, BuildError> {
        match self.drive() {
            Ok(outcome) => {
                self.state = PipelineState::Done;
                Ok(outcome)
            }
            Err(err) => {
                self.state = PipelineState::Failed {
                    stage: self.state.stage(),
                };
                Err(err)
            }
        }
    }

    fn drive(&mut self) -> Result<PipelineOutcome, BuildError> {
        let project_dir = self.project_dir.clone();
        let mut units = self.units.clone();
        let locator = self.locator;
        let runner = self.runner;

        // A unit list of bare modules gets the discovered top-level
        // source appended as its program unit, consuming the whole
        // chain. Discovery runs before anything else so that a fresh
        // directory without dialect sources fails without writing a
        // configuration file or any artifact.
        if units.iter().all(|unit| unit.module.is_some()) {
            let program_source = find_program_source(&project_dir)?;
            let chain: Vec<String> = units
                .iter()
                .filter_map(|unit| unit.module.clone())
                .collect();
            let chain: Vec<&str> = chain.iter().map(String::as_str).collect();
            units.push(BuildUnit::program(program_source, &chain));
        }

        self.state = PipelineState::ResolveEnvironment;
        let env = EnvironmentConfig::resolve_or_load(&project_dir, locator)?;

        let store = ArtifactStore::new(&project_dir);
        let builder = ModuleBuilder::new(&env, &store, runner, &project_dir);
        let program_builder = ProgramBuilder::new(&env, &store, runner, self.options, &project_dir);
        let mut executable = None;
        let mut rebuilt = Vec::new();
        let mut skipped = Vec::new();
        for unit in &units {
            match unit.module.as_deref() {
                Some(module) => {
                    self.state = PipelineState::BuildModule(module.to_string());
                    if store.exists(module) {
                        skipped.push(module.to_string());
                    } else {
                        builder.build(module, unit)?;
                        rebuilt.push(module.to_string());
                    }
                    // Transition guard: the pair must be on disk and
                    // sound before the next stage may assume it.
                    store.verify(module)?;
                }
                None => {
                    self.state = PipelineState::BuildProgram;
                    executable = Some(program_builder.build(&unit.source, &unit.deps)?);
                }
            }
        }

        let Some(executable) = executable else {
            return Err(BuildError::SourceNotFound(
                project_dir.join(format!("*.{SOURCE_EXT}")),
            ));
        };
        Ok(PipelineOutcome {
            executable,
            rebuilt,
            skipped,
        })
    }
}
