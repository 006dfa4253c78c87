use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::artifact::ArtifactStore;
use crate::env::EnvironmentConfig;
use crate::error::BuildError;
use crate::preprocess::{PreprocessOptions, preprocess};
use crate::toolchain::{ToolchainRunner, program_invocation};
use crate::unit::SOURCE_EXT;

/// Compiles and links the final executable from the single top-level
/// dialect source plus every previously built module.
pub struct ProgramBuilder<'a> {
    env: &'a EnvironmentConfig,
    store: &'a ArtifactStore,
    runner: &'a dyn ToolchainRunner,
    options: PreprocessOptions,
    working_dir: PathBuf,
}

impl<'a> ProgramBuilder<'a> {
    pub fn new(
        env: &'a EnvironmentConfig,
        store: &'a ArtifactStore,
        runner: &'a dyn ToolchainRunner,
        options: PreprocessOptions,
        working_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            env,
            store,
            runner,
            options,
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }

    /// Builds the executable for `source`, consuming `modules` in
    /// chain order. Returns the executable path.
    pub fn build(&self, source: &Path, modules: &[String]) -> Result<PathBuf, BuildError> {
        if !source.exists() {
            return Err(BuildError::SourceNotFound(source.to_path_buf()));
        }
        for module in modules {
            self.store.verify(module)?;
        }

        let host_source = source.with_extension("cpp");
        let executable = source.with_extension("exe");
        let object = source.with_extension("obj");
        for stale in [&host_source, &executable] {
            if stale.exists() {
                fs::remove_file(stale)?;
            }
        }

        let dialect = fs::read_to_string(source)?;
        let body = preprocess(&dialect, &self.options);
        fs::write(&host_source, wrap_program(&body, modules))?;

        let invocation = program_invocation(
            &host_source,
            &executable,
            modules,
            self.env,
            self.store,
            &self.working_dir,
        );
        let run = self.runner.run(&invocation)?;
        if !run.success() {
            return Err(BuildError::Compile {
                exit_code: run.exit_code,
                output: run.output,
            });
        }
        if !executable.exists() {
            return Err(BuildError::Compile {
                exit_code: 0,
                output: format!("expected executable {} was not produced", executable.display()),
            });
        }
        // The top-level unit's object is an intermediate; removing it
        // is part of the contract, not housekeeping.
        if object.exists() {
            fs::remove_file(&object)?;
        }
        Ok(executable)
    }
}

/// Wraps the preprocessed dialect text into a complete host program:
/// module headers, namespace import, the dialect's numeric aliases,
/// and a trailing entry point.
fn wrap_program(body: &str, modules: &[String]) -> String {
    let mut text = String::new();
    for module in modules {
        text.push_str(&format!("#include \"{module}.hpp\"\n"));
    }
    text.push_str("using namespace mica;\n");
    text.push_str("#define nat size_t\n");
    text.push_str("#define fat double\n");
    text.push_str(body);
    text.push_str("\nint main() {}\n");
    text
}

/// Finds the dialect source to build: the first `*.mica` file in the
/// project directory, in sorted order.
pub fn find_program_source(project_dir: impl AsRef<Path>) -> Result<PathBuf, BuildError> {
    let project_dir = project_dir.as_ref();
    let mut sources: Vec<PathBuf> = WalkDir::new(project_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| {
            entry.path().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == SOURCE_EXT)
        })
        .map(|entry| entry.path().to_path_buf())
        .collect();
    sources.sort();
    sources
        .into_iter()
        .next()
        .ok_or_else(|| BuildError::SourceNotFound(project_dir.join(format!("*.{SOURCE_EXT}"))))
}
