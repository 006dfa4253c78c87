use std::path::{Path, PathBuf};
use std::process::Command;

use crate::artifact::ArtifactStore;
use crate::env::EnvironmentConfig;
use crate::error::BuildError;
use crate::unit::BuildUnit;

/// Compiler flags shared by every stage.
pub const COMMON_FLAGS: [&str; 7] = [
    "/std:c++latest",
    "/EHsc",
    "/nologo",
    "/W4",
    "/O2",
    "/Qpar",
    "/utf-8",
];

/// One external compiler call: argument list plus the artifacts the
/// call is expected to leave behind. Built fresh per invocation and
/// discarded after execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub expected_outputs: Vec<PathBuf>,
}

/// Builds the invocation that compiles one unit in module-producing
/// mode: `/c`, interface + object outputs, one `/reference` per
/// dependency in dependency build order, and the include roots.
pub fn module_invocation(
    unit: &BuildUnit,
    module: &str,
    env: &EnvironmentConfig,
    store: &ArtifactStore,
    working_dir: impl AsRef<Path>,
) -> ToolchainInvocation {
    let pair = store.paths(module);
    let mut args = vec!["/c".to_string(), unit.source.display().to_string()];
    args.extend(COMMON_FLAGS.iter().map(|flag| flag.to_string()));
    args.push(format!("/D{}_COMPILE=true", module.to_uppercase()));
    for dep in &unit.deps {
        args.push(format!("/D{}_IMPORT=true", dep.to_uppercase()));
    }
    args.push(format!("/Fo{}", pair.object.display()));
    args.push(format!("/ifcOutput{}", pair.interface.display()));
    for inc in env.include_dirs() {
        args.push(format!("/I{inc}"));
    }
    for dep in &unit.deps {
        let dep_pair = store.paths(dep);
        args.push("/reference".to_string());
        args.push(format!("{dep}={}", dep_pair.interface.display()));
    }

    ToolchainInvocation {
        program: PathBuf::from(&env.cl_exe),
        args,
        working_dir: working_dir.as_ref().to_path_buf(),
        expected_outputs: vec![pair.interface, pair.object],
    }
}

/// Builds the compile-and-link invocation for the final executable:
/// every module's interface is referenced and every module's object is
/// linked, in chain order, followed by the library search roots.
pub fn program_invocation(
    host_source: &Path,
    executable: &Path,
    modules: &[String],
    env: &EnvironmentConfig,
    store: &ArtifactStore,
    working_dir: impl AsRef<Path>,
) -> ToolchainInvocation {
    let mut args = vec![host_source.display().to_string()];
    args.extend(COMMON_FLAGS.iter().map(|flag| flag.to_string()));
    for module in modules {
        args.push(format!("/D{}_IMPORT=true", module.to_uppercase()));
    }
    for inc in env.include_dirs() {
        args.push(format!("/I{inc}"));
    }
    for module in modules {
        let pair = store.paths(module);
        args.push("/reference".to_string());
        args.push(format!("{module}={}", pair.interface.display()));
    }
    for module in modules {
        args.push(store.paths(module).object.display().to_string());
    }
    args.push("/link".to_string());
    for lib in env.lib_dirs() {
        args.push(format!("/LIBPATH:{lib}"));
    }

    ToolchainInvocation {
        program: PathBuf::from(&env.cl_exe),
        args,
        working_dir: working_dir.as_ref().to_path_buf(),
        expected_outputs: vec![executable.to_path_buf()],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub exit_code: i32,
    pub output: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Boundary to the external compiler. The process implementation is
/// the only correctness oracle for host-language syntax; tests swap in
/// a fake with configurable exit codes instead of validating output.
pub trait ToolchainRunner {
    fn run(&self, invocation: &ToolchainInvocation) -> Result<RunOutput, BuildError>;
}

/// Blocking `std::process` runner capturing stdout and stderr.
pub struct ProcessRunner;

impl ToolchainRunner for ProcessRunner {
    fn run(&self, invocation: &ToolchainInvocation) -> Result<RunOutput, BuildError> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .output()?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(RunOutput {
            exit_code: output.status.code().unwrap_or(-1),
            output: text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_env;
    use crate::unit::BuildUnit;
    use tempfile::tempdir;

    #[test]
    fn module_invocation_selects_compile_mode() {
        let dir = tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        let unit = BuildUnit::module("micalib", dir.path().join("micalib.ixx"), &["micastd"]);
        let invocation = module_invocation(&unit, "micalib", &test_env(), &store, dir.path());

        assert_eq!(invocation.args[0], "/c");
        assert!(invocation.args.contains(&"/DMICALIB_COMPILE=true".to_string()));
        assert!(invocation.args.contains(&"/DMICASTD_IMPORT=true".to_string()));
        assert!(!invocation.args.contains(&"/DMICALIB_IMPORT=true".to_string()));
        assert!(!invocation.args.contains(&"/link".to_string()));
        assert_eq!(invocation.expected_outputs.len(), 2);
    }

    #[test]
    fn reference_flags_follow_dependency_build_order() {
        let dir = tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        let modules = ["micastd".to_string(), "micalib".to_string()];
        let invocation = program_invocation(
            &dir.path().join("app.cpp"),
            &dir.path().join("app.exe"),
            &modules,
            &test_env(),
            &store,
            dir.path(),
        );

        let references: Vec<&String> = invocation
            .args
            .iter()
            .filter(|arg| !arg.starts_with('/') && arg.contains(".ifc"))
            .collect();
        assert_eq!(references.len(), 2);
        assert!(references[0].starts_with("micastd="));
        assert!(references[1].starts_with("micalib="));

        // Objects are linked in the same order, before the link flags.
        let obj_positions: Vec<usize> = invocation
            .args
            .iter()
            .enumerate()
            .filter(|(_, arg)| arg.ends_with(".obj"))
            .map(|(idx, _)| idx)
            .collect();
        let link_position = invocation
            .args
            .iter()
            .position(|arg| arg == "/link")
            .expect("link flag present");
        assert_eq!(obj_positions.len(), 2);
        assert!(obj_positions.iter().all(|idx| *idx < link_position));
    }

    #[test]
    fn program_invocation_carries_every_lib_dir() {
        let dir = tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        let env = test_env();
        let invocation = program_invocation(
            &dir.path().join("app.cpp"),
            &dir.path().join("app.exe"),
            &[],
            &env,
            &store,
            dir.path(),
        );

        for lib in env.lib_dirs() {
            assert!(invocation.args.contains(&format!("/LIBPATH:{lib}")));
        }
    }
}
