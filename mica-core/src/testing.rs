//! Test doubles shared by the unit tests in this crate.

use std::cell::RefCell;
use std::fs;

use crate::env::EnvironmentConfig;
use crate::error::BuildError;
use crate::toolchain::{RunOutput, ToolchainInvocation, ToolchainRunner};

/// Records every invocation and, on success, writes the expected
/// output files so the post-build verification passes. For a link
/// invocation it also drops the intermediate object the real compiler
/// would leave next to the executable.
pub(crate) struct FakeRunner {
    exit_code: i32,
    output: String,
    pub invocations: RefCell<Vec<ToolchainInvocation>>,
}

impl FakeRunner {
    pub fn succeeding() -> Self {
        Self {
            exit_code: 0,
            output: String::new(),
            invocations: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(exit_code: i32, output: &str) -> Self {
        Self {
            exit_code,
            output: output.to_string(),
            invocations: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.invocations.borrow().len()
    }
}

impl ToolchainRunner for FakeRunner {
    fn run(&self, invocation: &ToolchainInvocation) -> Result<RunOutput, BuildError> {
        self.invocations.borrow_mut().push(invocation.clone());
        if self.exit_code == 0 {
            for path in &invocation.expected_outputs {
                fs::write(path, b"artifact")?;
                if path.extension().is_some_and(|ext| ext == "exe") {
                    fs::write(path.with_extension("obj"), b"intermediate")?;
                }
            }
        }
        Ok(RunOutput {
            exit_code: self.exit_code,
            output: self.output.clone(),
        })
    }
}

pub(crate) fn test_env() -> EnvironmentConfig {
    EnvironmentConfig {
        cl_exe: "/toolchain/cl.exe".to_string(),
        msvc_inc: "/toolchain/include".to_string(),
        msvc_lib: "/toolchain/lib".to_string(),
        ucrt_inc: "/kits/ucrt".to_string(),
        ucrt_lib: "/kits/lib/ucrt".to_string(),
        um_inc: "/kits/um".to_string(),
        um_lib: "/kits/lib/um".to_string(),
        shared_inc: "/kits/shared".to_string(),
        winrt_inc: "/kits/winrt".to_string(),
        cppwinrt_inc: "/kits/cppwinrt".to_string(),
    }
}
