use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Relative path of the persisted toolchain configuration.
///
/// Written once by the resolver, read by every later stage. The record
/// is regenerated wholesale when the file is absent; it is never
/// patched in place.
pub const ENVIRONMENT_FILE: &str = ".vscode/environment.json";

/// Name of the stage that is allowed to regenerate the environment.
pub const RESOLVE_STAGE: &str = "micastd";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub cl_exe: String,
    pub msvc_inc: String,
    pub msvc_lib: String,
    pub ucrt_inc: String,
    pub ucrt_lib: String,
    pub um_inc: String,
    pub um_lib: String,
    pub shared_inc: String,
    pub winrt_inc: String,
    pub cppwinrt_inc: String,
}

impl EnvironmentConfig {
    /// Include search roots, in the order they are passed to the compiler.
    pub fn include_dirs(&self) -> [&str; 6] {
        [
            &self.msvc_inc,
            &self.ucrt_inc,
            &self.um_inc,
            &self.shared_inc,
            &self.winrt_inc,
            &self.cppwinrt_inc,
        ]
    }

    /// Library search roots, link stage only.
    pub fn lib_dirs(&self) -> [&str; 3] {
        [&self.msvc_lib, &self.ucrt_lib, &self.um_lib]
    }

    pub fn file_path(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join(ENVIRONMENT_FILE)
    }

    /// Strict load: the configuration must already exist on disk.
    ///
    /// `stage_hint` names the stage the user should run to create it.
    pub fn load(project_dir: impl AsRef<Path>, stage_hint: &str) -> Result<Self, BuildError> {
        let path = Self::file_path(project_dir);
        if !path.exists() {
            return Err(BuildError::EnvironmentMissing(path, stage_hint.to_string()));
        }
        let text = fs::read_to_string(&path)?;
        serde_json::from_str(&text).map_err(|err| BuildError::ConfigCorrupt {
            path,
            reason: err.to_string(),
        })
    }

    pub fn save(&self, project_dir: impl AsRef<Path>) -> Result<(), BuildError> {
        let path = Self::file_path(project_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)
            .map_err(|err| BuildError::Io(std::io::Error::other(err)))?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Reads the persisted configuration, or runs the locator and
    /// persists the result when no configuration exists yet.
    pub fn resolve_or_load(
        project_dir: impl AsRef<Path>,
        locator: &dyn ToolchainLocator,
    ) -> Result<Self, BuildError> {
        let project_dir = project_dir.as_ref();
        if Self::file_path(project_dir).exists() {
            return Self::load(project_dir, RESOLVE_STAGE);
        }
        let config = locator.locate()?;
        config.save(project_dir)?;
        Ok(config)
    }
}

/// Strategy for discovering toolchain paths on a machine.
///
/// Kept as a trait so a deterministic, pinned resolver can replace the
/// wildcard scan without touching callers.
pub trait ToolchainLocator {
    fn locate(&self) -> Result<EnvironmentConfig, BuildError>;
}

/// Locates an MSVC installation by scanning version-wildcarded paths
/// and derives the remaining include/library roots from the matches.
///
/// Best effort: the first match wins, so machines with several
/// installed versions may pick any of them. Pin paths by editing the
/// persisted environment file when that matters.
pub struct MsvcLocator;

const CL_EXE_PATTERN: &str =
    r"C:\Program Files*\Microsoft Visual Studio\*\*\VC\Tools\MSVC\*\bin\Hostx64\x64\cl.exe";
const UCRT_INC_PATTERN: &str = r"C:\Program Files*\Windows Kits\*\Include\*\ucrt";

impl ToolchainLocator for MsvcLocator {
    fn locate(&self) -> Result<EnvironmentConfig, BuildError> {
        let cl_exe = first_match(CL_EXE_PATTERN)
            .ok_or_else(|| BuildError::ToolchainNotFound(CL_EXE_PATTERN.to_string()))?;
        let cl_exe = cl_exe.to_string_lossy().into_owned();
        let msvc_inc = cl_exe.replace(r"bin\Hostx64\x64\cl.exe", "include");
        let msvc_lib = msvc_inc.replace("include", r"lib\x64");

        let ucrt_inc = first_match(UCRT_INC_PATTERN)
            .ok_or_else(|| BuildError::ToolchainNotFound(UCRT_INC_PATTERN.to_string()))?;
        let ucrt_inc = ucrt_inc.to_string_lossy().into_owned();
        let ucrt_lib = ucrt_inc.replace("Include", "Lib") + r"\x64";

        Ok(EnvironmentConfig {
            um_inc: ucrt_inc.replace("ucrt", "um"),
            um_lib: ucrt_lib.replace("ucrt", "um"),
            shared_inc: ucrt_inc.replace("ucrt", "shared"),
            winrt_inc: ucrt_inc.replace("ucrt", "winrt"),
            cppwinrt_inc: ucrt_inc.replace("ucrt", "cppwinrt"),
            cl_exe,
            msvc_inc,
            msvc_lib,
            ucrt_inc,
            ucrt_lib,
        })
    }
}

/// Returns the first filesystem path matching a wildcard pattern.
///
/// `*` matches within a single path segment; segments may be separated
/// by `/` or `\`. Matches within a directory are taken in sorted order
/// so repeated runs on the same machine agree.
pub fn first_match(pattern: &str) -> Option<PathBuf> {
    let segments: Vec<&str> = pattern.split(['/', '\\']).collect();
    let (mut candidates, rest) = match segments.split_first() {
        Some((&"", rest)) => (vec![PathBuf::from("/")], rest),
        Some((root, rest)) => {
            let mut path = String::from(*root);
            path.push(std::path::MAIN_SEPARATOR);
            (vec![PathBuf::from(path)], rest)
        }
        None => return None,
    };

    for &segment in rest {
        if segment.is_empty() {
            continue;
        }
        let mut next = Vec::new();
        if segment.contains('*') {
            let matcher = segment_matcher(segment);
            for dir in &candidates {
                let Ok(entries) = fs::read_dir(dir) else {
                    continue;
                };
                let mut matched: Vec<PathBuf> = entries
                    .filter_map(Result::ok)
                    .filter(|entry| matcher.is_match(&entry.file_name().to_string_lossy()))
                    .map(|entry| entry.path())
                    .collect();
                matched.sort();
                next.extend(matched);
            }
        } else {
            for dir in &candidates {
                let path = dir.join(segment);
                if path.exists() {
                    next.push(path);
                }
            }
        }
        if next.is_empty() {
            return None;
        }
        candidates = next;
    }
    candidates.into_iter().next()
}

fn segment_matcher(segment: &str) -> Regex {
    let pattern = segment
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{pattern}$")).expect("segment pattern is valid")
}
