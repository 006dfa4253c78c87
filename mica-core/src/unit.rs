use std::path::{Path, PathBuf};

/// Dialect source extension.
pub const SOURCE_EXT: &str = "mica";
/// Host module-interface source extension.
pub const MODULE_SOURCE_EXT: &str = "ixx";

/// One compilation job: a source, the module it produces (`None` for
/// the final executable), and the modules it consumes, in build order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildUnit {
    pub source: PathBuf,
    pub module: Option<String>,
    pub deps: Vec<String>,
}

impl BuildUnit {
    pub fn module(name: &str, source: impl AsRef<Path>, deps: &[&str]) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            module: Some(name.to_string()),
            deps: deps.iter().map(|dep| dep.to_string()).collect(),
        }
    }

    pub fn program(source: impl AsRef<Path>, deps: &[&str]) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            module: None,
            deps: deps.iter().map(|dep| dep.to_string()).collect(),
        }
    }
}

/// The standard module chain, dependency order.
///
/// Strictly linear today (micastd, then micalib on top of it), but the
/// pipeline only assumes a topologically sorted list, so extending the
/// chain is a matter of appending here.
pub fn standard_modules(project_dir: impl AsRef<Path>) -> Vec<BuildUnit> {
    let dir = project_dir.as_ref();
    vec![
        BuildUnit::module("micastd", dir.join(format!("micastd.{MODULE_SOURCE_EXT}")), &[]),
        BuildUnit::module(
            "micalib",
            dir.join(format!("micalib.{MODULE_SOURCE_EXT}")),
            &["micastd"],
        ),
    ]
}
