use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BuildError;

pub const INTERFACE_EXT: &str = "ifc";
pub const OBJECT_EXT: &str = "obj";

/// The interface/object file pair produced for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleArtifact {
    pub module: String,
    pub interface: PathBuf,
    pub object: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Missing,
    Partial,
    Complete,
}

/// Single source of truth for "is this module built".
///
/// An artifact pair is atomic from the caller's perspective even though
/// it lives as two files; the store deletes both together and reports
/// a pair with only one file present as `Partial`, never `Complete`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn paths(&self, module: &str) -> ModuleArtifact {
        ModuleArtifact {
            module: module.to_string(),
            interface: self.dir.join(format!("{module}.{INTERFACE_EXT}")),
            object: self.dir.join(format!("{module}.{OBJECT_EXT}")),
        }
    }

    pub fn status(&self, module: &str) -> ArtifactStatus {
        let pair = self.paths(module);
        match (pair.interface.exists(), pair.object.exists()) {
            (true, true) => ArtifactStatus::Complete,
            (false, false) => ArtifactStatus::Missing,
            _ => ArtifactStatus::Partial,
        }
    }

    pub fn exists(&self, module: &str) -> bool {
        self.status(module) == ArtifactStatus::Complete
    }

    /// Checks that the pair is complete and that neither file is empty.
    pub fn verify(&self, module: &str) -> Result<ModuleArtifact, BuildError> {
        let pair = self.paths(module);
        match self.status(module) {
            ArtifactStatus::Complete => {}
            ArtifactStatus::Partial => return Err(BuildError::PartialArtifact(module.to_string())),
            ArtifactStatus::Missing => {
                return Err(BuildError::Compile {
                    exit_code: 0,
                    output: format!("expected artifacts for '{module}' were not produced"),
                });
            }
        }
        for path in [&pair.interface, &pair.object] {
            if fs::metadata(path)?.len() == 0 {
                return Err(BuildError::Compile {
                    exit_code: 0,
                    output: format!("artifact {} is empty", path.display()),
                });
            }
        }
        Ok(pair)
    }

    /// Removes any existing pair for the module before a rebuild.
    ///
    /// Both files go or neither does: a stale interface linked against
    /// a fresh object (or the reverse) is worse than a clean rebuild.
    pub fn ensure_clean(&self, module: &str) -> Result<(), BuildError> {
        let pair = self.paths(module);
        for path in [&pair.interface, &pair.object] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reports_missing_partial_and_complete() {
        let dir = tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        assert_eq!(store.status("micastd"), ArtifactStatus::Missing);
        assert!(!store.exists("micastd"));

        fs::write(dir.path().join("micastd.ifc"), b"ifc").expect("write");
        assert_eq!(store.status("micastd"), ArtifactStatus::Partial);
        assert!(!store.exists("micastd"));

        fs::write(dir.path().join("micastd.obj"), b"obj").expect("write");
        assert_eq!(store.status("micastd"), ArtifactStatus::Complete);
        assert!(store.exists("micastd"));
    }

    #[test]
    fn ensure_clean_removes_the_whole_pair() {
        let dir = tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        fs::write(dir.path().join("micalib.ifc"), b"ifc").expect("write");
        fs::write(dir.path().join("micalib.obj"), b"obj").expect("write");

        store.ensure_clean("micalib").expect("clean");
        assert!(!store.exists("micalib"));
        assert_eq!(store.status("micalib"), ArtifactStatus::Missing);

        // Cleaning an already clean module is a no-op.
        store.ensure_clean("micalib").expect("clean again");
    }

    #[test]
    fn verify_flags_partial_pairs() {
        let dir = tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        fs::write(dir.path().join("micastd.ifc"), b"ifc").expect("write");

        let err = store.verify("micastd").unwrap_err();
        assert!(matches!(err, BuildError::PartialArtifact(module) if module == "micastd"));
    }

    #[test]
    fn verify_rejects_empty_artifacts() {
        let dir = tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        fs::write(dir.path().join("micastd.ifc"), b"ifc").expect("write");
        fs::write(dir.path().join("micastd.obj"), b"").expect("write");

        let err = store.verify("micastd").unwrap_err();
        assert!(matches!(err, BuildError::Compile { .. }));
    }
}
