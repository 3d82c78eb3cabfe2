//! Locating the generated AppDelegate inside an app project, and keeping
//! writes inside that project.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const APP_DELEGATE_FILE: &str = "AppDelegate.swift";

/// Project-relative directories that are never patched.
const FORBIDDEN_DIRS: [&str; 3] = ["ios/Pods", "ios/build", "node_modules"];

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("no AppDelegate.swift found under {0}")]
    NotFound(PathBuf),

    #[error("found {} AppDelegate.swift candidates: {}", .0.len(), display_paths(.0))]
    Ambiguous(Vec<PathBuf>),

    #[error("path is outside project: {path} (project: {project})")]
    OutsideProject { path: PathBuf, project: PathBuf },

    #[error("path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Find the single `ios/<App>/AppDelegate.swift` of an Expo project.
pub fn discover_app_delegate(project_root: &Path) -> Result<PathBuf, ProjectError> {
    let ios = project_root.join("ios");
    if !ios.is_dir() {
        return Err(ProjectError::NotFound(project_root.to_path_buf()));
    }

    let mut found = Vec::new();
    let walker = WalkDir::new(&ios)
        .max_depth(3)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && matches!(entry.file_name().to_str(), Some("Pods" | "build")))
        });

    for entry in walker {
        let entry = entry.map_err(|source| ProjectError::Walk {
            path: ios.clone(),
            source,
        })?;
        if entry.file_type().is_file() && entry.file_name() == APP_DELEGATE_FILE {
            found.push(entry.into_path());
        }
    }

    found.sort();
    match found.len() {
        0 => Err(ProjectError::NotFound(project_root.to_path_buf())),
        1 => Ok(found.remove(0)),
        _ => Err(ProjectError::Ambiguous(found)),
    }
}

/// Keeps patch targets inside the project and out of generated or vendored trees.
#[derive(Debug, Clone)]
pub struct ProjectGuard {
    project_root: PathBuf,
    forbidden_paths: Vec<PathBuf>,
}

impl ProjectGuard {
    /// The root is canonicalized so symlinked checkouts compare correctly.
    pub fn new(project_root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let project_root = project_root.as_ref().canonicalize()?;
        let forbidden_paths = FORBIDDEN_DIRS
            .iter()
            .filter_map(|dir| project_root.join(dir).canonicalize().ok())
            .collect();

        Ok(Self {
            project_root,
            forbidden_paths,
        })
    }

    /// Canonical absolute path of `path` if it is safe to patch.
    ///
    /// Relative paths resolve against the project root.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ProjectError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };
        let canonical = absolute.canonicalize()?;

        if !canonical.starts_with(&self.project_root) {
            return Err(ProjectError::OutsideProject {
                path: canonical,
                project: self.project_root.clone(),
            });
        }
        if let Some(forbidden) = self
            .forbidden_paths
            .iter()
            .find(|forbidden| canonical.starts_with(forbidden))
        {
            return Err(ProjectError::ForbiddenPath {
                path: canonical,
                forbidden: forbidden.clone(),
            });
        }

        Ok(canonical)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_discovers_app_delegate() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ios/MyApp/AppDelegate.swift");
        touch(&target);
        touch(&dir.path().join("ios/Pods/Expo/AppDelegate.swift"));

        assert_eq!(discover_app_delegate(dir.path()).unwrap(), target);
    }

    #[test]
    fn test_discovery_without_ios_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_app_delegate(dir.path()),
            Err(ProjectError::NotFound(_))
        ));
    }

    #[test]
    fn test_discovery_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("ios/One/AppDelegate.swift"));
        touch(&dir.path().join("ios/Two/AppDelegate.swift"));

        match discover_app_delegate(dir.path()) {
            Err(ProjectError::Ambiguous(paths)) => assert_eq!(paths.len(), 2),
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_path_inside_project() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("ios/MyApp/AppDelegate.swift"));
        let guard = ProjectGuard::new(dir.path()).unwrap();

        assert!(guard.validate_path("ios/MyApp/AppDelegate.swift").is_ok());
    }

    #[test]
    fn test_validate_path_outside_project() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("app");
        fs::create_dir_all(&project).unwrap();
        let outside = dir.path().join("AppDelegate.swift");
        touch(&outside);

        let guard = ProjectGuard::new(&project).unwrap();
        assert!(matches!(
            guard.validate_path(&outside),
            Err(ProjectError::OutsideProject { .. })
        ));
    }

    #[test]
    fn test_validate_path_in_pods() {
        let dir = tempfile::tempdir().unwrap();
        let pod_file = dir.path().join("ios/Pods/Expo/AppDelegate.swift");
        touch(&pod_file);

        let guard = ProjectGuard::new(dir.path()).unwrap();
        assert!(matches!(
            guard.validate_path(&pod_file),
            Err(ProjectError::ForbiddenPath { .. })
        ));
    }

    #[test]
    #[cfg(unix)]
    fn test_validate_symlink_escape() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("app");
        fs::create_dir_all(project.join("ios")).unwrap();
        let outside = dir.path().join("outside.swift");
        touch(&outside);
        let link = project.join("ios/AppDelegate.swift");
        symlink(&outside, &link).unwrap();

        let guard = ProjectGuard::new(&project).unwrap();
        assert!(matches!(
            guard.validate_path(&link),
            Err(ProjectError::OutsideProject { .. })
        ));
    }
}
