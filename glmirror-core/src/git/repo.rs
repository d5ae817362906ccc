//! Inspection of repositories that already exist on disk

use std::path::{Path, PathBuf};

use git2::{BranchType, Repository};

use crate::{Error, Result};

/// An existing local mirror
pub struct LocalRepo {
    repo: Repository,
    root: PathBuf,
}

impl std::fmt::Debug for LocalRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRepo")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl LocalRepo {
    /// Open the repository whose work tree is exactly `path`.
    ///
    /// Unlike discovery this does not search parent directories, so a mirror
    /// root that itself lives inside a checkout is not mistaken for a project.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let repo = Repository::open(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                Error::Config(format!("Not a git repository: {}", path.display()))
            } else {
                Error::Git(e)
            }
        })?;

        Ok(Self {
            repo,
            root: path.to_path_buf(),
        })
    }

    /// Check whether `path` is the root of a git repository
    pub fn is_repo(path: impl AsRef<Path>) -> bool {
        Repository::open(path.as_ref()).is_ok()
    }

    /// Get the repository root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of all local branches
    pub fn local_branches(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            if let Some(name) = branch.name()? {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}
