use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::warn;
use uuid::Uuid;

/// Which scratch paths a job needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchLayout {
    /// Only the `.typ` input file.
    File,
    /// The input file plus an empty directory for per-page output.
    FileAndPages,
}

/// Root directory under which every compile job gets private scratch paths.
///
/// Cloning is cheap; clones share the same root.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: Arc<PathBuf>,
}

impl Workspace {
    /// Creates the root directory if needed. Called once at startup.
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserves fresh paths for one job. Paths are derived from a random
    /// UUID so concurrent jobs never collide.
    pub fn acquire(&self, layout: ScratchLayout) -> io::Result<ScratchHandle> {
        let id = Uuid::new_v4();
        let input = self.root.join(format!("{id}.typ"));
        let pages_dir = match layout {
            ScratchLayout::File => None,
            ScratchLayout::FileAndPages => {
                let dir = self.root.join(format!("pages_{id}"));
                fs::create_dir(&dir)?;
                Some(dir)
            }
        };

        Ok(ScratchHandle {
            id,
            input,
            pages_dir,
            released: false,
        })
    }
}

/// Scratch paths owned by a single job. Dropping the handle releases them.
#[derive(Debug)]
pub struct ScratchHandle {
    id: Uuid,
    input: PathBuf,
    pages_dir: Option<PathBuf>,
    released: bool,
}

impl ScratchHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn input_path(&self) -> &Path {
        &self.input
    }

    pub fn pages_dir(&self) -> Option<&Path> {
        self.pages_dir.as_deref()
    }

    /// Removes the input file and page directory. Safe to call repeatedly;
    /// paths that are already gone are ignored and other failures are only
    /// logged.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(err) = fs::remove_file(&self.input)
            && err.kind() != ErrorKind::NotFound
        {
            warn!(
                target = "application::compile::workspace",
                op = "scratch::release",
                job_id = %self.id,
                path = %self.input.display(),
                error = %err,
                "Failed to remove scratch input"
            );
        }

        if let Some(dir) = &self.pages_dir
            && let Err(err) = fs::remove_dir_all(dir)
            && err.kind() != ErrorKind::NotFound
        {
            warn!(
                target = "application::compile::workspace",
                op = "scratch::release",
                job_id = %self.id,
                path = %dir.display(),
                error = %err,
                "Failed to remove scratch page directory"
            );
        }
    }
}

impl Drop for ScratchHandle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_makes_missing_root() {
        let dir = TempDir::new().expect("temp dir");
        let root = dir.path().join("nested").join("scratch");
        let workspace = Workspace::create(&root).expect("workspace");
        assert!(workspace.root().is_dir());
    }

    #[test]
    fn acquire_reserves_unique_paths() {
        let dir = TempDir::new().expect("temp dir");
        let workspace = Workspace::create(dir.path()).expect("workspace");

        let first = workspace
            .acquire(ScratchLayout::FileAndPages)
            .expect("first");
        let second = workspace
            .acquire(ScratchLayout::FileAndPages)
            .expect("second");

        assert_ne!(first.id(), second.id());
        assert_ne!(first.input_path(), second.input_path());
        assert_ne!(first.pages_dir(), second.pages_dir());
        assert!(first.pages_dir().expect("pages dir").is_dir());
        assert_eq!(
            first.input_path().extension().and_then(|ext| ext.to_str()),
            Some("typ")
        );
    }

    #[test]
    fn file_layout_has_no_pages_dir() {
        let dir = TempDir::new().expect("temp dir");
        let workspace = Workspace::create(dir.path()).expect("workspace");
        let handle = workspace.acquire(ScratchLayout::File).expect("handle");
        assert!(handle.pages_dir().is_none());
    }

    #[test]
    fn release_removes_everything_and_is_idempotent() {
        let dir = TempDir::new().expect("temp dir");
        let workspace = Workspace::create(dir.path()).expect("workspace");
        let mut handle = workspace
            .acquire(ScratchLayout::FileAndPages)
            .expect("handle");
        let pages_dir = handle.pages_dir().expect("pages dir").to_path_buf();
        fs::write(handle.input_path(), "= Title").expect("write input");
        fs::write(pages_dir.join("page1.svg"), "<svg/>").expect("write page");

        handle.release();
        handle.release();

        assert!(!handle.input_path().exists());
        assert!(!pages_dir.exists());
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn release_tolerates_missing_paths() {
        let dir = TempDir::new().expect("temp dir");
        let workspace = Workspace::create(dir.path()).expect("workspace");
        let mut handle = workspace
            .acquire(ScratchLayout::FileAndPages)
            .expect("handle");
        fs::remove_dir_all(handle.pages_dir().expect("pages dir")).expect("remove");

        handle.release();
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn dropping_the_handle_releases_it() {
        let dir = TempDir::new().expect("temp dir");
        let workspace = Workspace::create(dir.path()).expect("workspace");
        {
            let handle = workspace
                .acquire(ScratchLayout::FileAndPages)
                .expect("handle");
            fs::write(handle.input_path(), "= Title").expect("write input");
        }
        assert_eq!(fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }
}
