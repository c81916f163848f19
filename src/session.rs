use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::repo::paths;
use crate::repo::TreeNode;

/// Which repository and branch a session browses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl RepoSpec {
    /// Parse an `owner/repo` argument.
    pub fn parse(value: &str, branch: &str) -> Result<Self> {
        let (owner, repo) = parse_owner_repo(value).map_err(AppError::InvalidRepo)?;
        if branch.trim().is_empty() {
            return Err(AppError::InvalidRepo("branch must not be empty".into()));
        }
        Ok(Self {
            owner,
            repo,
            branch: branch.trim().to_string(),
        })
    }

    /// Name of the local cache directory for this repository and branch.
    pub fn cache_dir_name(&self) -> String {
        format!("{}_{}_{}_ghc", self.owner, self.repo, self.branch)
    }

    /// `owner/repo#branch`, as printed during startup.
    pub fn label(&self) -> String {
        format!("{}/{}#{}", self.owner, self.repo, self.branch)
    }
}

/// Split `owner/repo` into its two non-empty halves.
///
/// Also validates the `-i` argument for clap, hence the `String` error.
pub fn parse_owner_repo(value: &str) -> std::result::Result<(String, String), String> {
    let mut parts = value.trim().split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(format!("expected <owner>/<repo>, got `{}`", value)),
    }
}

/// Mutable state of one shell session.
#[derive(Debug, Clone)]
pub struct SessionState {
    root_path: PathBuf,
    current_path: PathBuf,
    display_prefix: String,
}

impl SessionState {
    /// Create a session rooted at an existing local directory.
    pub fn new(spec: &RepoSpec, root_path: PathBuf) -> Self {
        let root_path = paths::normalize(&root_path);
        Self {
            current_path: root_path.clone(),
            root_path,
            display_prefix: format!("∆ {}/{} [{}] ", spec.owner, spec.repo, spec.branch),
        }
    }

    /// Create the cache directory for `spec` under `cache_root` and start a
    /// session there.
    pub fn init(spec: &RepoSpec, cache_root: &Path) -> Result<Self> {
        let cache_root = if cache_root.is_absolute() {
            cache_root.to_path_buf()
        } else {
            std::env::current_dir()?.join(cache_root)
        };
        let root = cache_root.join(spec.cache_dir_name());
        fs::create_dir_all(&root).map_err(|e| AppError::cache_io(&root, e))?;
        log::debug!("session root at {}", root.display());
        Ok(Self::new(spec, root))
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    /// Current directory relative to the repository root, `""` at the root.
    pub fn relative_dir(&self) -> String {
        self.current_path
            .strip_prefix(&self.root_path)
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    /// The information line shown above each prompt.
    pub fn prompt_label(&self) -> String {
        format!("{}{}", self.display_prefix, self.relative_dir())
    }

    /// Resolve user input to an absolute local path and its tree segments.
    pub fn locate(&self, input: &str) -> Result<(PathBuf, Vec<String>)> {
        let absolute = paths::to_absolute(input, &self.current_path);
        let segments = paths::to_tree_segments(&absolute, &self.root_path)?;
        Ok((paths::to_local(&self.root_path, &segments), segments))
    }

    /// Change the current directory.
    ///
    /// The target must be a directory of `tree` inside the root. Its local
    /// mirror directory is created before the move.
    pub fn change_dir(&mut self, tree: &TreeNode, input: &str) -> Result<()> {
        let (local, segments) = self.locate(input)?;
        let node = tree.resolve(&segments)?;
        if !node.is_dir() {
            return Err(AppError::NotADirectory(input.trim().to_string()));
        }
        // Fails when a non-directory is in the way of the mirror path.
        fs::create_dir_all(&local).map_err(|e| AppError::cache_io(&local, e))?;
        self.current_path = local;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::RemoteEntry;
    use tempfile::TempDir;

    fn spec() -> RepoSpec {
        RepoSpec::parse("octo/hello", "main").unwrap()
    }

    fn tree() -> TreeNode {
        TreeNode::build(&[
            RemoteEntry::file("a/b.txt", "loc:b"),
            RemoteEntry::file("a/c/d.txt", "loc:d"),
        ])
        .unwrap()
    }

    #[test]
    fn parse_owner_repo_accepts_two_parts() {
        assert_eq!(
            parse_owner_repo("octo/hello").unwrap(),
            ("octo".to_string(), "hello".to_string())
        );
    }

    #[test]
    fn parse_owner_repo_rejects_malformed() {
        for bad in ["octo", "octo/", "/hello", "a/b/c", ""] {
            assert!(parse_owner_repo(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn repo_spec_names() {
        let spec = spec();
        assert_eq!(spec.cache_dir_name(), "octo_hello_main_ghc");
        assert_eq!(spec.label(), "octo/hello#main");
    }

    #[test]
    fn init_creates_cache_dir() {
        let dir = TempDir::new().unwrap();
        let session = SessionState::init(&spec(), dir.path()).unwrap();
        assert!(session.root_path().is_dir());
        assert!(session.root_path().ends_with("octo_hello_main_ghc"));
        assert_eq!(session.current_path(), session.root_path());
    }

    #[test]
    fn prompt_label_tracks_current_dir() {
        let dir = TempDir::new().unwrap();
        let mut session = SessionState::init(&spec(), dir.path()).unwrap();
        assert_eq!(session.prompt_label(), "∆ octo/hello [main] ");
        session.change_dir(&tree(), "a/c").unwrap();
        assert_eq!(session.prompt_label(), "∆ octo/hello [main] a/c");
    }

    #[test]
    fn cd_creates_local_directory() {
        let dir = TempDir::new().unwrap();
        let mut session = SessionState::init(&spec(), dir.path()).unwrap();
        session.change_dir(&tree(), "a").unwrap();
        assert!(session.root_path().join("a").is_dir());
        assert_eq!(session.current_path(), session.root_path().join("a"));
    }

    #[test]
    fn cd_onto_local_file_keeps_current_dir() {
        let dir = TempDir::new().unwrap();
        let mut session = SessionState::init(&spec(), dir.path()).unwrap();
        fs::write(session.root_path().join("a"), "").unwrap();
        let err = session.change_dir(&tree(), "a").unwrap_err();
        assert!(matches!(err, AppError::CacheIo { .. }));
        assert_eq!(session.current_path(), session.root_path());
        assert!(session.current_path().is_dir());
    }

    #[test]
    fn cd_parent_of_root_is_out_of_bounds() {
        let dir = TempDir::new().unwrap();
        let mut session = SessionState::init(&spec(), dir.path()).unwrap();
        let err = session.change_dir(&tree(), "..").unwrap_err();
        assert!(matches!(err, AppError::OutOfBounds(_)));
        assert_eq!(session.current_path(), session.root_path());
    }

    #[test]
    fn cd_dot_keeps_current_dir() {
        let dir = TempDir::new().unwrap();
        let mut session = SessionState::init(&spec(), dir.path()).unwrap();
        session.change_dir(&tree(), "a").unwrap();
        let before = session.current_path().to_path_buf();
        session.change_dir(&tree(), ".").unwrap();
        assert_eq!(session.current_path(), before);
    }

    #[test]
    fn cd_into_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut session = SessionState::init(&spec(), dir.path()).unwrap();
        let err = session.change_dir(&tree(), "a/b.txt").unwrap_err();
        assert!(matches!(err, AppError::NotADirectory(_)));
    }

    #[test]
    fn cd_missing_dir_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut session = SessionState::init(&spec(), dir.path()).unwrap();
        let err = session.change_dir(&tree(), "nope/deeper").unwrap_err();
        assert!(matches!(err, AppError::NotFound(name) if name == "nope"));
        assert!(!session.root_path().join("nope").exists());
    }

    #[test]
    fn cd_absolute_path_inside_root() {
        let dir = TempDir::new().unwrap();
        let mut session = SessionState::init(&spec(), dir.path()).unwrap();
        let target = session.root_path().join("a").join("c");
        session
            .change_dir(&tree(), &target.display().to_string())
            .unwrap();
        assert_eq!(session.relative_dir(), "a/c");
        session.change_dir(&tree(), "../..").unwrap();
        assert_eq!(session.relative_dir(), "");
    }
}
