use std::collections::BTreeMap;

use crate::error::{AppError, Result};

/// Kind of a repository entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One entry of the flat listing returned by the remote tree API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Slash-separated path relative to the repository root.
    pub path: String,
    pub kind: EntryKind,
    /// Opaque locator used to download the entry's content.
    pub locator: String,
}

impl RemoteEntry {
    #[allow(dead_code)]
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            locator: String::new(),
        }
    }

    #[allow(dead_code)]
    pub fn file(path: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            locator: locator.into(),
        }
    }
}

/// Payload of a tree node. Files carry a locator and can never have children.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Directory(BTreeMap<String, TreeNode>),
    File { locator: String },
}

/// A node in the in-memory repository tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub kind: NodeKind,
}

/// A child as seen by listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildInfo<'a> {
    pub name: &'a str,
    pub kind: EntryKind,
}

/// A flattened representation of a tree node for tree-style rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatItem {
    pub name: String,
    pub kind: EntryKind,
    pub depth: usize,
    pub is_last_sibling: bool,
}

impl TreeNode {
    /// The synthetic, unnamed root directory.
    pub fn root() -> Self {
        Self::directory("")
    }

    fn directory(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: NodeKind::Directory(BTreeMap::new()),
        }
    }

    fn file(name: &str, locator: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: NodeKind::File {
                locator: locator.to_string(),
            },
        }
    }

    /// Build the tree from a flat entry list.
    ///
    /// Intermediate directories are created on demand, so listings that omit
    /// explicit directory entries still produce a complete hierarchy. The
    /// first inconsistent entry aborts the whole build.
    pub fn build(entries: &[RemoteEntry]) -> Result<TreeNode> {
        let mut root = TreeNode::root();
        for entry in entries {
            root.insert(entry)?;
        }
        log::debug!("built tree from {} entries", entries.len());
        Ok(root)
    }

    fn insert(&mut self, entry: &RemoteEntry) -> Result<()> {
        let segments: Vec<&str> = entry.path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(AppError::MalformedEntry("empty path".into()));
        };

        let mut node = self;
        for segment in parents {
            let children = match &mut node.kind {
                NodeKind::Directory(children) => children,
                NodeKind::File { .. } => {
                    return Err(AppError::MalformedEntry(format!(
                        "{} descends into a file",
                        entry.path
                    )))
                }
            };
            node = children
                .entry((*segment).to_string())
                .or_insert_with(|| TreeNode::directory(segment));
        }

        let NodeKind::Directory(children) = &mut node.kind else {
            return Err(AppError::MalformedEntry(format!(
                "{} descends into a file",
                entry.path
            )));
        };

        match (children.get(*last), entry.kind) {
            (None, EntryKind::Directory) => {
                children.insert((*last).to_string(), TreeNode::directory(last));
            }
            (None, EntryKind::File) => {
                children.insert((*last).to_string(), TreeNode::file(last, &entry.locator));
            }
            // Directories may be listed after their contents created them.
            (Some(existing), EntryKind::Directory) if existing.is_dir() => {}
            (Some(_), _) => {
                return Err(AppError::MalformedEntry(format!(
                    "{} conflicts with an existing entry",
                    entry.path
                )))
            }
        }
        Ok(())
    }

    pub fn entry_kind(&self) -> EntryKind {
        match self.kind {
            NodeKind::Directory(_) => EntryKind::Directory,
            NodeKind::File { .. } => EntryKind::File,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.entry_kind() == EntryKind::Directory
    }

    /// Content locator, present only for files.
    pub fn locator(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { locator } => Some(locator),
            NodeKind::Directory(_) => None,
        }
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        match &self.kind {
            NodeKind::Directory(children) => children.get(name),
            NodeKind::File { .. } => None,
        }
    }

    /// Walk `segments` down from this node. Empty segments are skipped.
    ///
    /// Fails with `NotFound` naming the first segment that does not exist.
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Result<&TreeNode> {
        let mut node = self;
        for segment in segments.iter().map(AsRef::as_ref) {
            if segment.is_empty() {
                continue;
            }
            node = node
                .child(segment)
                .ok_or_else(|| AppError::NotFound(segment.to_string()))?;
        }
        Ok(node)
    }

    /// Immediate children in stable (name) order.
    pub fn list_children(&self) -> Result<Vec<ChildInfo<'_>>> {
        match &self.kind {
            NodeKind::Directory(children) => Ok(children
                .values()
                .map(|child| ChildInfo {
                    name: &child.name,
                    kind: child.entry_kind(),
                })
                .collect()),
            NodeKind::File { .. } => Err(AppError::NotADirectory(self.name.clone())),
        }
    }

    /// Complete `prefix` against this node's children.
    ///
    /// Returns what the first matching child name adds beyond `prefix`, or an
    /// empty string when nothing matches or this node is a file.
    pub fn match_prefix(&self, prefix: &str) -> String {
        match &self.kind {
            NodeKind::Directory(children) => children
                .keys()
                .find(|name| name.starts_with(prefix))
                .map(|name| name[prefix.len()..].to_string())
                .unwrap_or_default(),
            NodeKind::File { .. } => String::new(),
        }
    }

    /// Depth-first flattening of the subtree below this node (this node excluded).
    pub fn flatten(&self) -> Vec<FlatItem> {
        let mut items = Vec::new();
        Self::flatten_children(self, 1, &mut items);
        items
    }

    fn flatten_children(node: &TreeNode, depth: usize, items: &mut Vec<FlatItem>) {
        if let NodeKind::Directory(children) = &node.kind {
            let count = children.len();
            for (i, child) in children.values().enumerate() {
                items.push(FlatItem {
                    name: child.name.clone(),
                    kind: child.entry_kind(),
                    depth,
                    is_last_sibling: i + 1 == count,
                });
                Self::flatten_children(child, depth + 1, items);
            }
        }
    }

    /// All directories of the subtree in pre-order, paired with their path
    /// relative to this node (`""` for this node itself).
    pub fn directories(&self) -> Vec<(String, &TreeNode)> {
        let mut dirs = Vec::new();
        Self::collect_directories(self, String::new(), &mut dirs);
        dirs
    }

    fn collect_directories<'a>(
        node: &'a TreeNode,
        path: String,
        dirs: &mut Vec<(String, &'a TreeNode)>,
    ) {
        let NodeKind::Directory(children) = &node.kind else {
            return;
        };
        dirs.push((path.clone(), node));
        for child in children.values().filter(|c| c.is_dir()) {
            let child_path = if path.is_empty() {
                child.name.clone()
            } else {
                format!("{}/{}", path, child.name)
            };
            Self::collect_directories(child, child_path, dirs);
        }
    }

    /// Number of `(directories, files)` below this node.
    pub fn count(&self) -> (usize, usize) {
        let mut dirs = 0;
        let mut files = 0;
        for item in self.flatten() {
            match item.kind {
                EntryKind::Directory => dirs += 1,
                EntryKind::File => files += 1,
            }
        }
        (dirs, files)
    }
}
