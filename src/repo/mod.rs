//! Repository model: the in-memory tree and path resolution against it.

pub mod paths;
pub mod tree;

pub use tree::{EntryKind, RemoteEntry, TreeNode};
