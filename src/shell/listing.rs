use crossterm::style::Stylize;

use crate::repo::tree::{ChildInfo, FlatItem};
use crate::repo::{EntryKind, TreeNode};

/// Lay out children in columns, directories in cyan.
///
/// Every column is as wide as the longest name plus three spaces; the number
/// of columns leaves a 10-column margin of the terminal `width`.
pub fn columns(children: &[ChildInfo<'_>], width: usize) -> String {
    let Some(max_len) = children.iter().map(|c| c.name.chars().count() + 3).max() else {
        return String::new();
    };
    let per_row = (width.saturating_sub(10) / max_len).max(1);

    let mut out = String::new();
    for (i, child) in children.iter().enumerate() {
        let padded = format!("{:<max_len$}", child.name);
        out.push_str(&paint(&padded, child.kind));
        if (i + 1) % per_row == 0 {
            out.push('\n');
        }
    }
    if children.len() % per_row != 0 {
        out.push('\n');
    }
    out
}

/// `ls -R`: one `path:` header plus column listing per directory.
pub fn recursive(node: &TreeNode, label: &str, width: usize) -> String {
    let mut sections = Vec::new();
    for (path, dir) in node.directories() {
        let header = match (label.is_empty(), path.is_empty()) {
            (true, true) => ".".to_string(),
            (true, false) => path,
            (false, true) => label.to_string(),
            (false, false) => format!("{}/{}", label, path),
        };
        let children = dir.list_children().unwrap_or_default();
        sections.push(format!("{}:\n{}", header, columns(&children, width)));
    }
    sections.join("\n")
}

/// `ls -T`: the subtree drawn with box-drawing connectors.
pub fn tree(node: &TreeNode, label: &str) -> String {
    let items = node.flatten();
    let mut out = format!("{}\n", paint(if label.is_empty() { "." } else { label }, EntryKind::Directory));
    for (i, item) in items.iter().enumerate() {
        let prefix = build_prefix(item, &items, i);
        out.push_str(&format!("{} {}\n", prefix, paint(&item.name, item.kind)));
    }
    let (dirs, files) = node.count();
    out.push_str(&format!("\n{} directories, {} files\n", dirs, files));
    out
}

/// Build the indentation prefix for an item.
///
/// Continuation lines depend on whether each ancestor was the last of its
/// siblings, found by walking backwards through the flattened list.
fn build_prefix(item: &FlatItem, items: &[FlatItem], item_index: usize) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for d in 1..item.depth {
        let mut ancestor_is_last = false;
        for j in (0..item_index).rev() {
            if items[j].depth == d {
                ancestor_is_last = items[j].is_last_sibling;
                break;
            }
            if items[j].depth < d {
                break;
            }
        }
        if ancestor_is_last {
            parts.push("   ");
        } else {
            parts.push("│  ");
        }
    }

    if item.is_last_sibling {
        parts.push("└──");
    } else {
        parts.push("├──");
    }

    parts.join("")
}

fn paint(text: &str, kind: EntryKind) -> String {
    match kind {
        EntryKind::Directory => text.cyan().to_string(),
        EntryKind::File => text.to_string(),
    }
}
