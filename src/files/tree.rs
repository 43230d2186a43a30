use super::path;
use crate::error::{GatewayError, GatewayResult};
use crate::sandbox::shell;
use serde::Serialize;
use std::collections::HashMap;

pub const MIN_DEPTH: u8 = 1;
pub const MAX_DEPTH: u8 = 10;
pub const DEFAULT_DEPTH: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Always `Some` for directories, `None` for files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

pub fn validate_depth(depth: u8) -> GatewayResult<u8> {
    if (MIN_DEPTH..=MAX_DEPTH).contains(&depth) {
        Ok(depth)
    } else {
        Err(GatewayError::validation(format!(
            "depth must be between {} and {}",
            MIN_DEPTH, MAX_DEPTH
        )))
    }
}

/// `find` invocation printing `<d|f> <path>` per entry, dot entries excluded.
pub fn listing_command(root: &str, depth: u8) -> String {
    format!(
        "find {} -maxdepth {} -not -path '*/.*' -printf '%y %p\\n' 2>/dev/null; true",
        shell::quote(root),
        depth
    )
}

fn parse_line(line: &str) -> Option<(NodeType, String)> {
    let line = line.trim_end_matches('\r');
    let (type_char, abs_path) = line.split_once(' ')?;
    if type_char.chars().count() != 1 || !abs_path.starts_with('/') {
        return None;
    }
    let node_type = if type_char == "d" {
        NodeType::Directory
    } else {
        NodeType::File
    };
    let abs_path = path::normalize(abs_path).ok()?;
    Some((node_type, abs_path))
}

struct Slot {
    path: String,
    node_type: NodeType,
    children: Vec<usize>,
    linked: bool,
}

fn materialize(slots: &[Slot], idx: usize) -> FileNode {
    let slot = &slots[idx];
    FileNode {
        name: path::file_name(&slot.path).to_string(),
        path: slot.path.clone(),
        node_type: slot.node_type,
        children: match slot.node_type {
            NodeType::Directory => Some(
                slot.children
                    .iter()
                    .map(|&child| materialize(slots, child))
                    .collect(),
            ),
            NodeType::File => None,
        },
    }
}

/// Rebuild the hierarchy of a flat listing and return the entries under `root`.
///
/// Nodes land in an arena keyed by path first, parent links are resolved in a
/// second pass, so the listing may arrive in any order. Siblings keep listing
/// order. When `root` is absent from the listing, every node without a listed
/// parent is returned instead.
pub fn build(raw_listing: &str, root: &str) -> Vec<FileNode> {
    let mut slots: Vec<Slot> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (node_type, abs_path) in raw_listing.lines().filter_map(parse_line) {
        let slot = Slot {
            path: abs_path.clone(),
            node_type,
            children: Vec::new(),
            linked: false,
        };
        match index.get(&abs_path) {
            Some(&existing) => slots[existing] = slot,
            None => {
                index.insert(abs_path, slots.len());
                slots.push(slot);
            }
        }
    }

    for idx in 0..slots.len() {
        let parent = path::parent(&slots[idx].path).to_string();
        if parent == slots[idx].path {
            continue;
        }
        if let Some(&parent_idx) = index.get(&parent) {
            if slots[parent_idx].node_type == NodeType::Directory {
                slots[parent_idx].children.push(idx);
                slots[idx].linked = true;
            }
        }
    }

    let root = path::normalize(root).unwrap_or_else(|_| root.to_string());
    match index.get(&root) {
        Some(&root_idx) => slots[root_idx]
            .children
            .iter()
            .map(|&child| materialize(&slots, child))
            .collect(),
        None => (0..slots.len())
            .filter(|&idx| !slots[idx].linked)
            .map(|idx| materialize(&slots, idx))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "d /workspace\nf /workspace/a.txt\nd /workspace/sub\nf /workspace/sub/b.txt\n";

    #[test]
    fn test_nested_tree_from_listing() {
        let tree = build(LISTING, "/workspace");
        assert_eq!(tree.len(), 2);

        assert_eq!(tree[0].name, "a.txt");
        assert_eq!(tree[0].path, "/workspace/a.txt");
        assert_eq!(tree[0].node_type, NodeType::File);
        assert!(tree[0].children.is_none());

        assert_eq!(tree[1].name, "sub");
        assert_eq!(tree[1].node_type, NodeType::Directory);
        let children = tree[1].children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "b.txt");
        assert_eq!(children[0].path, "/workspace/sub/b.txt");
    }

    #[test]
    fn test_children_before_parents() {
        let reversed: Vec<&str> = LISTING.lines().rev().collect();
        let tree = build(&reversed.join("\n"), "/workspace");
        assert_eq!(tree.len(), 2);
        let sub = tree.iter().find(|n| n.name == "sub").unwrap();
        assert_eq!(sub.children.as_ref().unwrap()[0].name, "b.txt");
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let raw = "d /workspace\ngarbage\n\nf relative/path\n... [output truncated]\nf /workspace/ok.txt\n";
        let tree = build(raw, "/workspace");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "ok.txt");
    }

    #[test]
    fn test_missing_root_falls_back_to_top_level() {
        let raw = "f /workspace/a.txt\nd /workspace/sub\nf /workspace/sub/b.txt\n";
        let tree = build(raw, "/workspace");
        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "sub"]);
    }

    #[test]
    fn test_filesystem_root_is_not_its_own_child() {
        let raw = "d /\nd /workspace\nf /workspace/a.txt\n";
        let tree = build(raw, "/");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "workspace");
    }

    #[test]
    fn test_unknown_type_char_is_file() {
        let tree = build("d /workspace\nl /workspace/link\n", "/workspace");
        assert_eq!(tree[0].node_type, NodeType::File);
    }

    #[test]
    fn test_file_node_serialization() {
        let tree = build(LISTING, "/workspace");
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json[0]["type"], "file");
        assert!(json[0].get("children").is_none());
        assert_eq!(json[1]["type"], "directory");
        assert_eq!(json[1]["children"][0]["name"], "b.txt");
    }

    #[test]
    fn test_depth_bounds() {
        assert!(validate_depth(0).is_err());
        assert!(validate_depth(11).is_err());
        assert_eq!(validate_depth(10).unwrap(), 10);
    }

    #[test]
    fn test_listing_command_shape() {
        assert_eq!(
            listing_command("/workspace", 3),
            "find /workspace -maxdepth 3 -not -path '*/.*' -printf '%y %p\\n' 2>/dev/null; true"
        );
    }
}
