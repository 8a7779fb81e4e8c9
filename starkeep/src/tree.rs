//! Presentation trees over stored object paths.
//!
//! Trees are transient: rebuilt on every listing request, never persisted.

use std::collections::BTreeMap;

use serde::Serialize;

/// A node in a client's file tree.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// A single file.
    File {
        /// Full storage path (`<client-id>/<relative-path>`), usable with
        /// the download and delete endpoints.
        path: String,
    },
    /// A folder keyed by child name.
    Folder {
        /// Child nodes by name.
        children: BTreeMap<String, Node>,
    },
}

impl Node {
    /// A new, empty folder.
    #[must_use]
    pub fn folder() -> Self {
        Self::Folder {
            children: BTreeMap::new(),
        }
    }
}

/// Build a tree for one client from its relative paths. Produces the same
/// tree for a fixed set of paths regardless of input order.
pub fn build<'a>(
    client_id: &str,
    relative_paths: impl IntoIterator<Item = &'a str>,
) -> BTreeMap<String, Node> {
    let mut root = BTreeMap::new();

    for rel in relative_paths {
        insert(&mut root, rel, &format!("{client_id}/{rel}"));
    }

    root
}

fn insert(tree: &mut BTreeMap<String, Node>, rel: &str, full: &str) {
    match rel.split_once('/') {
        None => {
            if !rel.is_empty() {
                // last write wins if a folder and a file share a name
                tree.insert(
                    rel.to_owned(),
                    Node::File {
                        path: full.to_owned(),
                    },
                );
            }
        }
        Some((head, tail)) => {
            if head.is_empty() {
                insert(tree, tail, full);
                return;
            }

            let node = tree.entry(head.to_owned()).or_insert_with(Node::folder);

            if let Node::Folder { children } = node {
                insert(children, tail, full);
            } else {
                let mut children = BTreeMap::new();
                insert(&mut children, tail, full);
                *node = Node::Folder { children };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_folders() {
        let tree = build("abc", ["2024-01-01/report.pdf", "2024-01-01/logs/run.log"]);

        let Node::Folder { children } = &tree["2024-01-01"] else {
            panic!("expected a folder");
        };

        assert_eq!(
            children["report.pdf"],
            Node::File {
                path: "abc/2024-01-01/report.pdf".into()
            }
        );

        let Node::Folder { children: logs } = &children["logs"] else {
            panic!("expected a folder");
        };

        assert_eq!(
            logs["run.log"],
            Node::File {
                path: "abc/2024-01-01/logs/run.log".into()
            }
        );
    }

    #[test]
    fn order_does_not_matter() {
        let paths = ["a/b/c.txt", "a/d.txt", "e.txt"];
        let forward = build("abc", paths);
        let backward = build("abc", paths.into_iter().rev());

        assert_eq!(forward, backward);
    }

    #[test]
    fn file_folder_conflict_is_last_write_wins() {
        let tree = build("abc", ["name", "name/inner.txt"]);

        assert!(matches!(&tree["name"], Node::Folder { .. }));

        let tree = build("abc", ["name/inner.txt", "name"]);

        assert!(matches!(&tree["name"], Node::File { .. }));
    }

    #[test]
    fn serializes_with_type_tags() {
        let tree = build("abc", ["2024-01-01/report.pdf"]);
        let json = serde_json::to_value(&tree).unwrap();

        assert_eq!(json["2024-01-01"]["type"], "folder");
        assert_eq!(
            json["2024-01-01"]["children"]["report.pdf"]["path"],
            "abc/2024-01-01/report.pdf"
        );
    }
}
