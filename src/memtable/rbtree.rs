//! Red-black tree over byte-sequence keys
//!
//! Nodes live in a grow-only arena and link to each other by index,
//! which keeps parent links safe without reference counting. The tree
//! supports insert-or-replace and ordered iteration; structural removal
//! is never needed because deletions are stored as tombstone entries
//! and the whole tree is thrown away after a flush.

use std::cmp::Ordering;

use super::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug)]
struct Node {
    key: Vec<u8>,
    value: Entry,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
    color: Color,
}

/// Red-black tree mapping owned keys to entries.
///
/// Not safe for concurrent access; callers must synchronize externally
/// (the `MemTable` wrapper holds it behind an `RwLock`).
#[derive(Debug, Default)]
pub struct RbTree {
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl RbTree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert the key with the associated entry.
    ///
    /// If the key is already present the entry is replaced and the
    /// previous one returned. The key bytes are copied into the node so
    /// the caller may reuse its buffer afterwards.
    pub fn insert(&mut self, key: &[u8], value: Entry) -> Option<Entry> {
        // Empty tree: new node becomes the black root
        let Some(mut current) = self.root else {
            let idx = self.nodes.len();
            self.nodes.push(Node {
                key: key.to_vec(),
                value,
                parent: None,
                left: None,
                right: None,
                color: Color::Black,
            });
            self.root = Some(idx);
            return None;
        };

        // Standard BST descent by byte-lexicographic comparison
        let (parent, went_left) = loop {
            match key.cmp(&self.nodes[current].key) {
                Ordering::Equal => {
                    let prev = std::mem::replace(&mut self.nodes[current].value, value);
                    return Some(prev);
                }
                Ordering::Less => match self.nodes[current].left {
                    Some(left) => current = left,
                    None => break (current, true),
                },
                Ordering::Greater => match self.nodes[current].right {
                    Some(right) => current = right,
                    None => break (current, false),
                },
            }
        };

        let new = self.nodes.len();
        self.nodes.push(Node {
            key: key.to_vec(),
            value,
            parent: Some(parent),
            left: None,
            right: None,
            color: Color::Red,
        });
        if went_left {
            self.nodes[parent].left = Some(new);
        } else {
            self.nodes[parent].right = Some(new);
        }

        self.fix_after_insertion(new);
        None
    }

    /// Search the key and return a reference to its entry if present
    pub fn get(&self, key: &[u8]) -> Option<&Entry> {
        let mut current = self.root;
        while let Some(idx) = current {
            let node = &self.nodes[idx];
            match key.cmp(&node.key) {
                Ordering::Equal => return Some(&node.value),
                Ordering::Less => current = node.left,
                Ordering::Greater => current = node.right,
            }
        }
        None
    }

    /// Lazy ascending iterator over `(key, entry)` pairs
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    // =========================================================================
    // Red-black fix-up
    // =========================================================================

    /// Restore red-black invariants after inserting the red node `x`.
    ///
    /// Two cases per side, mirrored:
    /// - red uncle: recolor parent/uncle black and grandparent red, then
    ///   continue from the grandparent
    /// - black (or absent) uncle: rotate the inner configuration into an
    ///   outer one if needed, then recolor and rotate at the grandparent
    fn fix_after_insertion(&mut self, mut x: usize) {
        while let Some(parent) = self.nodes[x].parent {
            if self.nodes[parent].color == Color::Black {
                break;
            }
            // A red parent is never the root, so the grandparent exists
            let grandparent = self.nodes[parent].parent.unwrap();

            if Some(parent) == self.nodes[grandparent].left {
                let uncle = self.nodes[grandparent].right;
                if self.is_red(uncle) {
                    self.nodes[parent].color = Color::Black;
                    self.nodes[uncle.unwrap()].color = Color::Black;
                    self.nodes[grandparent].color = Color::Red;
                    x = grandparent;
                } else {
                    let mut parent = parent;
                    if Some(x) == self.nodes[parent].right {
                        x = parent;
                        self.rotate_left(x);
                        parent = self.nodes[x].parent.unwrap();
                    }
                    self.nodes[parent].color = Color::Black;
                    self.nodes[grandparent].color = Color::Red;
                    self.rotate_right(grandparent);
                }
            } else {
                let uncle = self.nodes[grandparent].left;
                if self.is_red(uncle) {
                    self.nodes[parent].color = Color::Black;
                    self.nodes[uncle.unwrap()].color = Color::Black;
                    self.nodes[grandparent].color = Color::Red;
                    x = grandparent;
                } else {
                    let mut parent = parent;
                    if Some(x) == self.nodes[parent].left {
                        x = parent;
                        self.rotate_right(x);
                        parent = self.nodes[x].parent.unwrap();
                    }
                    self.nodes[parent].color = Color::Black;
                    self.nodes[grandparent].color = Color::Red;
                    self.rotate_left(grandparent);
                }
            }
        }

        let root = self.root.unwrap();
        self.nodes[root].color = Color::Black;
    }

    fn is_red(&self, node: Option<usize>) -> bool {
        node.map_or(false, |idx| self.nodes[idx].color == Color::Red)
    }

    /// Left rotation around `x`: `x`'s right child takes its place
    fn rotate_left(&mut self, x: usize) {
        let y = self.nodes[x].right.unwrap();

        self.nodes[x].right = self.nodes[y].left;
        if let Some(left) = self.nodes[y].left {
            self.nodes[left].parent = Some(x);
        }

        self.replace_child(x, y);
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
    }

    /// Right rotation around `x`: `x`'s left child takes its place
    fn rotate_right(&mut self, x: usize) {
        let y = self.nodes[x].left.unwrap();

        self.nodes[x].left = self.nodes[y].right;
        if let Some(right) = self.nodes[y].right {
            self.nodes[right].parent = Some(x);
        }

        self.replace_child(x, y);
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
    }

    /// Point `x`'s parent (or the root) at `y` instead of `x`
    fn replace_child(&mut self, x: usize, y: usize) {
        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        match parent {
            None => self.root = Some(y),
            Some(p) if self.nodes[p].left == Some(x) => self.nodes[p].left = Some(y),
            Some(p) => self.nodes[p].right = Some(y),
        }
    }
}

/// In-order iterator over the tree.
///
/// Maintains the left spine of the remaining subtree on an explicit
/// stack; each `next` is amortized O(1).
pub struct Iter<'a> {
    tree: &'a RbTree,
    stack: Vec<usize>,
}

impl<'a> Iter<'a> {
    fn push_left_spine(&mut self, mut node: Option<usize>) {
        while let Some(idx) = node {
            self.stack.push(idx);
            node = self.tree.nodes[idx].left;
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a Entry);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.stack.pop()?;
        let node = &self.tree.nodes[idx];
        self.push_left_spine(node.right);
        Some((node.key.as_slice(), &node.value))
    }
}
