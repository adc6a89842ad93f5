use std::fmt;

use super::Node;

/// Position of a node in the tree: child indices from the document's
/// children down to the node.
///
/// Paths order lexicographically, which is document (pre-)order: a parent
/// sorts before its descendants and a left sibling before its right sibling.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index of the node among its siblings.
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn parent(&self) -> Option<Path> {
        let (_, init) = self.0.split_last()?;
        Some(Path(init.to_vec()))
    }

    /// Path of the preceding sibling, `None` for a first child.
    pub fn previous(&self) -> Option<Path> {
        let (last, init) = self.0.split_last()?;
        let prev = last.checked_sub(1)?;
        let mut indices = init.to_vec();
        indices.push(prev);
        Some(Path(indices))
    }

    pub fn next(&self) -> Option<Path> {
        let (last, init) = self.0.split_last()?;
        let mut indices = init.to_vec();
        indices.push(last + 1);
        Some(Path(indices))
    }

    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Path(indices)
    }

    /// True when `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Where `self` ends up after `count` nodes are inserted at `at`.
    pub fn transform_insert(&self, at: &Path, count: usize) -> Path {
        let Some((&idx, parent)) = at.0.split_last() else {
            return self.clone();
        };
        let depth = parent.len();
        let mut indices = self.0.clone();
        if indices.len() > depth && indices.starts_with(parent) && indices[depth] >= idx {
            indices[depth] += count;
        }
        Path(indices)
    }

    /// Where `self` ends up after the node at `at` is removed. `None` when
    /// `self` went with it.
    pub fn transform_remove(&self, at: &Path) -> Option<Path> {
        if self == at || at.is_ancestor_of(self) {
            return None;
        }
        let Some((&idx, parent)) = at.0.split_last() else {
            return Some(self.clone());
        };
        let depth = parent.len();
        let mut indices = self.0.clone();
        if indices.len() > depth && indices.starts_with(parent) && indices[depth] > idx {
            indices[depth] -= 1;
        }
        Some(Path(indices))
    }

    /// Where `self` ends up after the node at `from` is moved to `to`, with
    /// `to` given as the position once `from` has been removed.
    pub fn transform_move(&self, from: &Path, to: &Path) -> Path {
        match self.transform_remove(from) {
            Some(path) => path.transform_insert(to, 1),
            None => {
                let mut indices = to.0.clone();
                indices.extend_from_slice(&self.0[from.0.len()..]);
                Path(indices)
            }
        }
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indices: [usize; N]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{idx}")?;
        }
        write!(f, "]")
    }
}

/// Looks up the node at `path` below `roots`. Out-of-range paths yield `None`.
pub fn node_at<'a>(roots: &'a [Node], path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let mut node = roots.get(*first)?;
    for idx in rest {
        node = node.children()?.get(*idx)?;
    }
    Some(node)
}

pub fn node_at_mut<'a>(roots: &'a mut [Node], path: &[usize]) -> Option<&'a mut Node> {
    let (first, rest) = path.split_first()?;
    let mut node = roots.get_mut(*first)?;
    for idx in rest {
        node = node.children_mut()?.get_mut(*idx)?;
    }
    Some(node)
}

/// The children vector that holds the node at `path`, plus its index there.
pub fn siblings_mut<'a>(
    roots: &'a mut Vec<Node>,
    path: &[usize],
) -> Option<(&'a mut Vec<Node>, usize)> {
    let (last, init) = path.split_last()?;
    if init.is_empty() {
        return Some((roots, *last));
    }
    let parent = node_at_mut(roots, init)?;
    Some((parent.children_mut()?, *last))
}
