//! Link and attribute catalogs built from listing responses.
//!
//! - [`LinkTable`] / [`build_link_table`] - Links of a group, optionally with subgroup subtrees
//! - [`AttributeTable`] / [`build_attribute_table`] - Attributes of an object
//! - [`traverse_links`] / [`traverse_attributes`] - Ordered visitation with early stop

mod attribute;
mod link;
mod traverse;

pub use attribute::*;
pub use link::*;
pub use traverse::*;

/// Key a table is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexType {
    /// Server order (alphabetical)
    #[default]
    Name,
    /// Creation timestamp, oldest first
    CreationOrder,
}

/// Direction of a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IterOrder {
    #[default]
    Increasing,
    Decreasing,
}

/// Behavior shared by link and attribute entries.
pub trait CatalogEntry: Sized {
    fn name(&self) -> &str;

    /// Creation timestamp in seconds.
    fn created(&self) -> f64;

    /// Nested table to descend into after this entry.
    fn subtree(&self) -> Option<&Table<Self>> {
        None
    }
}

/// Ordered, owned sequence of catalog entries.
///
/// Nested subtrees are owned by their parent entry and dropped with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<E> {
    entries: Vec<E>,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<E: CatalogEntry> Table<E> {
    pub fn new(entries: Vec<E>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&E> {
        self.entries.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&E> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Entry `n` counted in `order`.
    pub fn entry_by_index(&self, order: IterOrder, n: usize) -> Option<&E> {
        match order {
            IterOrder::Increasing => self.entries.get(n),
            IterOrder::Decreasing => self
                .entries
                .len()
                .checked_sub(n + 1)
                .and_then(|i| self.entries.get(i)),
        }
    }

    /// Reorder for `index`. The server already returns name order.
    pub(crate) fn sort_by_index(&mut self, index: IndexType) {
        if index == IndexType::CreationOrder {
            self.entries.sort_by(|a, b| a.created().total_cmp(&b.created()));
        }
    }
}

impl<'a, E> IntoIterator for &'a Table<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<E> IntoIterator for Table<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
