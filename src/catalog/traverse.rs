//! Ordered traversal of catalog tables.

use super::{AttributeEntry, AttributeTable, CatalogEntry, IterOrder, LinkEntry, LinkTable, Table};
use crate::util::{Error, Result};

/// Returned by a visitor to continue or end the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl {
    Continue,
    Stop,
}

/// Result of a completed or stopped traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraverseOutcome {
    /// A visitor returned [`VisitControl::Stop`]
    pub stopped_early: bool,
    /// Top-level index of the last entry visited, `None` if nothing was
    pub last_index: Option<usize>,
}

/// Visit links in `order`, descending into subtrees pre-order.
///
/// The visitor receives the entry's path relative to the table's group
/// (`parent/child` for subtree entries). `start_index` defaults to the first
/// entry in `order`; in increasing order it may equal the table length to
/// resume past the end.
pub fn traverse_links<F>(
    table: &LinkTable,
    order: IterOrder,
    start_index: Option<usize>,
    mut visit: F,
) -> Result<TraverseOutcome>
where
    F: FnMut(&str, &LinkEntry) -> Result<VisitControl>,
{
    traverse(table, order, start_index, None, 0, &mut visit)
}

/// Visit attributes in `order`.
pub fn traverse_attributes<F>(
    table: &AttributeTable,
    order: IterOrder,
    start_index: Option<usize>,
    mut visit: F,
) -> Result<TraverseOutcome>
where
    F: FnMut(&str, &AttributeEntry) -> Result<VisitControl>,
{
    traverse(table, order, start_index, None, 0, &mut visit)
}

fn start_of<E: CatalogEntry>(table: &Table<E>, order: IterOrder, start_index: Option<usize>) -> Result<usize> {
    let len = table.len();
    match (order, start_index) {
        (IterOrder::Increasing, None) => Ok(0),
        (IterOrder::Increasing, Some(i)) if i <= len => Ok(i),
        (IterOrder::Decreasing, None) => Ok(len.saturating_sub(1)),
        (IterOrder::Decreasing, Some(i)) if i < len || (len == 0 && i == 0) => Ok(i),
        (_, Some(i)) => Err(Error::invalid(format!(
            "start index {i} out of range for {len} entries"
        ))),
    }
}

#[tracing::instrument(level = "trace", skip_all, fields(depth = depth))]
fn traverse<E, F>(
    table: &Table<E>,
    order: IterOrder,
    start_index: Option<usize>,
    prefix: Option<&str>,
    depth: usize,
    visit: &mut F,
) -> Result<TraverseOutcome>
where
    E: CatalogEntry,
    F: FnMut(&str, &E) -> Result<VisitControl>,
{
    let start = start_of(table, order, start_index)?;
    let indices: Box<dyn Iterator<Item = usize>> = match order {
        IterOrder::Increasing => Box::new(start..table.len()),
        IterOrder::Decreasing if table.is_empty() => Box::new(std::iter::empty()),
        IterOrder::Decreasing => Box::new((0..=start).rev()),
    };

    let mut outcome = TraverseOutcome::default();
    for i in indices {
        let Some(entry) = table.get(i) else { break };
        outcome.last_index = Some(i);

        let path = match prefix {
            Some(p) => format!("{p}/{}", entry.name()),
            None => entry.name().to_string(),
        };

        let control = visit(&path, entry).map_err(|source| Error::Visit {
            name: entry.name().to_string(),
            source: Box::new(source),
        })?;
        if control == VisitControl::Stop {
            outcome.stopped_early = true;
            return Ok(outcome);
        }

        if let Some(subtree) = entry.subtree() {
            let nested = traverse(subtree, order, None, Some(&path), depth + 1, visit)?;
            if nested.stopped_early {
                outcome.stopped_early = true;
                return Ok(outcome);
            }
        }
    }
    Ok(outcome)
}
