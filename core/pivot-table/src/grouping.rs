//! FILENAME: core/pivot-table/src/grouping.rs
//! Grouping Engine - partitions records into row groups.
//!
//! Two strategies share one seam:
//! - `AdjacencyGrouping`: single pass, a record extends the current group only
//!   when its identity matches. Non-adjacent repeats become separate rows, so
//!   callers must pre-group their input.
//! - `SortedInsertionGrouping`: identity lookup merges every occurrence and
//!   new groups are spliced in at their sorted position (O(n^2) worst case).

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::aggregate::CellMap;
use crate::definition::Dimension;
use crate::logging::{log_trace, CAT_GROUP};
use crate::value::{compare_display, FieldValue, IdentityKey, KeyValue, RecordSource};

/// Index of a group in the `GroupTable` arena.
pub type GroupId = usize;

// ============================================================================
// ROW GROUP
// ============================================================================

/// One output row under construction.
#[derive(Debug, Clone)]
pub struct RowGroup {
    /// Identity value per row dimension.
    pub identity: IdentityKey,

    /// (field, value) pairs copied from the first record: `id` then `key` per
    /// row dimension, with `key` skipped when it names the same field.
    pub dimensions: Vec<(String, FieldValue)>,

    /// Display text per row dimension, used for sorted insertion.
    display: SmallVec<[String; 4]>,

    pub cells: CellMap,
}

impl RowGroup {
    /// Creates a group from the first record seen for its identity.
    pub fn from_record(row_dimensions: &[Dimension], record: &dyn RecordSource) -> Self {
        let mut identity = IdentityKey::new();
        let mut dimensions = Vec::with_capacity(row_dimensions.len() * 2);
        let mut display = SmallVec::new();

        for dim in row_dimensions {
            let id_value = record.field(&dim.id);
            identity.push(KeyValue::of(id_value));
            dimensions.push((dim.id.clone(), id_value.cloned().unwrap_or_default()));

            let key_value = record.field(&dim.key).cloned().unwrap_or_default();
            display.push(key_value.display_text());
            if dim.key != dim.id {
                dimensions.push((dim.key.clone(), key_value));
            }
        }

        RowGroup {
            identity,
            dimensions,
            display,
            cells: CellMap::default(),
        }
    }

    /// Whether `record` carries this group's identity tuple.
    pub fn matches(&self, row_dimensions: &[Dimension], record: &dyn RecordSource) -> bool {
        row_dimensions
            .iter()
            .zip(&self.identity)
            .all(|(dim, key)| key.matches(record.field(&dim.id)))
    }

    /// Lexicographic, case-insensitive comparison of display values,
    /// outermost dimension first.
    pub fn compare_display(&self, other: &RowGroup) -> Ordering {
        for (a, b) in self.display.iter().zip(&other.display) {
            match compare_display(a, b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

// ============================================================================
// GROUP TABLE
// ============================================================================

/// Group arena plus the output order.
#[derive(Debug, Clone, Default)]
pub struct GroupTable {
    groups: Vec<RowGroup>,
    order: Vec<GroupId>,
}

impl GroupTable {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get_mut(&mut self, id: GroupId) -> &mut RowGroup {
        &mut self.groups[id]
    }

    /// The group appended or inserted most recently at the tail of the order.
    pub fn last(&self) -> Option<(GroupId, &RowGroup)> {
        self.order.last().map(|&id| (id, &self.groups[id]))
    }

    /// Groups in output order.
    pub fn iter(&self) -> impl Iterator<Item = &RowGroup> {
        self.order.iter().map(move |&id| &self.groups[id])
    }

    /// Consumes the table, yielding groups in output order.
    pub fn into_ordered(self) -> Vec<RowGroup> {
        let mut slots: Vec<Option<RowGroup>> = self.groups.into_iter().map(Some).collect();
        self.order.iter().filter_map(|&id| slots[id].take()).collect()
    }

    fn push(&mut self, group: RowGroup) -> GroupId {
        let id = self.groups.len();
        self.groups.push(group);
        self.order.push(id);
        id
    }

    /// Places `group` before the first existing group it sorts strictly
    /// before; ties land after the groups they equal.
    fn insert_sorted(&mut self, group: RowGroup) -> GroupId {
        let position = self
            .order
            .iter()
            .position(|&existing| group.compare_display(&self.groups[existing]) == Ordering::Less)
            .unwrap_or(self.order.len());

        let id = self.groups.len();
        self.groups.push(group);
        self.order.insert(position, id);
        id
    }
}

// ============================================================================
// STRATEGIES
// ============================================================================

/// Decides which group a record folds into.
pub trait GroupingStrategy {
    fn name(&self) -> &'static str;

    /// Returns the group for `record`, creating and placing a new one when
    /// the record starts a group. The second value is `true` for new groups.
    fn locate(
        &mut self,
        table: &mut GroupTable,
        row_dimensions: &[Dimension],
        record: &dyn RecordSource,
    ) -> (GroupId, bool);
}

/// Order-preserving grouping of contiguous records.
#[derive(Debug, Default)]
pub struct AdjacencyGrouping;

impl GroupingStrategy for AdjacencyGrouping {
    fn name(&self) -> &'static str {
        "adjacency"
    }

    fn locate(
        &mut self,
        table: &mut GroupTable,
        row_dimensions: &[Dimension],
        record: &dyn RecordSource,
    ) -> (GroupId, bool) {
        if let Some((id, current)) = table.last() {
            if current.matches(row_dimensions, record) {
                return (id, false);
            }
        }

        let group = RowGroup::from_record(row_dimensions, record);
        log_trace!(CAT_GROUP, "start group {:?}", group.identity);
        (table.push(group), true)
    }
}

/// Globally merging grouping that keeps rows sorted by display values.
///
/// Groups are looked up by typed identity, not by the joined text of their
/// `id` values: `"2"` and `2` stay separate rows, where a string-keyed
/// lookup would merge them. An absent `id` and a null `id` are one group.
#[derive(Debug, Default)]
pub struct SortedInsertionGrouping {
    lookup: FxHashMap<IdentityKey, GroupId>,
}

impl GroupingStrategy for SortedInsertionGrouping {
    fn name(&self) -> &'static str {
        "sorted-insertion"
    }

    fn locate(
        &mut self,
        table: &mut GroupTable,
        row_dimensions: &[Dimension],
        record: &dyn RecordSource,
    ) -> (GroupId, bool) {
        let identity: IdentityKey = row_dimensions
            .iter()
            .map(|dim| KeyValue::of(record.field(&dim.id)))
            .collect();

        if let Some(&id) = self.lookup.get(&identity) {
            return (id, false);
        }

        let group = RowGroup::from_record(row_dimensions, record);
        log_trace!(CAT_GROUP, "insert group {:?}", group.identity);
        let id = table.insert_sorted(group);
        self.lookup.insert(identity, id);
        (id, true)
    }
}

/// Picks the strategy for the `sortRows` flag.
pub fn strategy_for(sort_rows: bool) -> Box<dyn GroupingStrategy> {
    if sort_rows {
        Box::new(SortedInsertionGrouping::default())
    } else {
        Box::new(AdjacencyGrouping)
    }
}
