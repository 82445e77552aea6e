//! FILENAME: core/pivot-table/src/aggregate.rs
//! Aggregation Engine - per-cell accumulation and the default template.
//!
//! A cell is one (row group x measure leaf) intersection. Each cell keeps its
//! sample count next to its value, so a running mean always satisfies
//! `value == running_sum / sample_count`.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::definition::{Aggregation, Measure};
use crate::header::NodeId;
use crate::value::{coerce_number, RecordSource};

// ============================================================================
// MEASURE CELL
// ============================================================================

/// Aggregated state of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasureCell {
    pub value: f64,
    pub sample_count: u32,
    pub aggregation: Aggregation,
}

impl MeasureCell {
    /// Starts a cell from its first contribution.
    pub fn new(value: f64, aggregation: Aggregation) -> Self {
        MeasureCell {
            value,
            sample_count: 1,
            aggregation,
        }
    }

    /// Folds one more contribution into the cell. NaN propagates.
    pub fn add(&mut self, value: f64) {
        self.sample_count += 1;
        match self.aggregation {
            Aggregation::Sum => self.value += value,
            Aggregation::Mean => {
                let n = self.sample_count as f64;
                self.value = (self.value * (n - 1.0) + value) / n;
            }
        }
    }

    /// The hidden `-count` value: present only for means with several samples.
    pub fn hidden_count(&self) -> Option<u32> {
        match self.aggregation {
            Aggregation::Mean if self.sample_count > 1 => Some(self.sample_count),
            _ => None,
        }
    }
}

/// Cells of one row group, keyed by measure leaf.
pub type CellMap = FxHashMap<NodeId, MeasureCell>;

// ============================================================================
// DEFAULT TEMPLATE
// ============================================================================

/// Every measure leaf that received a value in at least one group.
#[derive(Debug, Clone, Default)]
pub struct DefaultTemplate {
    registered: FxHashSet<NodeId>,
}

impl DefaultTemplate {
    pub fn register(&mut self, leaf: NodeId) {
        self.registered.insert(leaf);
    }

    pub fn contains(&self, leaf: NodeId) -> bool {
        self.registered.contains(&leaf)
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

/// Folds one record into a group's cells, one leaf per measure.
/// `leaves` must be in measure-configuration order.
pub fn fold_record<R: RecordSource + ?Sized>(
    cells: &mut CellMap,
    leaves: &[NodeId],
    measures: &[Measure],
    record: &R,
    template: &mut DefaultTemplate,
) {
    for (&leaf, measure) in leaves.iter().zip(measures) {
        let value = coerce_number(record.field(&measure.key));
        match cells.get_mut(&leaf) {
            Some(cell) => cell.add(value),
            None => {
                template.register(leaf);
                cells.insert(leaf, MeasureCell::new(value, measure.calculate));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{FieldValue, Record};

    #[test]
    fn test_sum_accumulates() {
        let mut cell = MeasureCell::new(1000.0, Aggregation::Sum);
        cell.add(2000.0);
        assert_eq!(cell.value, 3000.0);
        assert_eq!(cell.sample_count, 2);
        assert_eq!(cell.hidden_count(), None);
    }

    #[test]
    fn test_mean_of_two() {
        let mut cell = MeasureCell::new(160.0, Aggregation::Mean);
        assert_eq!(cell.hidden_count(), None);
        cell.add(200.0);
        assert_eq!(cell.value, 180.0);
        assert_eq!(cell.hidden_count(), Some(2));
    }

    #[test]
    fn test_mean_of_many_is_arithmetic_mean() {
        let mut cell = MeasureCell::new(10.0, Aggregation::Mean);
        for v in [20.0, 30.0, 40.0] {
            cell.add(v);
        }
        assert_eq!(cell.value, 25.0);
        assert_eq!(cell.hidden_count(), Some(4));
    }

    #[test]
    fn test_nan_propagates() {
        let mut cell = MeasureCell::new(5.0, Aggregation::Sum);
        cell.add(f64::NAN);
        cell.add(1.0);
        assert!(cell.value.is_nan());
    }

    #[test]
    fn test_fold_record_registers_leaves() {
        let measures = vec![Measure::sum("price", "Price"), Measure::mean("qty", "Qty")];
        let mut record = Record::new();
        record.insert("price".to_string(), FieldValue::from(10));
        record.insert("qty".to_string(), FieldValue::text("4"));

        let mut cells = CellMap::default();
        let mut template = DefaultTemplate::default();
        fold_record(&mut cells, &[7, 8], &measures, &record, &mut template);
        fold_record(&mut cells, &[7, 8], &measures, &record, &mut template);

        assert_eq!(template.len(), 2);
        assert!(template.contains(7) && template.contains(8));
        assert_eq!(cells[&7].value, 20.0);
        assert_eq!(cells[&8].value, 4.0);
        assert_eq!(cells[&8].sample_count, 2);
    }

    #[test]
    fn test_missing_measure_field_is_nan() {
        let measures = vec![Measure::sum("price", "Price")];
        let mut cells = CellMap::default();
        let mut template = DefaultTemplate::default();
        fold_record(&mut cells, &[0], &measures, &Record::new(), &mut template);
        assert!(cells[&0].value.is_nan());
    }
}
