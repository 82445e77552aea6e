//! FILENAME: core/pivot-table/src/engine.rs
//! Pivot Engine - turns flat records into a header tree and aggregated rows.
//!
//! Algorithm:
//! 1. Validate the configuration and seed the header with row-dimension leaves
//! 2. For each record, in input order:
//!    - locate (or create) its row group via the grouping strategy
//!    - locate (or create) its column path in the header tree
//!    - fold its measures into the group's cells at that path
//! 3. Backfill every row with the default value for leaves it never received

use crate::aggregate::{fold_record, DefaultTemplate};
use crate::definition::PivotConfig;
use crate::error::Result;
use crate::grouping::{strategy_for, GroupTable, GroupingStrategy};
use crate::header::HeaderBuilder;
use crate::logging::{log_enter, log_exit, CAT_PIVOT};
use crate::value::{records_from_json, RecordSource};
use crate::view::{PivotCell, PivotRow, PivotTable};

// ============================================================================
// PIVOT CALCULATOR
// ============================================================================

/// Incremental form of the transform: feed records, then `finish`.
pub struct PivotCalculator<'a> {
    config: &'a PivotConfig,
    header: HeaderBuilder,
    groups: GroupTable,
    template: DefaultTemplate,
    strategy: Box<dyn GroupingStrategy>,
    records_seen: usize,
}

impl<'a> PivotCalculator<'a> {
    /// Validates `config` and seeds the row-dimension header entries.
    pub fn new(config: &'a PivotConfig) -> Result<Self> {
        config.validate()?;
        Ok(PivotCalculator {
            config,
            header: HeaderBuilder::new(&config.row_dimensions),
            groups: GroupTable::default(),
            template: DefaultTemplate::default(),
            strategy: strategy_for(config.sort_rows),
            records_seen: 0,
        })
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Folds one record into its row group and column path.
    pub fn consume<R: RecordSource>(&mut self, record: &R) {
        let record: &dyn RecordSource = record;
        let config = self.config;

        let (group_id, _) = self
            .strategy
            .locate(&mut self.groups, &config.row_dimensions, record);
        let parent = self.header.locate_column_path(&config.column_dimensions, record);
        let leaves = self.header.measure_leaves(parent, &config.measures);

        let group = self.groups.get_mut(group_id);
        fold_record(&mut group.cells, &leaves, &config.measures, record, &mut self.template);
        self.records_seen += 1;
    }

    /// Runs the default fill and freezes the result.
    pub fn finish(self) -> PivotTable {
        let leaves: Vec<_> = self
            .header
            .leaf_order()
            .into_iter()
            .filter(|&leaf| self.template.contains(leaf))
            .map(|leaf| (leaf, self.header.leaf_key(leaf).to_string()))
            .collect();

        let default_value = &self.config.default_value;
        let rows: Vec<PivotRow> = self
            .groups
            .into_ordered()
            .into_iter()
            .map(|group| {
                let cells = leaves
                    .iter()
                    .map(|(leaf, key)| {
                        let cell = match group.cells.get(leaf) {
                            Some(measure) => PivotCell::Measure(*measure),
                            None => PivotCell::Default(default_value.clone()),
                        };
                        (key.clone(), cell)
                    })
                    .collect();
                PivotRow {
                    dimensions: group.dimensions,
                    cells,
                }
            })
            .collect();

        PivotTable::new(
            self.header.finish(),
            rows,
            self.config.row_dimensions.len(),
            self.config.header_field_names.clone(),
        )
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Main entry point: runs the whole transform over `records`.
pub fn calculate_pivot<R: RecordSource>(records: &[R], config: &PivotConfig) -> Result<PivotTable> {
    let mut calculator = PivotCalculator::new(config)?;
    log_enter!(
        CAT_PIVOT,
        "calculate_pivot",
        "records={} strategy={}",
        records.len(),
        calculator.strategy_name()
    );

    for record in records {
        calculator.consume(record);
    }

    let records_seen = calculator.records_seen;
    let table = calculator.finish();
    log_exit!(
        CAT_PIVOT,
        "calculate_pivot",
        "records={} rows={} leaves={}",
        records_seen,
        table.rows().len(),
        table.leaf_keys().len()
    );
    Ok(table)
}

/// JSON entry point: a records array and a camelCase configuration object.
pub fn calculate_pivot_json(records_json: &str, config_json: &str) -> Result<PivotTable> {
    let config = PivotConfig::from_json(config_json)?;
    let records = records_from_json(records_json)?;
    calculate_pivot(&records, &config)
}
