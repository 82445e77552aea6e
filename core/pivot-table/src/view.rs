//! FILENAME: core/pivot-table/src/view.rs
//! Pivot View - Renderable output for a table component.
//!
//! The header is a fixed node shape (`HeaderNode`); the caller's property
//! names from `HeaderFieldNames` are applied only when rendering to JSON.
//! Rows keep aggregate cells typed until they are flattened.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::aggregate::MeasureCell;
use crate::definition::HeaderFieldNames;
use crate::value::FieldValue;

/// Suffix of the hidden sample-count field of a mean cell.
pub const COUNT_SUFFIX: &str = "-count";

// ============================================================================
// HEADER
// ============================================================================

/// One node of the output header tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderNode {
    /// Unique path of the node (the field name itself for row-dimension leaves).
    pub path_key: String,

    /// Label shown in the header.
    pub display: FieldValue,

    /// Row field holding this leaf's values. Set on leaves only.
    pub data_key: Option<String>,

    /// Nested nodes. Set on column-dimension nodes only.
    pub children: Option<Vec<HeaderNode>>,
}

impl HeaderNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Renders the node (and its subtree) with the caller's property names.
    pub fn render(&self, names: &HeaderFieldNames) -> Value {
        let mut object = Map::new();
        object.insert(names.key.clone(), Value::String(self.path_key.clone()));
        object.insert(names.display.clone(), field_to_json(&self.display));
        if let Some(data_key) = &self.data_key {
            object.insert(names.data_key.clone(), Value::String(data_key.clone()));
        }
        if let Some(children) = &self.children {
            let rendered = children.iter().map(|child| child.render(names)).collect();
            object.insert(names.children.clone(), Value::Array(rendered));
        }
        Value::Object(object)
    }

    fn collect_data_keys<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.children {
            Some(children) => {
                for child in children {
                    child.collect_data_keys(out);
                }
            }
            None => {
                if let Some(key) = &self.data_key {
                    out.push(key);
                }
            }
        }
    }
}

fn field_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Empty => Value::Null,
        // Non-finite numbers have no JSON form; from_f64 yields None for them.
        FieldValue::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Boolean(b) => Value::Bool(*b),
        FieldValue::Other(v) => v.clone(),
    }
}

// ============================================================================
// ROWS
// ============================================================================

/// A cell of an output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PivotCell {
    /// Aggregated from at least one record.
    Measure(MeasureCell),
    /// No record contributed; holds the configured default.
    Default(FieldValue),
}

impl PivotCell {
    pub fn value(&self) -> FieldValue {
        match self {
            PivotCell::Measure(cell) => FieldValue::Number(cell.value),
            PivotCell::Default(value) => value.clone(),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, PivotCell::Default(_))
    }
}

/// One output row: the group's dimension values plus one cell per leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    /// `id` then `key` field per row dimension, outermost first.
    pub dimensions: Vec<(String, FieldValue)>,

    /// Leaf key -> cell, in header leaf order.
    pub cells: Vec<(String, PivotCell)>,
}

impl PivotRow {
    pub fn cell(&self, leaf_key: &str) -> Option<&PivotCell> {
        self.cells.iter().find(|(key, _)| key == leaf_key).map(|(_, cell)| cell)
    }

    /// Looks a field up the way a flat row map would answer, including the
    /// hidden `{leaf}-count` fields of mean cells.
    pub fn get(&self, field: &str) -> Option<FieldValue> {
        if let Some((_, value)) = self.dimensions.iter().find(|(name, _)| name == field) {
            return Some(value.clone());
        }
        if let Some(cell) = self.cell(field) {
            return Some(cell.value());
        }
        let leaf_key = field.strip_suffix(COUNT_SUFFIX)?;
        match self.cell(leaf_key)? {
            PivotCell::Measure(cell) => cell.hidden_count().map(|n| FieldValue::Number(n as f64)),
            PivotCell::Default(_) => None,
        }
    }

    /// Leaf keys of this row, in header order.
    pub fn leaf_keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(key, _)| key.as_str())
    }

    /// Flattens into the field-name -> value mapping.
    pub fn to_field_map(&self) -> BTreeMap<String, FieldValue> {
        let mut map = BTreeMap::new();
        for (name, value) in &self.dimensions {
            map.insert(name.clone(), value.clone());
        }
        for (key, cell) in &self.cells {
            map.insert(key.clone(), cell.value());
            if let PivotCell::Measure(measure) = cell {
                if let Some(count) = measure.hidden_count() {
                    map.insert(format!("{}{}", key, COUNT_SUFFIX), FieldValue::Number(count as f64));
                }
            }
        }
        map
    }

    pub fn render(&self) -> Value {
        let object: Map<String, Value> = self
            .to_field_map()
            .iter()
            .map(|(name, value)| (name.clone(), field_to_json(value)))
            .collect();
        Value::Object(object)
    }
}

impl Serialize for PivotRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.to_field_map();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in &fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ============================================================================
// MAIN VIEW STRUCT
// ============================================================================

/// The result of one pivot transform.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    header: Vec<HeaderNode>,
    rows: Vec<PivotRow>,
    row_leaf_count: usize,
    header_field_names: HeaderFieldNames,
}

impl PivotTable {
    pub(crate) fn new(
        header: Vec<HeaderNode>,
        rows: Vec<PivotRow>,
        row_leaf_count: usize,
        header_field_names: HeaderFieldNames,
    ) -> Self {
        PivotTable {
            header,
            rows,
            row_leaf_count,
            header_field_names,
        }
    }

    /// Row-dimension leaves first, then column subtrees or measure leaves.
    pub fn header(&self) -> &[HeaderNode] {
        &self.header
    }

    pub fn rows(&self) -> &[PivotRow] {
        &self.rows
    }

    pub fn header_field_names(&self) -> &HeaderFieldNames {
        &self.header_field_names
    }

    pub fn into_parts(self) -> (Vec<HeaderNode>, Vec<PivotRow>) {
        (self.header, self.rows)
    }

    /// Data keys of all measure leaves, in header order.
    pub fn leaf_keys(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for node in &self.header[self.row_leaf_count..] {
            node.collect_data_keys(&mut out);
        }
        out
    }

    pub fn render_header(&self) -> Value {
        Value::Array(
            self.header
                .iter()
                .map(|node| node.render(&self.header_field_names))
                .collect(),
        )
    }

    pub fn render_rows(&self) -> Value {
        Value::Array(self.rows.iter().map(PivotRow::render).collect())
    }

    /// `{"header": [...], "data": [...]}`
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("header".to_string(), self.render_header());
        object.insert("data".to_string(), self.render_rows());
        Value::Object(object)
    }
}

impl Serialize for PivotTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Aggregation;
    use serde_json::json;

    fn mean_row() -> PivotRow {
        let mut mean = MeasureCell::new(160.0, Aggregation::Mean);
        mean.add(200.0);
        PivotRow {
            dimensions: vec![
                ("productId".to_string(), FieldValue::text("2")),
                ("productName".to_string(), FieldValue::text("P2")),
            ],
            cells: vec![
                ("[d][1][quantity]".to_string(), PivotCell::Measure(mean)),
                ("[d][2][quantity]".to_string(), PivotCell::Default(FieldValue::text("-"))),
            ],
        }
    }

    #[test]
    fn test_row_get_includes_hidden_count() {
        let row = mean_row();
        assert_eq!(row.get("productName"), Some(FieldValue::text("P2")));
        assert_eq!(row.get("[d][1][quantity]"), Some(FieldValue::Number(180.0)));
        assert_eq!(row.get("[d][1][quantity]-count"), Some(FieldValue::Number(2.0)));
        assert_eq!(row.get("[d][2][quantity]"), Some(FieldValue::text("-")));
        assert_eq!(row.get("[d][2][quantity]-count"), None);
        assert_eq!(row.get("nothing"), None);
    }

    #[test]
    fn test_row_render() {
        assert_eq!(
            mean_row().render(),
            json!({
                "productId": "2",
                "productName": "P2",
                "[d][1][quantity]": 180.0,
                "[d][1][quantity]-count": 2.0,
                "[d][2][quantity]": "-",
            })
        );
    }

    #[test]
    fn test_row_serialize_matches_render() {
        let row = mean_row();
        assert_eq!(serde_json::to_value(&row).unwrap(), row.render());
    }

    #[test]
    fn test_header_render_with_custom_names() {
        let node = HeaderNode {
            path_key: "[d][1]".to_string(),
            display: FieldValue::text("1"),
            data_key: None,
            children: Some(vec![HeaderNode {
                path_key: "[d][1][m]".to_string(),
                display: FieldValue::text("M"),
                data_key: Some("[d][1][m]".to_string()),
                children: None,
            }]),
        };
        let names = HeaderFieldNames {
            display: "title".to_string(),
            data_key: "dataIndex".to_string(),
            ..HeaderFieldNames::default()
        };
        assert_eq!(
            node.render(&names),
            json!({
                "key": "[d][1]",
                "title": "1",
                "children": [{"key": "[d][1][m]", "title": "M", "dataIndex": "[d][1][m]"}],
            })
        );
    }

    #[test]
    fn test_nan_renders_as_null() {
        let row = PivotRow {
            dimensions: Vec::new(),
            cells: vec![(
                "[m]".to_string(),
                PivotCell::Measure(MeasureCell::new(f64::NAN, Aggregation::Sum)),
            )],
        };
        assert_eq!(row.render(), json!({"[m]": null}));
    }
}
