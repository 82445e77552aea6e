//! FILENAME: tests/common/mod.rs
//! Fixtures for pivot-table integration tests.

#![allow(dead_code)]

use pivot_table::{
    Dimension, FieldValue, HeaderFieldNames, HeaderNode, Measure, PivotConfig, PivotRow, Record,
};

/// Order lines for a product/colour/date pivot.
pub struct OrderFixture;

impl OrderFixture {
    /// (productId, productName, colorNumber, colorName, orderDate, quantity, price)
    pub fn data() -> Vec<(&'static str, &'static str, &'static str, &'static str, &'static str, f64, f64)> {
        vec![
            ("2", "商品2", "a", "颜色-a", "2022-4-1", 160.0, 1000.0),
            ("1", "商品1", "b", "颜色-b", "2022-4-1", 110.0, 800.0),
            ("1", "商品1", "a", "颜色-a", "2022-4-2", 100.0, 900.0),
            ("2", "商品2", "a", "颜色-a", "2022-4-1", 200.0, 2000.0),
            ("0", "商品", "c", "颜色-c", "2022-4-2", 222.0, 888.0),
        ]
    }

    pub fn records() -> Vec<Record> {
        Self::data()
            .into_iter()
            .map(|(pid, pname, cid, cname, date, quantity, price)| {
                record(&[
                    ("productId", FieldValue::text(pid)),
                    ("productName", FieldValue::text(pname)),
                    ("colorNumber", FieldValue::text(cid)),
                    ("colorName", FieldValue::text(cname)),
                    ("orderDate", FieldValue::text(date)),
                    ("quantity", FieldValue::from(quantity)),
                    ("price", FieldValue::from(price)),
                ])
            })
            .collect()
    }

    pub fn row_dimensions() -> Vec<Dimension> {
        vec![
            Dimension::new("productId", "productName", "商品"),
            Dimension::new("colorNumber", "colorName", "颜色"),
        ]
    }

    pub fn measures() -> Vec<Measure> {
        vec![Measure::mean("quantity", "数量"), Measure::sum("price", "价格")]
    }

    /// Sorted rows, date columns, "-" default, title/dataIndex header names.
    pub fn config() -> PivotConfig {
        PivotConfig::new(Self::row_dimensions(), Self::measures())
            .with_column_dimensions(vec![Dimension::single("orderDate", "日期")])
            .with_header_field_names(HeaderFieldNames {
                display: "title".to_string(),
                data_key: "dataIndex".to_string(),
                ..HeaderFieldNames::default()
            })
            .with_default_value("-")
            .with_sort_rows(true)
    }
}

pub fn record(fields: &[(&str, FieldValue)]) -> Record {
    fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Display text of every node at one level.
pub fn labels(nodes: &[HeaderNode]) -> Vec<String> {
    nodes.iter().map(|n| n.display.display_text()).collect()
}

/// Display text of `field` in each row.
pub fn column(rows: &[PivotRow], field: &str) -> Vec<String> {
    rows.iter()
        .map(|row| row.get(field).map(|v| v.display_text()).unwrap_or_default())
        .collect()
}

/// Deterministic permutation: rotates left by `by`.
pub fn rotate<T: Clone>(items: &[T], by: usize) -> Vec<T> {
    let mut out = items.to_vec();
    if !out.is_empty() {
        let k = by % out.len();
        out.rotate_left(k);
    }
    out
}
