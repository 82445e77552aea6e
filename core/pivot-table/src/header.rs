//! FILENAME: core/pivot-table/src/header.rs
//! Header Builder - the column header tree under construction.
//!
//! Nodes live in an arena and refer to each other by index. The root list
//! starts with one leaf per row dimension; column-dimension subtrees follow,
//! each level sorted case-insensitively by display value, and the deepest
//! level (or the root, when no column dimensions exist) ends in one leaf per
//! measure.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::definition::{Dimension, Measure};
use crate::logging::{log_trace, CAT_HEADER};
use crate::value::{compare_display, FieldValue, IdentityKey, KeyValue, RecordSource};
use crate::view::HeaderNode;

/// Index of a node in the header arena.
pub type NodeId = usize;

/// Leaf ids for one parent, in measure-configuration order.
pub type MeasureLeaves = SmallVec<[NodeId; 4]>;

#[derive(Debug, Clone)]
struct ArenaNode {
    path_key: String,
    display: FieldValue,
    data_key: Option<String>,
    children: Option<Vec<NodeId>>,
    /// Measure leaves created under this node (empty until first attached).
    measure_leaves: MeasureLeaves,
}

/// Mutable header tree, frozen into `HeaderNode`s once all records are read.
#[derive(Debug, Clone, Default)]
pub struct HeaderBuilder {
    nodes: Vec<ArenaNode>,
    root: Vec<NodeId>,
    row_leaf_count: usize,
    root_measure_leaves: MeasureLeaves,
    /// Column path (identity text per level, outermost first) -> node.
    column_index: FxHashMap<IdentityKey, NodeId>,
}

impl HeaderBuilder {
    /// Creates the builder with one leaf per row dimension at the head of the root.
    pub fn new(row_dimensions: &[Dimension]) -> Self {
        let mut builder = HeaderBuilder::default();
        for dim in row_dimensions {
            let id = builder.push_node(ArenaNode {
                path_key: dim.key.clone(),
                display: FieldValue::text(dim.display.clone()),
                data_key: Some(dim.key.clone()),
                children: None,
                measure_leaves: MeasureLeaves::new(),
            });
            builder.root.push(id);
        }
        builder.row_leaf_count = row_dimensions.len();
        builder
    }

    /// Number of nodes created so far (all levels).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Finds or creates every column level for `record` and returns the
    /// deepest node, or `None` when there are no column dimensions.
    ///
    /// A column level is identified by the text form of its `id` value, the
    /// same text its path key renders. Values that print alike (`"1"` and
    /// `1`, null and an absent field) share one column.
    pub fn locate_column_path<R: RecordSource + ?Sized>(
        &mut self,
        column_dimensions: &[Dimension],
        record: &R,
    ) -> Option<NodeId> {
        let mut parent: Option<NodeId> = None;
        let mut path = IdentityKey::new();

        for dim in column_dimensions {
            let identity = record.field(&dim.id).map(FieldValue::display_text).unwrap_or_default();
            let segment = path_segment(&dim.key, &identity);
            path.push(KeyValue::Text(identity));

            let node_id = match self.column_index.get(&path) {
                Some(&existing) => existing,
                None => {
                    let path_key = match parent {
                        Some(p) => format!("{}{}", self.nodes[p].path_key, segment),
                        None => segment,
                    };
                    let display = record.field(&dim.key).cloned().unwrap_or_default();
                    log_trace!(CAT_HEADER, "create column node {}", path_key);

                    let id = self.push_node(ArenaNode {
                        path_key,
                        display,
                        data_key: None,
                        children: Some(Vec::new()),
                        measure_leaves: MeasureLeaves::new(),
                    });
                    self.insert_sorted(parent, id);
                    self.column_index.insert(path.clone(), id);
                    id
                }
            };
            parent = Some(node_id);
        }

        parent
    }

    /// Returns the measure leaves under `parent` (the root when `None`),
    /// creating them on the first visit.
    pub fn measure_leaves(&mut self, parent: Option<NodeId>, measures: &[Measure]) -> MeasureLeaves {
        let existing = match parent {
            Some(p) => &self.nodes[p].measure_leaves,
            None => &self.root_measure_leaves,
        };
        if !existing.is_empty() {
            return existing.clone();
        }

        let parent_key = parent.map(|p| self.nodes[p].path_key.clone()).unwrap_or_default();
        let mut leaves = MeasureLeaves::new();
        for measure in measures {
            let data_key = format!("{}[{}]", parent_key, escape_segment(&measure.key));
            let id = self.push_node(ArenaNode {
                path_key: data_key.clone(),
                display: FieldValue::text(measure.display.clone()),
                data_key: Some(data_key),
                children: None,
                measure_leaves: MeasureLeaves::new(),
            });
            match parent {
                Some(p) => {
                    if let Some(children) = self.nodes[p].children.as_mut() {
                        children.push(id);
                    }
                }
                None => self.root.push(id),
            }
            leaves.push(id);
        }

        match parent {
            Some(p) => self.nodes[p].measure_leaves = leaves.clone(),
            None => self.root_measure_leaves = leaves.clone(),
        }
        leaves
    }

    /// The row field name a leaf's values are stored under.
    pub fn leaf_key(&self, leaf: NodeId) -> &str {
        let node = &self.nodes[leaf];
        node.data_key.as_deref().unwrap_or(&node.path_key)
    }

    /// All measure leaves in header (depth-first, left-to-right) order.
    pub fn leaf_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for &id in &self.root[self.row_leaf_count..] {
            self.collect_leaves(id, &mut out);
        }
        out
    }

    /// Freezes the arena into an owned tree.
    pub fn finish(&self) -> Vec<HeaderNode> {
        self.root.iter().map(|&id| self.freeze(id)).collect()
    }

    fn push_node(&mut self, node: ArenaNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    /// Inserts before the first sibling whose display is >= the new node's,
    /// never displacing the row-dimension leaves at the head of the root.
    fn insert_sorted(&mut self, parent: Option<NodeId>, id: NodeId) {
        let display = self.nodes[id].display.display_text();
        let nodes = &self.nodes;
        let (list, start) = match parent {
            Some(p) => match self.nodes[p].children.as_ref() {
                Some(children) => (children, 0),
                None => return,
            },
            None => (&self.root, self.row_leaf_count),
        };

        let position = list[start..]
            .iter()
            .position(|&sibling| {
                compare_display(&display, &nodes[sibling].display.display_text()).is_le()
            })
            .map_or(list.len(), |offset| start + offset);

        match parent {
            Some(p) => {
                if let Some(children) = self.nodes[p].children.as_mut() {
                    children.insert(position, id);
                }
            }
            None => self.root.insert(position, id),
        }
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match &self.nodes[id].children {
            Some(children) => {
                for &child in children {
                    self.collect_leaves(child, out);
                }
            }
            None => out.push(id),
        }
    }

    fn freeze(&self, id: NodeId) -> HeaderNode {
        let node = &self.nodes[id];
        HeaderNode {
            path_key: node.path_key.clone(),
            display: node.display.clone(),
            data_key: node.data_key.clone(),
            children: node
                .children
                .as_ref()
                .map(|children| children.iter().map(|&c| self.freeze(c)).collect()),
        }
    }
}

/// `[dimensionKey][identityValue]`, escaped.
fn path_segment(dimension_key: &str, identity: &str) -> String {
    format!("[{}][{}]", escape_segment(dimension_key), escape_segment(identity))
}

/// Backslash-escapes the path delimiters so rendered keys stay unambiguous.
/// Delimiter-free text passes through unchanged.
fn escape_segment(raw: &str) -> String {
    if !raw.contains(['[', ']', '\\']) {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len() + 4);
    for c in raw.chars() {
        if matches!(c, '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::text(*v)))
            .collect()
    }

    fn row_dims() -> Vec<Dimension> {
        vec![
            Dimension::new("productId", "productName", "Product"),
            Dimension::new("colorNumber", "colorName", "Color"),
        ]
    }

    #[test]
    fn test_row_leaves_seeded() {
        let builder = HeaderBuilder::new(&row_dims());
        let header = builder.finish();
        assert_eq!(header.len(), 2);
        assert_eq!(header[0].path_key, "productName");
        assert_eq!(header[0].data_key.as_deref(), Some("productName"));
        assert_eq!(header[0].display, FieldValue::text("Product"));
        assert!(header[1].children.is_none());
    }

    #[test]
    fn test_column_path_is_idempotent() {
        let mut builder = HeaderBuilder::new(&row_dims());
        let cols = vec![Dimension::single("orderDate", "Date")];
        let r = record(&[("orderDate", "2022-4-1")]);

        let first = builder.locate_column_path(&cols, &r);
        let count = builder.node_count();
        let second = builder.locate_column_path(&cols, &r);

        assert_eq!(first, second);
        assert_eq!(builder.node_count(), count);
    }

    #[test]
    fn test_column_siblings_sorted_after_row_leaves() {
        let mut builder = HeaderBuilder::new(&row_dims());
        let cols = vec![Dimension::single("region", "Region")];
        for region in ["south", "North", "east", "West"] {
            builder.locate_column_path(&cols, &record(&[("region", region)]));
        }

        let header = builder.finish();
        let labels: Vec<String> = header.iter().map(|n| n.display.display_text()).collect();
        assert_eq!(labels, vec!["Product", "Color", "east", "North", "south", "West"]);
    }

    #[test]
    fn test_nested_path_keys() {
        let mut builder = HeaderBuilder::new(&row_dims());
        let cols = vec![
            Dimension::new("yearId", "yearName", "Year"),
            Dimension::single("quarter", "Quarter"),
        ];
        let r = record(&[("yearId", "y22"), ("yearName", "2022"), ("quarter", "Q1")]);
        let deepest = builder.locate_column_path(&cols, &r).unwrap();
        let leaves = builder.measure_leaves(Some(deepest), &[Measure::sum("sales", "Sales")]);

        assert_eq!(builder.leaf_key(leaves[0]), "[yearName][y22][quarter][Q1][sales]");
        let header = builder.finish();
        let year = &header[2];
        assert_eq!(year.path_key, "[yearName][y22]");
        assert_eq!(year.display, FieldValue::text("2022"));
        let quarter = &year.children.as_ref().unwrap()[0];
        assert_eq!(quarter.path_key, "[yearName][y22][quarter][Q1]");
    }

    #[test]
    fn test_measure_leaves_created_once() {
        let mut builder = HeaderBuilder::new(&row_dims());
        let measures = vec![Measure::mean("quantity", "Qty"), Measure::sum("price", "Price")];

        let first = builder.measure_leaves(None, &measures);
        let second = builder.measure_leaves(None, &measures);
        assert_eq!(first, second);

        let header = builder.finish();
        assert_eq!(header.len(), 4);
        assert_eq!(header[2].data_key.as_deref(), Some("[quantity]"));
        assert_eq!(header[3].data_key.as_deref(), Some("[price]"));
    }

    #[test]
    fn test_delimiters_do_not_collide() {
        let mut builder = HeaderBuilder::new(&row_dims());
        let cols = vec![
            Dimension::single("a", "A"),
            Dimension::single("b", "B"),
        ];
        // Unescaped, both paths would render as "[a][x][b][y][b][z]".
        let one = builder.locate_column_path(&cols, &record(&[("a", "x][b][y"), ("b", "z")]));
        let two = builder.locate_column_path(&cols, &record(&[("a", "x"), ("b", "y][b][z")]));
        assert_ne!(one, two);

        let header = builder.finish();
        let keys: Vec<&str> = header[2..].iter().map(|n| n.path_key.as_str()).collect();
        assert!(keys.contains(&r"[a][x\]\[b\]\[y]"));
        assert!(keys.contains(&"[a][x]"));
    }

    #[test]
    fn test_values_printing_alike_share_a_column() {
        let mut builder = HeaderBuilder::new(&row_dims());
        let cols = vec![Dimension::single("d", "D")];
        let measures = vec![Measure::sum("v", "V")];

        let mut text_one = Record::new();
        text_one.insert("d".to_string(), FieldValue::text("1"));
        let mut number_one = Record::new();
        number_one.insert("d".to_string(), FieldValue::from(1));
        let mut null = Record::new();
        null.insert("d".to_string(), FieldValue::Empty);
        let absent = Record::new();

        let a = builder.locate_column_path(&cols, &text_one);
        let b = builder.locate_column_path(&cols, &number_one);
        assert_eq!(a, b);
        let c = builder.locate_column_path(&cols, &null);
        let d = builder.locate_column_path(&cols, &absent);
        assert_eq!(c, d);
        assert_ne!(a, c);

        for node in [a, c] {
            builder.measure_leaves(node, &measures);
        }
        let keys: Vec<&str> = builder
            .leaf_order()
            .into_iter()
            .map(|id| builder.leaf_key(id))
            .collect();
        assert_eq!(keys, vec!["[d][][v]", "[d][1][v]"]);
    }

    #[test]
    fn test_leaf_order_follows_header() {
        let mut builder = HeaderBuilder::new(&row_dims());
        let cols = vec![Dimension::single("d", "D")];
        let measures = vec![Measure::sum("m", "M")];
        for d in ["b", "a"] {
            let node = builder.locate_column_path(&cols, &record(&[("d", d)]));
            builder.measure_leaves(node, &measures);
        }
        let keys: Vec<&str> = builder
            .leaf_order()
            .into_iter()
            .map(|id| builder.leaf_key(id))
            .collect();
        assert_eq!(keys, vec!["[d][a][m]", "[d][b][m]"]);
    }
}
