//! Line items ⋈ sales ⋈ products ⋈ customers.
//!
//! Every join uses a hash lookup on the right table keyed by the canonical
//! form of the join column. After each join an explicit field selection
//! keeps the first column carrying a given name, so overlapping fields never
//! produce ambiguous duplicates.

use std::collections::{HashMap, HashSet};

use log::{debug, error, info, warn};

use crate::{
    config::DEFAULT_CUSTOMER_LABEL,
    data::canonical_key,
    model::{
        CATEGORIA, CATEGORIA_REDEFINIDA, FusedRecord, ID_CLIENTE, ID_PRODUCTO, ID_VENTA,
        NOMBRE_CLIENTE, NOMBRE_CLIENTE_FINAL,
    },
    normalize::uppercase,
    rules::DEFAULT_CATEGORY,
    table::Table,
};

#[derive(Debug, Clone)]
pub struct FusionOptions {
    pub default_customer_label: String,
    pub default_category: String,
}

impl Default for FusionOptions {
    fn default() -> Self {
        Self {
            default_customer_label: DEFAULT_CUSTOMER_LABEL.to_string(),
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

/// The denormalized sales table. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct FusedTable {
    table: Table,
    records: Vec<FusedRecord>,
}

impl FusedTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_table(table: Table) -> Self {
        let records = FusedRecord::from_table(&table);
        Self { table, records }
    }

    /// Every column that survived the joins, as strings.
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn records(&self) -> &[FusedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.table.has_column(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinMode {
    /// Drop left rows without a partner.
    Inner,
    /// Keep left rows without a partner, with blank right-hand fields.
    Left,
}

pub fn fuse(
    lines: &Table,
    sales: &Table,
    products: &Table,
    customers: &Table,
    options: &FusionOptions,
) -> FusedTable {
    if lines.is_empty() || sales.is_empty() {
        error!(
            "Cannot fuse: need sale lines and sales, got {} line(s) and {} sale(s)",
            lines.row_count(),
            sales.row_count()
        );
        return FusedTable::empty();
    }
    if !lines.has_column(ID_VENTA) || !sales.has_column(ID_VENTA) {
        error!("Cannot fuse: both sale lines and sales need an '{ID_VENTA}' column");
        return FusedTable::empty();
    }

    let with_sales = join(lines, sales, ID_VENTA, JoinMode::Inner, "sales");
    let with_products = join_optional(&with_sales, products, ID_PRODUCTO, "products");
    let joined = join_optional(&with_products, customers, ID_CLIENTE, "customers");

    let mut fused = dedupe_columns(&joined);
    let customer_names = derive_column(&fused, NOMBRE_CLIENTE, &options.default_customer_label, |v| {
        v.to_string()
    });
    fused.set_column(NOMBRE_CLIENTE_FINAL, customer_names);
    let categories = derive_column(&fused, CATEGORIA, &options.default_category, |v| {
        uppercase(v).into_owned()
    });
    fused.set_column(CATEGORIA_REDEFINIDA, categories);

    info!(
        "Fused {} row(s) across {} column(s)",
        fused.row_count(),
        fused.column_count()
    );
    FusedTable::from_table(fused)
}

fn join_optional(left: &Table, right: &Table, key: &str, label: &str) -> Table {
    if right.column_count() == 0 {
        warn!("No {label} data; their fields will be blank");
        return left.clone();
    }
    if !left.has_column(key) || !right.has_column(key) {
        warn!("Skipping {label} join: '{key}' column missing");
        return left.clone();
    }
    join(left, right, key, JoinMode::Left, label)
}

fn join(left: &Table, right: &Table, key: &str, mode: JoinMode, label: &str) -> Table {
    let (Some(left_key), Some(right_key)) = (left.column_index(key), right.column_index(key))
    else {
        return left.clone();
    };

    let lookup = build_right_lookup(right, right_key, label);
    let right_columns = select_right_columns(left.headers(), right.headers(), right_key);

    let mut headers = left.headers().to_vec();
    headers.extend(right_columns.iter().map(|&i| right.headers()[i].clone()));

    let mut rows = Vec::with_capacity(left.row_count());
    let (mut matched, mut unmatched) = (0usize, 0usize);
    for row in left.rows() {
        let partner = canonical_key(&row[left_key]).and_then(|k| lookup.get(&k).copied());
        match (partner, mode) {
            (Some(right_idx), _) => {
                matched += 1;
                let right_row = &right.rows()[right_idx];
                let mut combined = row.clone();
                combined.extend(right_columns.iter().map(|&i| right_row[i].clone()));
                rows.push(combined);
            }
            (None, JoinMode::Left) => {
                unmatched += 1;
                let mut combined = row.clone();
                combined.extend(right_columns.iter().map(|_| String::new()));
                rows.push(combined);
            }
            (None, JoinMode::Inner) => unmatched += 1,
        }
    }

    match mode {
        JoinMode::Inner if unmatched > 0 => {
            warn!("Dropped {unmatched} row(s) with no matching {label} on '{key}'")
        }
        JoinMode::Left if unmatched > 0 => {
            warn!("{unmatched} row(s) have no matching {label} on '{key}'")
        }
        _ => {}
    }
    debug!("Joined {label} on '{key}': {matched} matched, {unmatched} unmatched");
    Table::new(headers, rows)
}

/// Maps canonical key → first right row carrying it.
fn build_right_lookup(right: &Table, key_idx: usize, label: &str) -> HashMap<String, usize> {
    let mut map = HashMap::with_capacity(right.row_count());
    let mut duplicates = 0usize;
    for (idx, row) in right.rows().iter().enumerate() {
        let Some(key) = canonical_key(&row[key_idx]) else {
            continue;
        };
        if map.contains_key(&key) {
            duplicates += 1;
        } else {
            map.insert(key, idx);
        }
    }
    if duplicates > 0 {
        warn!("{duplicates} duplicate key(s) in {label}; first occurrence used");
    }
    map
}

/// Right-hand columns to carry over: not the join key, and not a name the
/// left side (or an earlier right column) already provides.
fn select_right_columns(left: &[String], right: &[String], right_key: usize) -> Vec<usize> {
    let mut seen: HashSet<&str> = left.iter().map(String::as_str).collect();
    let mut selected = Vec::new();
    for (idx, name) in right.iter().enumerate() {
        if idx == right_key {
            continue;
        }
        if seen.insert(name.as_str()) {
            selected.push(idx);
        } else {
            debug!("Dropping duplicate column '{name}' from join");
        }
    }
    selected
}

/// Keeps the first column for every header name.
pub fn dedupe_columns(table: &Table) -> Table {
    let mut seen = HashSet::new();
    let keep = table
        .headers()
        .iter()
        .enumerate()
        .filter(|&(_, name)| seen.insert(name.as_str()))
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    if keep.len() == table.column_count() {
        return table.clone();
    }
    table.select(&keep)
}

fn derive_column<F>(table: &Table, source: &str, default: &str, transform: F) -> Vec<String>
where
    F: Fn(&str) -> String,
{
    match table.column(source) {
        Some(values) => values
            .map(|v| {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    default.to_string()
                } else {
                    transform(trimmed)
                }
            })
            .collect(),
        None => vec![default.to_string(); table.row_count()],
    }
}
