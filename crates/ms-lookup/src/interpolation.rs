//! Piecewise interpolation over categorical keys and one continuous
//! parameter.
//!
//! Rows are grouped by their categorical key values.  Each group becomes a
//! curve over the continuous parameter (or a single constant when there is
//! no parameter).
//!
//! | Order | Between knots          | Outside the knots     |
//! |-------|------------------------|-----------------------|
//! | 0     | value of the knot left | nearest end value     |
//! | 1     | linear                 | nearest end value     |

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::{DataTable, LookupError, LookupResult};

#[derive(Clone, Debug)]
enum Curve {
    Constant(f64),
    Knots { xs: Vec<f64>, ys: Vec<f64> },
}

#[derive(Clone, Debug)]
pub struct Interpolation {
    key_columns:  Vec<String>,
    parameter:    Option<String>,
    value_column: String,
    order:        u8,
    curves:       FxHashMap<Vec<String>, Curve>,
}

/// Canonical form of a categorical cell.  Numeric cells compare by value,
/// so `1`, `1.0` and `01` name the same group.
pub fn categorical_key(cell: &str) -> String {
    let cell = cell.trim();
    match cell.parse::<f64>() {
        Ok(n) if n.is_finite() => (n + 0.0).to_string(),
        _ => cell.to_string(),
    }
}

fn parse_f64(key: &str, row: usize, column: &str, cell: &str) -> LookupResult<f64> {
    cell.parse::<f64>().map_err(|_| LookupError::Parse {
        key: key.to_string(),
        row,
        message: format!("column {column:?}: {cell:?} is not a number"),
    })
}

impl Interpolation {
    /// Fit curves to `data`.  `key` names the data in error messages.
    pub fn new(
        key:         &str,
        data:        &DataTable,
        categorical: &[String],
        continuous:  &[String],
        order:       u8,
    ) -> LookupResult<Self> {
        if order > 1 {
            return Err(LookupError::UnsupportedOrder(order));
        }
        if continuous.len() > 1 {
            return Err(LookupError::Config(format!(
                "at most one continuous column is supported, got {continuous:?}"
            )));
        }
        if let Some(both) = categorical.iter().find(|c| continuous.contains(c)) {
            return Err(LookupError::Config(format!(
                "column {both:?} is both categorical and continuous"
            )));
        }
        if data.is_empty() {
            return Err(LookupError::EmptyData(key.to_string()));
        }
        for column in categorical.iter().chain(continuous) {
            if !data.has_column(column) {
                return Err(LookupError::MissingColumn {
                    key:    key.to_string(),
                    column: column.clone(),
                });
            }
        }

        let value_columns: Vec<String> = data
            .columns()
            .iter()
            .filter(|c| !categorical.contains(c) && !continuous.contains(c))
            .cloned()
            .collect();
        if value_columns.len() != 1 {
            return Err(LookupError::ValueColumns { key: key.to_string(), found: value_columns });
        }
        let value_column = value_columns[0].clone();

        let values = data.column(&value_column).unwrap_or_default();
        let ys: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(row, cell)| parse_f64(key, row, &value_column, cell))
            .collect::<LookupResult<_>>()?;

        // A parameter with too few distinct knots for the order is dropped.
        let mut parameter = continuous.first().cloned();
        let mut xs: Vec<f64> = Vec::new();
        let mut drop_parameter = false;
        if let Some(p) = &parameter {
            let cells = data.column(p).unwrap_or_default();
            xs = cells
                .iter()
                .enumerate()
                .map(|(row, cell)| parse_f64(key, row, p, cell))
                .collect::<LookupResult<_>>()?;
            let mut distinct = xs.clone();
            distinct.sort_by(f64::total_cmp);
            distinct.dedup();
            if distinct.len() <= order as usize {
                warn!(
                    data = key,
                    parameter = p.as_str(),
                    distinct = distinct.len(),
                    order,
                    "too few distinct values for interpolation order; dropping parameter"
                );
                drop_parameter = true;
            }
        }
        if drop_parameter {
            parameter = None;
        }

        let key_cells: Vec<Vec<&str>> = categorical
            .iter()
            .map(|c| data.column(c).unwrap_or_default())
            .collect();

        let mut groups: FxHashMap<Vec<String>, Vec<usize>> = FxHashMap::default();
        for row in 0..data.len() {
            let group: Vec<String> = key_cells.iter().map(|col| categorical_key(col[row])).collect();
            groups.entry(group).or_default().push(row);
        }

        let mut curves = FxHashMap::default();
        for (group, rows) in groups {
            let curve = match &parameter {
                None => {
                    if rows.len() != 1 {
                        return Err(LookupError::Parse {
                            key:     key.to_string(),
                            row:     rows[1],
                            message: format!("duplicate rows for key {group:?}"),
                        });
                    }
                    Curve::Constant(ys[rows[0]])
                }
                Some(p) => {
                    let mut knots: Vec<(f64, f64)> = rows.iter().map(|&r| (xs[r], ys[r])).collect();
                    knots.sort_by(|a, b| a.0.total_cmp(&b.0));
                    if let Some(w) = knots.windows(2).find(|w| w[0].0 == w[1].0) {
                        return Err(LookupError::Parse {
                            key:     key.to_string(),
                            row:     0,
                            message: format!("duplicate {p:?} value {} for key {group:?}", w[0].0),
                        });
                    }
                    Curve::Knots {
                        xs: knots.iter().map(|k| k.0).collect(),
                        ys: knots.iter().map(|k| k.1).collect(),
                    }
                }
            };
            curves.insert(group, curve);
        }

        Ok(Self {
            key_columns: categorical.to_vec(),
            parameter,
            value_column,
            order,
            curves,
        })
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// The continuous parameter actually used, after any drop.
    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    /// Value for one row.  `key` holds the categorical values in
    /// `key_columns` order; `x` is ignored when there is no parameter.
    pub fn evaluate(&self, key: &[String], x: f64) -> LookupResult<f64> {
        let key: Vec<String> = key.iter().map(|k| categorical_key(k)).collect();
        let curve = self.curves.get(&key).ok_or_else(|| LookupError::MissingGroup {
            key:   self.value_column.clone(),
            group: key,
        })?;
        Ok(match curve {
            Curve::Constant(v) => *v,
            Curve::Knots { xs, ys } => match self.order {
                0 => step(xs, ys, x),
                _ => linear(xs, ys, x),
            },
        })
    }
}

/// Index of the last knot `<= x`, or `None` if `x` is left of every knot.
fn left_knot(xs: &[f64], x: f64) -> Option<usize> {
    xs.partition_point(|&k| k <= x).checked_sub(1)
}

fn step(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    ys[left_knot(xs, x).unwrap_or(0)]
}

fn linear(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    let i = left_knot(xs, x).unwrap_or(0);
    let t = (x - xs[i]) / (xs[i + 1] - xs[i]);
    ys[i] + t * (ys[i + 1] - ys[i])
}
