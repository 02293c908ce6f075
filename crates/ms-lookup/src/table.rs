//! `LookupTable`: a per-simulant value derived from population attributes.

use ms_core::SimulantId;
use ms_population::{Frame, PopulationTable, PopulationView, ViewColumns};
use tracing::debug;

use crate::{DataSource, Interpolation, LookupConfig, LookupError, LookupResult, LookupValue};

/// A built lookup table.
///
/// Scalar tables return the same value for every simulant.  Interpolated
/// tables read their key columns through a read-only view of their own and
/// evaluate the fitted curves row by row.
#[derive(Clone, Debug)]
pub enum LookupTable {
    Scalar(f64),
    Interpolated {
        interpolation: Interpolation,
        view:          PopulationView,
    },
}

impl LookupTable {
    /// Build from a configuration.  `name` identifies the table in logs and
    /// contract errors; `order` is the run-wide interpolation order.
    pub fn build(
        name:   &str,
        config: &LookupConfig,
        source: &dyn DataSource,
        order:  u8,
    ) -> LookupResult<Self> {
        if let LookupValue::Constant(value) = config.value {
            debug!(table = name, value, "built scalar lookup table");
            return Ok(LookupTable::Scalar(value));
        }
        let key = config
            .data_key()?
            .ok_or_else(|| LookupError::Config(format!("table {name:?} has no data key")))?;

        let data = source.load(key)?;
        let interpolation = Interpolation::new(
            key,
            &data,
            &config.categorical_columns,
            &config.continuous_columns,
            order,
        )?;
        debug!(
            table = name,
            data = key,
            rows = data.len(),
            order,
            "built interpolated lookup table"
        );
        Ok(Self::from_interpolation(name, interpolation))
    }

    /// Wrap an already fitted interpolation.
    pub fn from_interpolation(name: &str, interpolation: Interpolation) -> Self {
        let mut columns = interpolation.key_columns().to_vec();
        columns.extend(interpolation.parameter().map(str::to_string));
        let view = PopulationView::new(name, ViewColumns::Named(columns), Vec::new(), None);
        LookupTable::Interpolated { interpolation, view }
    }

    /// Population columns this table reads.
    pub fn required_columns(&self) -> Vec<String> {
        match self {
            LookupTable::Scalar(_) => Vec::new(),
            LookupTable::Interpolated { view, .. } => match view.view_columns() {
                ViewColumns::Named(names) => names.clone(),
                ViewColumns::All => Vec::new(),
            },
        }
    }

    /// One value per simulant in `index`, in index order.
    pub fn evaluate(&self, table: &PopulationTable, index: &[SimulantId]) -> LookupResult<Vec<f64>> {
        match self {
            LookupTable::Scalar(v) => Ok(vec![*v; index.len()]),
            LookupTable::Interpolated { view, .. } => {
                let frame = view.get(table, index)?;
                self.evaluate_frame(&frame)
            }
        }
    }

    /// One value per row of `frame`, which must carry the key columns.
    pub fn evaluate_frame(&self, frame: &Frame) -> LookupResult<Vec<f64>> {
        let interpolation = match self {
            LookupTable::Scalar(v) => return Ok(vec![*v; frame.len()]),
            LookupTable::Interpolated { interpolation, .. } => interpolation,
        };

        let keys: Vec<_> = interpolation
            .key_columns()
            .iter()
            .map(|c| frame.column(c))
            .collect::<Result<_, _>>()?;
        let xs = match interpolation.parameter() {
            Some(p) => Some(frame.column(p)?),
            None => None,
        };

        let mut out = Vec::with_capacity(frame.len());
        for row in 0..frame.len() {
            let group: Vec<String> = keys
                .iter()
                .map(|c| c.value(row).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            let x = xs
                .and_then(|c| c.value(row))
                .and_then(|v| v.as_f64())
                .unwrap_or(f64::NAN);
            out.push(interpolation.evaluate(&group, x)?);
        }
        Ok(out)
    }
}
