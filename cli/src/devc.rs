//! Device CSV files: a units line, a names line, then one row per time step
//! with the time in the first column.

use std::{io::Read, num::ParseFloatError};

use ndarray::Array1;
use thiserror::Error;
use tracing::debug;
use varplot_core::{
    store::{MemoryStore, StoreError},
    variable::{DimensionInfo, SourceVariable, VariableError},
};

/// Dimension every device reading is recorded over.
pub const TIME_DIMENSION: &str = "time";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing units header (first line)")]
    MissingUnitsLine,
    #[error("Missing names header (second line)")]
    MissingNamesLine,

    #[error("Parsing error in units header CSV (first line)")]
    ParsingErrorUnitsCsv(#[source] csv::Error),
    #[error("Parsing error in names header CSV (second line)")]
    ParsingErrorNamesCsv(#[source] csv::Error),

    #[error("Number of units and names don't match ({units_len} units, {names_len} names)")]
    InvalidUnitsAndNamesCount { units_len: usize, names_len: usize },

    #[error("Wrong number of values (line {0}: {1} columns, expected {2})")]
    WrongValueCount(usize, usize, usize),

    #[error("CSV parsing error (line {0}: {1})")]
    ParsingErrorCsv(usize, csv::Error),
    #[error("Float parsing error (line {0}, column {1}: {2})")]
    ParsingError(usize, usize, ParseFloatError),

    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Variable(#[from] VariableError),
}

/// Reads every device column into a store of 1-D variables over [`TIME_DIMENSION`].
pub fn from_reader(rdr: impl Read) -> Result<MemoryStore, Error> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        // blank trailing lines
        .flexible(true)
        .from_reader(rdr);

    let mut rdr = rdr.into_records();

    let units = match rdr.next() {
        Some(val) => val.map_err(Error::ParsingErrorUnitsCsv)?,
        None => return Err(Error::MissingUnitsLine),
    };
    let names = match rdr.next() {
        Some(val) => val.map_err(Error::ParsingErrorNamesCsv)?,
        None => return Err(Error::MissingNamesLine),
    };

    let units_len = units.len();
    let names_len = names.len();
    if units_len != names_len || units_len < 1 {
        return Err(Error::InvalidUnitsAndNamesCount {
            units_len,
            names_len,
        });
    }

    let len = units_len - 1;
    let mut times = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); len];

    for (i, record) in rdr.enumerate() {
        // 1-based, after the two header lines
        let line = i + 3;
        let record = record.map_err(|e| Error::ParsingErrorCsv(line, e))?;
        let mut fields = record.iter();
        let time: f64 = match fields.next() {
            Some("") | None => continue,
            Some(val) => val.parse().map_err(|e| Error::ParsingError(line, 0, e))?,
        };

        let values = fields
            .filter(|v| !v.is_empty())
            .enumerate()
            .map(|(j, v)| v.parse::<f64>().map_err(|e| Error::ParsingError(line, j + 1, e)))
            .collect::<Result<Vec<_>, _>>()?;
        if values.len() != len {
            return Err(Error::WrongValueCount(line, values.len(), len));
        }

        times.push(time);
        for (column, value) in columns.iter_mut().zip(values) {
            column.push(value);
        }
    }

    let mut store = MemoryStore::new();
    store.set_dimension_info(
        TIME_DIMENSION,
        DimensionInfo::new(TIME_DIMENSION)
            .with_label(names.get(0).unwrap_or(TIME_DIMENSION))
            .with_unit(units.get(0).unwrap_or_default()),
    );

    let time = Array1::from(times).into_dyn();
    for ((unit, name), values) in units.iter().zip(names.iter()).skip(1).zip(columns) {
        let variable = SourceVariable::builder(name, [TIME_DIMENSION], Array1::from(values).into_dyn())
            .unit(unit)
            .coords(TIME_DIMENSION, time.clone())
            .build()?;
        store.add_variable(variable)?;
    }

    debug!("Loaded {} devices over {} time steps", store.len(), time.len());
    Ok(store)
}

#[cfg(test)]
mod tests {
    use varplot_core::{Variable, VariableStore};

    use super::*;

    #[test]
    fn basic_parsing() {
        let store = from_reader(
            r#"s, m3/s, C, 1/m
        Time,   Zuluft_1,   Abluft_1,   T_B01
        0.0E+0, 1.2E+3,     -2.3E-2,    4.1E-12
        "#
            .as_bytes(),
        )
        .unwrap();

        assert_eq!(store.variable_names(), ["Zuluft_1", "Abluft_1", "T_B01"]);
        assert_eq!(store.variable("Zuluft_1").unwrap().unit(), "m3/s");
        assert_eq!(store.variable("Abluft_1").unwrap().unit(), "C");
        assert_eq!(store.variable("T_B01").unwrap().unit(), "1/m");

        let info = store.dimension_info(TIME_DIMENSION);
        assert_eq!(info.unit, "s");
        assert_eq!(info.label, "Time");
    }

    #[test]
    fn values_over_time() {
        let store = from_reader(
            "s,C\nTime,T\n0,20\n1.5,21\n\n3,23.5\n".as_bytes(),
        )
        .unwrap();
        let slice = store.variable("T").unwrap().slice(&[Default::default()]).unwrap();
        assert_eq!(slice.data.unwrap().into_raw_vec(), vec![20.0, 21.0, 23.5]);
        assert_eq!(slice.coords[0].as_ref().unwrap().to_owned().into_raw_vec(), vec![0.0, 1.5, 3.0]);
    }

    #[test]
    fn header_errors() {
        assert!(matches!(from_reader("".as_bytes()), Err(Error::MissingUnitsLine)));
        assert!(matches!(from_reader("s,C\n".as_bytes()), Err(Error::MissingNamesLine)));
        assert!(matches!(
            from_reader("s,C\nTime,T,U\n".as_bytes()),
            Err(Error::InvalidUnitsAndNamesCount {
                units_len: 2,
                names_len: 3
            })
        ));
    }

    #[test]
    fn row_errors() {
        assert!(matches!(
            from_reader("s,C,C\nTime,T,U\n0,1\n".as_bytes()),
            Err(Error::WrongValueCount(3, 1, 2))
        ));
        assert!(matches!(
            from_reader("s,C\nTime,T\n0,warm\n".as_bytes()),
            Err(Error::ParsingError(3, 1, _))
        ));
        assert!(matches!(
            from_reader("s,C,C\nTime,T,T\n0,1,2\n".as_bytes()),
            Err(Error::Store(StoreError::DuplicateVariable(_)))
        ));
    }
}
