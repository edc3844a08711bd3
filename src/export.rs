//! Tabular export of rank 1 and rank 2 arrays
//!
//! A rank 1 array becomes a single column named after the variable. A rank 2
//! array becomes one row per first-axis index and one column per second-axis
//! index, named `<var>_col_<j>`, with the row index labelled `<var>_row`.
//! Higher ranks are rejected; callers slice them down first.
//!
//! The written table always starts with the row index column. Missing cells
//! are written as [`ExportOptions::missing_marker`], never as a number.

use crate::array::MaterializedArray;
use crate::errors::{NcReaderError, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_MISSING_MARKER: &str = "NA";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Token written for (and read back as) a missing cell
    pub missing_marker: String,
    pub delimiter: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            missing_marker: DEFAULT_MISSING_MARKER.to_string(),
            delimiter: b',',
        }
    }
}

/// Row-major table of optional values
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index_label: String,
    columns: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl Table {
    pub fn index_label(&self) -> &str {
        &self.index_label
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Position of the column called `name`
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// `None` when the cell is missing or out of bounds
    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        self.rows.get(row)?.get(column).copied().flatten()
    }

    pub fn write_csv<W: Write>(&self, writer: W, options: &ExportOptions) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .from_writer(writer);

        let header = std::iter::once(self.index_label.as_str())
            .chain(self.columns.iter().map(String::as_str));
        wtr.write_record(header)?;

        for (i, row) in self.rows.iter().enumerate() {
            let cells = std::iter::once(i.to_string()).chain(row.iter().map(|cell| match cell {
                Some(v) => v.to_string(),
                None => options.missing_marker.clone(),
            }));
            wtr.write_record(cells)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_file(&self, path: &Path, options: &ExportOptions) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv(file, options)?;
        debug!(
            path = %path.display(),
            rows = self.n_rows(),
            columns = self.n_columns(),
            "wrote table"
        );
        Ok(())
    }

    /// Parses a table written by [`Table::write_csv`] with the same options.
    ///
    /// The first column is taken as the row index and discarded; cells equal
    /// to the missing marker become `None`.
    pub fn read_csv<R: Read>(reader: R, options: &ExportOptions) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let mut headers = headers.iter();
        let index_label = headers.next().unwrap_or_default().to_string();
        let columns: Vec<String> = headers.map(str::to_string).collect();

        let mut rows = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            let row = record
                .iter()
                .skip(1)
                .zip(&columns)
                .map(|(cell, column)| {
                    if cell == options.missing_marker {
                        return Ok(None);
                    }
                    cell.parse::<f64>()
                        .map(Some)
                        .map_err(|_| NcReaderError::TableParse {
                            row: i,
                            column: column.clone(),
                            value: cell.to_string(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }

        Ok(Self {
            index_label,
            columns,
            rows,
        })
    }
}

/// Flattens a rank 1 or rank 2 array into a [`Table`].
///
/// Rows and columns follow the array's index order exactly.
///
/// # Errors
///
/// `UnsupportedRank` for scalars and for rank 3 and above.
pub fn export(array: &MaterializedArray) -> Result<Table> {
    let name = array.name();
    match array.rank() {
        1 => Ok(Table {
            index_label: String::new(),
            columns: vec![name.to_string()],
            rows: array.iter().map(|value| vec![value]).collect(),
        }),
        2 => {
            let (n_rows, n_cols) = (array.shape()[0], array.shape()[1]);
            let rows = (0..n_rows)
                .map(|i| (0..n_cols).map(|j| array.get(&[i, j])).collect())
                .collect();
            Ok(Table {
                index_label: format!("{name}_row"),
                columns: (0..n_cols).map(|j| format!("{name}_col_{j}")).collect(),
                rows,
            })
        }
        rank => Err(NcReaderError::UnsupportedRank {
            var: name.to_string(),
            rank,
            operation: "export",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use ndarray::{ArrayD, IxDyn};

    fn grid() -> MaterializedArray {
        let mask = ArrayD::from_shape_vec(
            IxDyn(&[2, 3]),
            vec![false, false, true, false, false, false],
        )
        .unwrap();
        MaterializedArray::from_values(
            "t",
            &["lat", "lon"],
            &[2, 3],
            vec![0.5, 1.0, -999.0, 2.0, 3.25, 4.0],
        )
        .unwrap()
        .with_mask(mask)
        .unwrap()
    }

    #[test]
    fn rank_two_naming() {
        let table = export(&grid()).unwrap();
        assert_eq!(table.index_label(), "t_row");
        assert_eq!(table.columns(), &["t_col_0", "t_col_1", "t_col_2"]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.value(0, 2), None);
        assert_eq!(table.value(1, 1), Some(3.25));
    }

    #[test]
    fn rank_one_single_column() {
        let array =
            MaterializedArray::from_values("depth", &["z"], &[3], vec![1.0, 2.0, 3.0]).unwrap();
        let table = export(&array).unwrap();
        assert_eq!(table.columns(), &["depth"]);
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.column("depth"), Some(0));
    }

    #[test]
    fn csv_uses_marker_and_reparses() {
        let table = export(&grid()).unwrap();
        let options = ExportOptions::default();
        let mut buf = Vec::new();
        table.write_csv(&mut buf, &options).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("t_row,t_col_0,t_col_1,t_col_2"));
        assert_eq!(lines.next(), Some("0,0.5,1,NA"));

        let parsed = Table::read_csv(buf.as_slice(), &options).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn rank_one_csv_reparses_with_missing_cell() {
        let array = MaterializedArray::from_values("depth", &["z"], &[3], vec![1.5, -1.0, 3.0])
            .unwrap()
            .with_mask(ArrayD::from_shape_vec(IxDyn(&[3]), vec![false, true, false]).unwrap())
            .unwrap();
        let table = export(&array).unwrap();
        let options = ExportOptions::default();
        let mut buf = Vec::new();
        table.write_csv(&mut buf, &options).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec![",depth", "0,1.5", "1,NA", "2,3"]);

        let parsed = Table::read_csv(buf.as_slice(), &options).unwrap();
        assert_eq!(parsed, table);
        assert_eq!(parsed.index_label(), "");
        assert_eq!(parsed.value(1, 0), None);
        assert_eq!(parsed.value(2, 0), Some(3.0));
    }

    #[test]
    fn custom_delimiter_and_marker() {
        let options = ExportOptions {
            missing_marker: "null".to_string(),
            delimiter: b';',
        };
        let mut buf = Vec::new();
        export(&grid()).unwrap().write_csv(&mut buf, &options).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("0;0.5;1;null"));
    }

    #[test]
    fn rejects_unparsable_cells() {
        let input = "x_row,x_col_0\n0,abc\n";
        let err = Table::read_csv(input.as_bytes(), &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, NcReaderError::TableParse { row: 0, .. }));
    }

    #[test]
    fn rank_three_unsupported() {
        let array = MaterializedArray::from_values("v", &["a", "b", "c"], &[1, 1, 2], vec![0.0; 2])
            .unwrap();
        assert_eq!(export(&array).unwrap_err().kind(), ErrorKind::UnsupportedRank);

        let scalar = MaterializedArray::from_values("s", &[], &[], vec![1.0]).unwrap();
        assert_eq!(export(&scalar).unwrap_err().kind(), ErrorKind::UnsupportedRank);
    }
}
