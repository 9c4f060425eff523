//! Sensor matrix storage and its textual frame.

use std::fmt;
use std::fmt::Display;

/// Rows in the sensor grid, one per outer multiplexer channel.
pub const ROWS: usize = 5;
/// Columns in the sensor grid, one per inner multiplexer channel.
pub const COLS: usize = 3;

/// First line of every frame.
pub const FRAME_HEADER: &str = "Matrix updated:";

/// Voltages read during one scan, indexed `[row][column]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorMatrix {
    cells: [[f64; COLS]; ROWS],
}

impl SensorMatrix {
    /// Wrap a fully populated grid.
    pub fn from_rows(cells: [[f64; COLS]; ROWS]) -> SensorMatrix {
        SensorMatrix {
            cells,
        }
    }

    /// Returns the voltage at the zero-based position.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row)
            .and_then(|r| r.get(col))
            .copied()
    }

    /// Returns the rows in order.
    pub fn rows(&self) -> &[[f64; COLS]; ROWS] {
        &self.cells
    }

    /// Render the matrix as a frame.
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            matrix: self,
        }
    }
}

/// Format a row as comma-separated values with four fractional digits.
pub fn format_row(row: &[f64]) -> String {
    row.iter()
        .map(|v| format!("{:.4}", v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Textual rendering of a [`SensorMatrix`].
///
/// A header line followed by one line per row; `Display` joins them with newlines and ends with one.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    matrix: &'a SensorMatrix,
}

impl<'a> Frame<'a> {
    /// Returns the frame's lines without terminators, header first.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(ROWS + 1);
        lines.push(FRAME_HEADER.to_string());
        lines.extend(self.matrix.rows().iter().map(|row| format_row(row)));
        lines
    }
}

impl<'a> Display for Frame<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for line in self.lines() {
            write!(f, "{}\n", line)?;
        }

        Ok(())
    }
}
