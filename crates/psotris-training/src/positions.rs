//! Plain-text position and result files.
//!
//! Both formats hold one line per particle, in particle index order, with
//! components separated by a single space:
//!
//! ```text
//! # initial-state file: D components
//! 0.4193 -0.8812 0.0735
//! # result file: D components, then the lines-cleared metric
//! 0.3904 -1.2290 0.1170 412
//! ```
//!
//! Components are written with the shortest representation that parses
//! back to the same `f64`. Readers accept any run of whitespace as a
//! separator and skip blank lines.

use std::io::{self, BufRead, Write};

pub const DEFAULT_INITIAL_FILE: &str = "particles-input.txt";
pub const DEFAULT_RESULT_FILE: &str = "particles-output.txt";

/// One line of a result file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub position: Vec<f64>,
    pub lines_cleared: f64,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ParseError {
    #[display("failed to read input")]
    Io { source: io::Error },
    #[display("line {line}: `{token}` is not a number")]
    InvalidNumber { line: usize, token: String },
    #[display("line {line}: expected {expected} values, found {actual}")]
    InconsistentWidth {
        line: usize,
        expected: usize,
        actual: usize,
    },
    #[display("line {line}: a result row needs at least one weight and the metric")]
    MissingMetric { line: usize },
}

fn write_row<W>(writer: &mut W, values: impl IntoIterator<Item = f64>) -> io::Result<()>
where
    W: Write + ?Sized,
{
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            write!(writer, " ")?;
        }
        write!(writer, "{value}")?;
    }
    writeln!(writer)
}

/// Writes one position per line.
pub fn write_positions<W, I, P>(writer: &mut W, positions: I) -> io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = P>,
    P: AsRef<[f64]>,
{
    for position in positions {
        write_row(writer, position.as_ref().iter().copied())?;
    }
    Ok(())
}

/// Writes one position per line, each followed by its lines-cleared metric.
pub fn write_results<'a, W, I>(writer: &mut W, rows: I) -> io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = (&'a [f64], f64)>,
{
    for (position, lines_cleared) in rows {
        write_row(
            writer,
            position.iter().copied().chain(std::iter::once(lines_cleared)),
        )?;
    }
    Ok(())
}

/// Parses every non-blank line into a vector. All lines must have the same width.
fn read_rows<R>(reader: R) -> Result<Vec<(usize, Vec<f64>)>, ParseError>
where
    R: BufRead,
{
    let mut rows: Vec<(usize, Vec<f64>)> = vec![];
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|source| ParseError::Io { source })?;
        if line.trim().is_empty() {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                    line: line_no,
                    token: token.to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Some((_, first)) = rows.first()
            && first.len() != values.len()
        {
            return Err(ParseError::InconsistentWidth {
                line: line_no,
                expected: first.len(),
                actual: values.len(),
            });
        }
        rows.push((line_no, values));
    }
    Ok(rows)
}

/// Reads an initial-state file back into position vectors.
pub fn read_positions<R>(reader: R) -> Result<Vec<Vec<f64>>, ParseError>
where
    R: BufRead,
{
    Ok(read_rows(reader)?.into_iter().map(|(_, row)| row).collect())
}

/// Reads a result file back into positions and their metrics.
pub fn read_results<R>(reader: R) -> Result<Vec<ResultRow>, ParseError>
where
    R: BufRead,
{
    read_rows(reader)?
        .into_iter()
        .map(|(line, mut values)| {
            if values.len() < 2 {
                return Err(ParseError::MissingMetric { line });
            }
            let lines_cleared = values.pop().unwrap_or_default();
            Ok(ResultRow {
                position: values,
                lines_cleared,
            })
        })
        .collect()
}
