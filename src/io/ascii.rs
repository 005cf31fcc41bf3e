//! Whitespace-separated text fields: one row per line, columns separated by
//! spaces. Blank lines are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::FieldError;
use crate::types::Field;

/// Parses a field from text. Every non-blank line must hold the same number of
/// values.
pub fn read<R: BufRead>(reader: R) -> Result<Field, FieldError> {
    let mut buffer = Vec::new();
    let mut width: Option<usize> = None;
    let mut height = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let before = buffer.len();
        for token in line.split_whitespace() {
            let value: f32 = token.parse().map_err(|_| {
                FieldError::Format(format!(
                    "line {}: '{}' is not a number",
                    line_no + 1,
                    token
                ))
            })?;
            buffer.push(value);
        }
        let columns = buffer.len() - before;
        match width {
            None => width = Some(columns),
            Some(w) if w != columns => {
                return Err(FieldError::Format(format!(
                    "line {} has {} columns, expected {}",
                    line_no + 1,
                    columns,
                    w
                )));
            }
            Some(_) => {}
        }
        height += 1;
    }

    let width = width.unwrap_or(0);
    Field::from_vec(to_dim(width)?, to_dim(height)?, buffer)
}

/// Writes `field` as text, one row per line.
pub fn write<W: Write>(field: &Field, mut writer: W) -> Result<(), FieldError> {
    for j in 0..field.height() {
        let row = field
            .row(j)
            .ok_or_else(|| FieldError::InternalError(format!("row {} missing", j)))?;
        let line = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Field, FieldError> {
    let file = File::open(path)?;
    read(BufReader::new(file))
}

pub fn save<P: AsRef<Path>>(field: &Field, path: P) -> Result<(), FieldError> {
    let file = File::create(path)?;
    write(field, BufWriter::new(file))
}

pub(crate) fn to_dim(n: usize) -> Result<u32, FieldError> {
    u32::try_from(n).map_err(|_| FieldError::Format(format!("dimension {} is too large", n)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rows_and_columns() {
        let text = "1 2 3\n4.5 -5 6\n\n";
        let field = read(text.as_bytes()).unwrap();
        assert_eq!(field.width(), 3);
        assert_eq!(field.height(), 2);
        assert_eq!(field.get(0, 1).unwrap(), 4.5);
        assert_eq!(field.get(1, 1).unwrap(), -5.0);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let result = read("1 2 3\n4 5\n".as_bytes());
        assert!(matches!(result, Err(FieldError::Format(_))));
    }

    #[test]
    fn test_non_numeric_token_is_rejected() {
        let result = read("1 x\n".as_bytes());
        assert!(matches!(result, Err(FieldError::Format(_))));
    }

    #[test]
    fn test_empty_text_is_empty_field() {
        let field = read("".as_bytes()).unwrap();
        assert!(field.is_empty());
        assert_eq!(field.width(), 0);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.txt");
        let field = Field::from_vec(2, 2, vec![0.1, 2.0, -3.25, 1e-7]).unwrap();
        save(&field, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert_eq!(load(&path).unwrap(), field);
    }
}
