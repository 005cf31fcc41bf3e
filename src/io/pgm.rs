//! Portable greymaps.
//!
//! Loading accepts the plain (`P2`) and 8-bit binary (`P5`) variants, with `#`
//! comments anywhere in the header. Saving always writes `P2`: each value is
//! truncated to an integer and clamped to `[0, 255]`, and the declared maximum
//! is `max(255, floor(field max))`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::FieldError;
use crate::io::ascii::to_dim;
use crate::types::Field;

/// A cursor over the header and (for `P2`) body tokens of a greymap.
struct Tokens<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Next whitespace-delimited token, skipping `#` comments to end of line.
    fn next_token(&mut self) -> Option<&'a str> {
        loop {
            while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.pos < self.data.len() && self.data[self.pos] == b'#' {
                while self.pos < self.data.len() && self.data[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
        let start = self.pos;
        while self.pos < self.data.len() && !self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        std::str::from_utf8(&self.data[start..self.pos]).ok()
    }

    fn next_number(&mut self, what: &str) -> Result<u32, FieldError> {
        let token = self
            .next_token()
            .ok_or_else(|| FieldError::Format(format!("greymap ends before its {}", what)))?;
        token
            .parse()
            .map_err(|_| FieldError::Format(format!("invalid {} '{}'", what, token)))
    }
}

/// Parses a `P2` or `P5` greymap.
pub fn decode(data: &[u8]) -> Result<Field, FieldError> {
    let mut tokens = Tokens::new(data);
    let magic = tokens
        .next_token()
        .ok_or_else(|| FieldError::Format("empty greymap".to_string()))?;
    let width = tokens.next_number("width")?;
    let height = tokens.next_number("height")?;
    let max_value = tokens.next_number("max value")?;
    let count = width as usize * height as usize;

    let buffer = match magic {
        "P2" => (0..count)
            .map(|_| tokens.next_number("pixel").map(|v| v as f32))
            .collect::<Result<Vec<_>, _>>()?,
        "P5" => {
            if max_value > 255 {
                return Err(FieldError::Format(format!(
                    "binary greymaps with max value {} are not supported",
                    max_value
                )));
            }
            // Exactly one whitespace byte separates the header from the raster. An
            // empty raster may end right after the max value.
            let start = (tokens.pos + 1).min(data.len());
            let raster = data
                .get(start..start + count)
                .ok_or_else(|| FieldError::Format("truncated binary raster".to_string()))?;
            raster.iter().map(|&b| b as f32).collect()
        }
        other => {
            return Err(FieldError::Format(format!(
                "unsupported greymap type '{}'",
                other
            )))
        }
    };
    Field::from_vec(to_dim(width as usize)?, to_dim(height as usize)?, buffer)
}

/// Writes `field` as a plain (`P2`) greymap.
pub fn encode<W: Write>(field: &Field, mut writer: W) -> Result<(), FieldError> {
    let max_value = match field.max() {
        Ok(max) => (max.floor() as i64).max(255),
        Err(_) => 255,
    };
    writeln!(writer, "P2")?;
    writeln!(writer, "{} {}", field.width(), field.height())?;
    writeln!(writer, "{}", max_value)?;
    for j in 0..field.height() {
        let row = field
            .row(j)
            .ok_or_else(|| FieldError::InternalError(format!("row {} missing", j)))?;
        let line = row
            .iter()
            .map(|&v| (v as i32).clamp(0, 255).to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Field, FieldError> {
    decode(&fs::read(path)?)
}

pub fn save<P: AsRef<Path>>(field: &Field, path: P) -> Result<(), FieldError> {
    let file = File::create(path)?;
    encode(field, BufWriter::new(file))
}
