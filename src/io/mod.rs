//! Loading and saving fields.
//!
//! Every process loads the same input independently. Only the leader may save a
//! result: a follower's output is valid only on its own partition, so
//! [`persist`] refuses to write it.

pub mod ascii;
pub mod pgm;

use std::path::Path;

use crate::config::{EngineConfig, OutputFormat};
use crate::error::FieldError;
use crate::transform_pipeline::models::FilterOutcome;
use crate::types::Field;

pub fn load<P: AsRef<Path>>(path: P, format: OutputFormat) -> Result<Field, FieldError> {
    match format {
        OutputFormat::Ascii => ascii::load(path),
        OutputFormat::Pgm => pgm::load(path),
    }
}

pub fn save<P: AsRef<Path>>(field: &Field, path: P, format: OutputFormat) -> Result<(), FieldError> {
    match format {
        OutputFormat::Ascii => ascii::save(field, path),
        OutputFormat::Pgm => pgm::save(field, path),
    }
}

/// Saves `outcome` in `config.output_format` if it is the leader's complete
/// result.
///
/// Returns `Ok(true)` when a file was written and `Ok(false)` for a follower's
/// partial output, in which case the file system is not touched.
pub fn persist<P: AsRef<Path>>(
    outcome: &FilterOutcome,
    path: P,
    config: &EngineConfig,
) -> Result<bool, FieldError> {
    match outcome.complete() {
        Some(field) => {
            save(field, path.as_ref(), config.output_format)?;
            log::info!("saved {}x{} result to {}", field.width(), field.height(), path.as_ref().display());
            Ok(true)
        }
        None => Ok(false),
    }
}
