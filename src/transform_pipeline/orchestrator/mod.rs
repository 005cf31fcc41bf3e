pub mod core;

pub use self::core::{apply_filter, apply_filters};
