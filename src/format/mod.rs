//! Output formats consumed by the presentation layer.

pub mod csv;
