//! I/O module for reading and writing TeX DVI files

pub mod dvi;

pub use dvi::{DviReader, DviReaderConfiguration, DviWriter};
