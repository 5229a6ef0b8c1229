//! DVI read/write support.
//!
//! - [`DviReader`]: runs the decode pipeline and returns a [`DviDocument`](crate::DviDocument)
//! - [`DviWriter`]: writes structurally valid DVI files
//! - [`dvi_stream_readers`]: the individual decode stages
//! - [`FontDefinitionRegistry`]: font definitions keyed by font number
//! - [`PaperSizeDetector`]: `papersize=` hints

pub mod byte_cursor;
pub mod dvi_document_builder;
pub mod dvi_opcodes;
pub mod dvi_reader;
pub mod dvi_reader_configuration;
pub mod dvi_stream_readers;
pub mod dvi_writer;
pub mod font_definition_registry;
pub mod paper_size_detector;

pub use byte_cursor::ByteCursor;
pub use dvi_document_builder::DviDocumentBuilder;
pub use dvi_reader::DviReader;
pub use dvi_reader_configuration::DviReaderConfiguration;
pub use dvi_stream_readers::{
    PageEntry, PageIndexBuilder, PostambleLocation, PostambleLocator, PostambleReader, Preamble,
    PreambleReader, SpecialFlags, SpecialScanner, SpecialSummary,
};
pub use dvi_writer::DviWriter;
pub use font_definition_registry::{FontDefinition, FontDefinitionRegistry, FontPool, FontSource};
pub use paper_size_detector::PaperSizeDetector;
