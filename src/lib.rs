//! Structural decoder for TeX DVI files.
//!
//! Reads the preamble, walks the trailer back to the postamble, collects
//! font definitions and builds the page index from the reverse-linked BOP
//! chain. The result is an immutable [`DviDocument`] that a renderer can
//! use to jump straight to any page. Standard DVI, pTeX vertical DVI and
//! XeTeX XDV files are accepted.
//!
//! ```rust,ignore
//! use dvi_index::{DviReader, DviReaderConfiguration};
//!
//! let doc = DviReader::read_from_file("paper.dvi", DviReaderConfiguration::default())?;
//! for (i, offset) in doc.page_offsets().iter().enumerate() {
//!     println!("page {} at {}", i + 1, offset);
//! }
//! ```

pub mod document;
pub mod error;
pub mod io;
pub mod notification;
pub mod types;

pub use document::DviDocument;
pub use error::{DviError, Result};
pub use io::dvi::{
    DviReader, DviReaderConfiguration, DviWriter, FontDefinition, FontPool, FontSource,
    SpecialFlags, SpecialSummary,
};
pub use notification::{Notification, NotificationCollection, NotificationType};
pub use types::{DecodeStage, DviVersion, PaperSize, ScaleFactors};
