//! Stage readers of the DVI decode pipeline.
//!
//! - [`PreambleReader`]: identification byte, scale factors and comment
//! - [`PostambleLocator`]: walks the trailer back to the POST opcode
//! - [`PostambleReader`]: postamble fields and font definitions
//! - [`PageIndexBuilder`]: page offsets from the reverse-linked BOP chain
//! - [`SpecialScanner`]: special payloads of pages and leading bytes

pub mod page_index_builder;
pub mod postamble_locator;
pub mod postamble_reader;
pub mod preamble_reader;
pub mod special_scanner;

pub use page_index_builder::{PageEntry, PageIndexBuilder, PageIndexOutcome};
pub use postamble_locator::{PostambleLocation, PostambleLocator};
pub use postamble_reader::{PostambleHeader, PostambleOutcome, PostambleReader};
pub use preamble_reader::{Preamble, PreambleReader};
pub use special_scanner::{SpecialFlags, SpecialScanner, SpecialSummary};

use encoding_rs::WINDOWS_1252;

/// Decode comment, special and font name bytes.
///
/// TeX writes these as raw 8-bit text: UTF-8 when valid, otherwise
/// Windows-1252 (a superset of Latin-1).
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text(b"cmr10"), "cmr10");
        assert_eq!(decode_text("größe".as_bytes()), "größe");
        assert_eq!(decode_text(b"gr\xf6\xdfe"), "größe");
    }
}
