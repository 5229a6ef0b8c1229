//! DVI file reader: main orchestrator of the decode pipeline.
//!
//! Decoding runs through these stages in order:
//!
//! 1. preamble (the only stage whose failure aborts the read)
//! 2. trailer walk back to the postamble
//! 3. postamble fields and font definitions
//! 4. page index from the reverse-linked BOP chain
//! 5. optional prescan of page specials and paper size detection
//!
//! A failure after the preamble is recorded on the document, which is then
//! returned with whatever the earlier stages recovered.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use rayon::prelude::*;

use crate::document::DviDocument;
use crate::error::{DviError, Result};
use crate::types::DecodeStage;

use super::byte_cursor::ByteCursor;
use super::dvi_document_builder::DviDocumentBuilder;
use super::dvi_reader_configuration::DviReaderConfiguration;
use super::dvi_stream_readers::{
    PageIndexBuilder, PostambleLocator, PostambleReader, PreambleReader, SpecialScanner,
    SpecialSummary,
};
use super::paper_size_detector::PaperSizeDetector;

/// Reads DVI (and XDV) files into a [`DviDocument`].
///
/// # Example
///
/// ```rust,ignore
/// use dvi_index::{DviReader, DviReaderConfiguration};
///
/// let doc = DviReader::read_from_file("paper.dvi", DviReaderConfiguration::default())?;
/// println!("{} pages", doc.total_pages());
/// ```
pub struct DviReader {
    data: Arc<[u8]>,
    configuration: DviReaderConfiguration,
}

impl DviReader {
    pub fn new(data: impl Into<Arc<[u8]>>, configuration: DviReaderConfiguration) -> Self {
        Self {
            data: data.into(),
            configuration,
        }
    }

    /// Open and read a DVI file from disk.
    pub fn read_from_file(
        path: impl AsRef<Path>,
        configuration: DviReaderConfiguration,
    ) -> Result<DviDocument> {
        let path = path.as_ref();
        debug!("Reading {}", path.display());
        let data = fs::read(path)?;
        Self::read_from_bytes(data, configuration)
    }

    /// Read a DVI file held in memory.
    pub fn read_from_bytes(
        data: Vec<u8>,
        configuration: DviReaderConfiguration,
    ) -> Result<DviDocument> {
        Self::new(data, configuration).read()
    }

    /// Read from a buffer that is already shared; the document keeps a
    /// reference to it instead of a copy.
    pub fn read_shared(
        data: Arc<[u8]>,
        configuration: DviReaderConfiguration,
    ) -> Result<DviDocument> {
        Self::new(data, configuration).read()
    }

    /// Decode several buffers in parallel. Results are in input order.
    pub fn read_many(
        buffers: Vec<Arc<[u8]>>,
        configuration: &DviReaderConfiguration,
    ) -> Vec<Result<DviDocument>> {
        buffers
            .into_par_iter()
            .map(|data| Self::read_shared(data, configuration.clone()))
            .collect()
    }

    /// Run the decode pipeline.
    pub fn read(self) -> Result<DviDocument> {
        let data = self.data;
        let data_ref: &[u8] = &data;

        // 1. Preamble
        let mut cursor = ByteCursor::new(data_ref);
        let preamble = match PreambleReader::read(&mut cursor) {
            Ok(preamble) => preamble,
            Err(e) if !e.is_recoverable() => return Err(e),
            Err(e) => return Err(DviError::BadPreamble(e.to_string())),
        };
        info!(
            "Preamble: {} ({}), comment {:?}",
            preamble.version, preamble.scale, preamble.comment
        );
        let leading_specials = SpecialScanner::scan_leading(data_ref, preamble.end_offset);
        let mut builder =
            DviDocumentBuilder::new(Arc::clone(&data), preamble, self.configuration.clone());

        // 2. Trailer
        let location = match PostambleLocator::locate(data_ref) {
            Ok(location) => location,
            Err(e) => {
                builder.record_error(e)?;
                builder.warn("Postamble unavailable; only the preamble was decoded");
                Self::detect_paper_size(&mut builder, &self.configuration, &leading_specials, &[]);
                return Ok(builder.build_document());
            }
        };
        let postamble_offset = location.offset;
        info!(
            "Postamble at {} ({} padding bytes)",
            postamble_offset, location.padding
        );
        builder.set_location(location);
        builder.complete(DecodeStage::PostambleLocated);

        // 3. Postamble and fonts
        let outcome = PostambleReader::read_located(data_ref, &location);
        let parsed = outcome.failure.is_none();
        let (last_page_offset, declared_pages) = builder.apply_postamble(outcome)?;
        if parsed {
            builder.complete(DecodeStage::PostambleParsed);
        }

        // 4. Page index
        if let Some(last_page_offset) = last_page_offset {
            let index = PageIndexBuilder::build_before_postamble(
                data_ref,
                last_page_offset,
                declared_pages,
                postamble_offset,
            );
            let built = index.failure.is_none();
            builder.apply_page_index(index)?;
            if built {
                builder.complete(DecodeStage::PageIndexBuilt);
            }
            info!("Page index: {} pages", builder.page_offsets().len());
        }

        // 5. Specials and paper size
        let first_page_specials = if self.configuration.prescan_specials {
            Self::prescan_specials(&mut builder, data_ref)
        } else {
            Vec::new()
        };
        Self::detect_paper_size(
            &mut builder,
            &self.configuration,
            &leading_specials,
            &first_page_specials,
        );

        builder.complete(DecodeStage::Ready);
        Ok(builder.build_document())
    }

    /// Scan every indexed page. Returns the first page's specials.
    fn prescan_specials(builder: &mut DviDocumentBuilder, data: &[u8]) -> Vec<String> {
        let mut summary = SpecialSummary::default();
        let mut first_page = Vec::new();
        let offsets = builder.page_offsets().to_vec();
        for (index, offset) in offsets.into_iter().enumerate() {
            match SpecialScanner::scan_page(data, offset) {
                Ok(specials) => {
                    for special in &specials {
                        summary.record(special);
                    }
                    if index == 0 {
                        first_page = specials;
                    }
                }
                Err(e) => builder.warn(format!(
                    "Failed to prescan page {} at offset {}: {}",
                    index + 1,
                    offset,
                    e
                )),
            }
        }
        debug!(
            "Specials: {} total, flags {:?}",
            summary.total_specials, summary.flags
        );
        builder.set_special_summary(summary);
        first_page
    }

    fn detect_paper_size(
        builder: &mut DviDocumentBuilder,
        configuration: &DviReaderConfiguration,
        leading_specials: &[String],
        first_page_specials: &[String],
    ) {
        if !configuration.detect_paper_size {
            return;
        }
        let scale = builder.scale();
        let comment = builder.preamble().comment.clone();
        let sources = std::iter::once(comment.as_str())
            .chain(leading_specials.iter().map(String::as_str))
            .chain(first_page_specials.iter().map(String::as_str));
        let size = PaperSizeDetector::detect(sources, &scale);
        builder.set_paper_size(size);
    }
}
