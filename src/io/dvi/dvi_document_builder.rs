//! DVI document builder. Assembles a [`DviDocument`] from the stage results.
//!
//! Stages hand their immutable results to the builder; the document itself
//! is created once, in [`DviDocumentBuilder::build_document`], and never
//! changes afterwards.

use std::sync::Arc;

use log::info;

use crate::document::DviDocument;
use crate::error::{DviError, Result};
use crate::notification::NotificationCollection;
use crate::types::{DecodeStage, PaperSize, ScaleFactors};

use super::dvi_reader_configuration::DviReaderConfiguration;
use super::dvi_stream_readers::{
    PageIndexOutcome, PostambleLocation, PostambleOutcome, Preamble, SpecialSummary,
};
use super::font_definition_registry::FontDefinitionRegistry;

/// Collects the results of each decode stage.
pub struct DviDocumentBuilder {
    data: Arc<[u8]>,
    configuration: DviReaderConfiguration,
    preamble: Preamble,
    scale: ScaleFactors,
    location: Option<PostambleLocation>,
    max_page_height: Option<u32>,
    max_page_width: Option<u32>,
    max_stack_depth: Option<u16>,
    fonts: FontDefinitionRegistry,
    page_offsets: Vec<u32>,
    page_counters: Vec<[i32; 10]>,
    special_summary: Option<SpecialSummary>,
    paper_size: Option<PaperSize>,
    notifications: NotificationCollection,
    stage: DecodeStage,
    degraded: bool,
}

impl DviDocumentBuilder {
    /// Start a document from a parsed preamble.
    pub fn new(data: Arc<[u8]>, preamble: Preamble, configuration: DviReaderConfiguration) -> Self {
        let notifications = NotificationCollection::with_limit(configuration.max_notifications);
        Self {
            data,
            scale: preamble.scale,
            preamble,
            configuration,
            location: None,
            max_page_height: None,
            max_page_width: None,
            max_stack_depth: None,
            fonts: FontDefinitionRegistry::new(),
            page_offsets: Vec::new(),
            page_counters: Vec::new(),
            special_summary: None,
            paper_size: None,
            notifications,
            stage: DecodeStage::PreambleParsed,
            degraded: false,
        }
    }

    /// Scale factors currently in effect.
    pub fn scale(&self) -> ScaleFactors {
        self.scale
    }

    pub fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    pub fn page_offsets(&self) -> &[u32] {
        &self.page_offsets
    }

    /// Record a recoverable error. The document is degraded from here on.
    ///
    /// Errors that are not recoverable are handed back to the caller, which
    /// aborts the read.
    pub fn record_error(&mut self, error: DviError) -> Result<()> {
        if !error.is_recoverable() {
            return Err(error);
        }
        self.notifications.error(&error);
        self.degraded = true;
        Ok(())
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.notifications.warn(message);
    }

    /// Mark `stage` as completed, unless an earlier stage failed.
    pub fn complete(&mut self, stage: DecodeStage) {
        if !self.degraded && stage > self.stage {
            self.stage = stage;
        }
    }

    pub fn set_location(&mut self, location: PostambleLocation) {
        if !self.preamble.version.matches_trailer(location.id_byte) {
            self.warn(format!(
                "Identification byte differs between preamble ({}) and trailer ({})",
                self.preamble.version.id_byte(),
                location.id_byte
            ));
        }
        self.location = Some(location);
    }

    /// Take over the postamble's fields and fonts. Returns the last-page
    /// pointer and the declared page count, when they could be read.
    pub fn apply_postamble(
        &mut self,
        outcome: PostambleOutcome,
    ) -> Result<(Option<i32>, Option<u16>)> {
        self.notifications.extend(outcome.notifications);
        self.fonts = outcome.fonts;

        let mut declared_pages = None;
        if let Some(header) = outcome.header {
            if header.scale != self.scale {
                if self.configuration.cross_check_scale {
                    self.warn(format!(
                        "Postamble scale factors ({}) differ from the preamble ({}); \
                         using the postamble values",
                        header.scale, self.scale
                    ));
                }
                if header.scale.numerator > 0
                    && header.scale.denominator > 0
                    && header.scale.magnification > 0
                {
                    self.scale = header.scale;
                } else {
                    self.warn(
                        "Postamble scale factors are not positive; keeping the preamble values",
                    );
                }
            }
            self.max_page_height = Some(header.max_page_height);
            self.max_page_width = Some(header.max_page_width);
            self.max_stack_depth = Some(header.max_stack_depth);
            declared_pages = Some(header.total_pages);
        }

        if let Some(failure) = outcome.failure {
            self.record_error(failure)?;
        }
        Ok((outcome.last_page_offset, declared_pages))
    }

    pub fn apply_page_index(&mut self, outcome: PageIndexOutcome) -> Result<()> {
        let mut pages = outcome.pages;
        if pages.len() > u16::MAX as usize {
            self.record_error(DviError::CorruptPageChain {
                offset: pages[u16::MAX as usize].offset,
                reason: format!(
                    "{} pages exceed the DVI page count limit; keeping the first {}",
                    pages.len(),
                    u16::MAX
                ),
            })?;
            pages.truncate(u16::MAX as usize);
        }
        self.page_offsets = pages.iter().map(|p| p.offset).collect();
        self.page_counters = pages.iter().map(|p| p.counters).collect();
        if let Some(failure) = outcome.failure {
            self.record_error(failure)?;
        }
        Ok(())
    }

    pub fn set_special_summary(&mut self, summary: SpecialSummary) {
        self.special_summary = Some(summary);
    }

    pub fn set_paper_size(&mut self, paper_size: Option<PaperSize>) {
        self.paper_size = paper_size;
    }

    /// Assemble the final document.
    pub fn build_document(self) -> DviDocument {
        info!(
            "Decoded DVI: {} pages, {} fonts, {} notifications ({} errors), stage {:?}",
            self.page_offsets.len(),
            self.fonts.len(),
            self.notifications.len(),
            self.notifications.error_count(),
            self.stage
        );
        DviDocument {
            data: self.data,
            version: self.preamble.version,
            trailer_id: self.location.map(|l| l.id_byte),
            generator_comment: self.preamble.comment,
            cm_per_dvi_unit: self.scale.cm_per_dvi_unit(),
            scale: self.scale,
            total_pages: self.page_offsets.len() as u16,
            page_offsets: self.page_offsets,
            page_counters: self.page_counters,
            postamble_offset: self.location.map(|l| l.offset),
            max_page_height: self.max_page_height,
            max_page_width: self.max_page_width,
            max_stack_depth: self.max_stack_depth,
            fonts: self.fonts,
            suggested_paper_size: self.paper_size,
            special_summary: self.special_summary,
            notifications: self.notifications,
            stage: self.stage,
        }
    }
}
