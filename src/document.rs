//! The decoded DVI document.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::io::dvi::dvi_stream_readers::SpecialSummary;
use crate::io::dvi::font_definition_registry::{FontDefinition, FontDefinitionRegistry, FontPool};
use crate::notification::{NotificationCollection, NotificationType};
use crate::types::{DecodeStage, DviVersion, PaperSize, ScaleFactors};

/// Structural index of a DVI file.
///
/// Created by [`DviReader`](crate::DviReader) and immutable afterwards, so a
/// document can be shared between threads without locking. The raw bytes
/// are kept alongside the index so that page content can be handed to an
/// interpreter.
#[derive(Debug, Clone)]
pub struct DviDocument {
    pub(crate) data: Arc<[u8]>,
    pub(crate) version: DviVersion,
    pub(crate) trailer_id: Option<u8>,
    pub(crate) generator_comment: String,
    pub(crate) scale: ScaleFactors,
    pub(crate) cm_per_dvi_unit: f64,
    pub(crate) total_pages: u16,
    pub(crate) page_offsets: Vec<u32>,
    pub(crate) page_counters: Vec<[i32; 10]>,
    pub(crate) postamble_offset: Option<u32>,
    pub(crate) max_page_height: Option<u32>,
    pub(crate) max_page_width: Option<u32>,
    pub(crate) max_stack_depth: Option<u16>,
    pub(crate) fonts: FontDefinitionRegistry,
    pub(crate) suggested_paper_size: Option<PaperSize>,
    pub(crate) special_summary: Option<SpecialSummary>,
    pub(crate) notifications: NotificationCollection,
    pub(crate) stage: DecodeStage,
}

impl DviDocument {
    /// Format variant from the preamble identification byte.
    pub fn version(&self) -> DviVersion {
        self.version
    }

    /// Identification byte found in the trailer, if the trailer was read.
    pub fn trailer_id(&self) -> Option<u8> {
        self.trailer_id
    }

    pub fn generator_comment(&self) -> &str {
        &self.generator_comment
    }

    pub fn scale(&self) -> ScaleFactors {
        self.scale
    }

    pub fn magnification(&self) -> u32 {
        self.scale.magnification
    }

    /// Centimetres per DVI unit, magnification included.
    pub fn cm_per_dvi_unit(&self) -> f64 {
        self.cm_per_dvi_unit
    }

    /// Number of pages reachable through the page chain.
    pub fn total_pages(&self) -> u16 {
        self.total_pages
    }

    /// BOP offsets in reading order, strictly increasing.
    pub fn page_offsets(&self) -> &[u32] {
        &self.page_offsets
    }

    pub fn page_offset(&self, index: usize) -> Option<u32> {
        self.page_offsets.get(index).copied()
    }

    /// The ten `\count` registers recorded in a page's BOP.
    pub fn page_counters(&self, index: usize) -> Option<[i32; 10]> {
        self.page_counters.get(index).copied()
    }

    /// Bytes of page `index`, from its BOP up to the next page, the
    /// postamble or the end of the data.
    pub fn page_bytes(&self, index: usize) -> Option<&[u8]> {
        let start = *self.page_offsets.get(index)? as usize;
        let end = self
            .page_offsets
            .get(index + 1)
            .copied()
            .or(self.postamble_offset)
            .map(|end| end as usize)
            .filter(|&end| end > start)
            .unwrap_or(self.data.len());
        self.data.get(start..end.min(self.data.len()))
    }

    pub fn postamble_offset(&self) -> Option<u32> {
        self.postamble_offset
    }

    pub fn max_page_height(&self) -> Option<u32> {
        self.max_page_height
    }

    pub fn max_page_width(&self) -> Option<u32> {
        self.max_page_width
    }

    pub fn max_stack_depth(&self) -> Option<u16> {
        self.max_stack_depth
    }

    /// Font definitions from the postamble, keyed by font number in file order.
    pub fn font_definitions(&self) -> &IndexMap<u32, FontDefinition> {
        self.fonts.all()
    }

    pub fn font(&self, font_id: u32) -> Option<&FontDefinition> {
        self.fonts.lookup(font_id)
    }

    /// Resolve every font definition through `pool`, in file order.
    ///
    /// Each definition is passed with its enlargement relative to the design
    /// size, magnification included.
    pub fn resolve_fonts<P: FontPool>(&self, pool: &P) -> Vec<(u32, Result<P::Glyphs, P::Error>)> {
        self.fonts
            .iter()
            .map(|def| {
                let enlargement = def.enlargement(self.scale.magnification);
                (def.font_id, pool.resolve(def, enlargement))
            })
            .collect()
    }

    pub fn suggested_paper_size(&self) -> Option<PaperSize> {
        self.suggested_paper_size
    }

    /// Special summary, present when specials were prescanned.
    pub fn special_summary(&self) -> Option<&SpecialSummary> {
        self.special_summary.as_ref()
    }

    pub fn notifications(&self) -> &NotificationCollection {
        &self.notifications
    }

    /// Messages of all stored notifications, in the order they were raised.
    /// Recoverable errors appear here too; see [`Self::error_count`].
    pub fn warnings(&self) -> Vec<&str> {
        self.notifications
            .iter()
            .map(|n| n.message.as_str())
            .collect()
    }

    /// Messages of the stored `Error` notifications.
    pub fn errors(&self) -> Vec<&str> {
        self.notifications
            .iter()
            .filter(|n| n.notification_type == NotificationType::Error)
            .map(|n| n.message.as_str())
            .collect()
    }

    /// Number of recoverable errors met while decoding.
    pub fn error_count(&self) -> u32 {
        self.notifications.error_count()
    }

    /// Last decode stage completed without error.
    pub fn stage(&self) -> DecodeStage {
        self.stage
    }

    pub fn is_degraded(&self) -> bool {
        self.stage != DecodeStage::Ready || self.error_count() > 0
    }

    /// The raw DVI bytes.
    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }
}
