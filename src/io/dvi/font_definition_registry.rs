//! Font definitions read from the postamble and the font-pool interface.
//!
//! The decoder only parses and forwards definitions. Turning a definition
//! into glyph data is the job of a [`FontPool`], invoked by the caller once
//! the document has been decoded.

use std::fmt;

use indexmap::IndexMap;

/// Where a font's metrics come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    /// A TFM font defined by `fnt_def1..4`.
    Tfm,
    /// A XeTeX native (OpenType/TrueType) font.
    Native { face_index: u32, flags: u16 },
}

/// A single font definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontDefinition {
    pub font_id: u32,
    pub checksum: u32,
    /// Size at which the font is used, in DVI units.
    pub scaled_size: u32,
    /// Design size, in DVI units.
    pub design_size: u32,
    /// Directory part of the name; usually empty.
    pub area: String,
    /// Font name including the area prefix, as used for lookups.
    pub font_name: String,
    pub source: FontSource,
}

impl FontDefinition {
    /// Create a TFM font definition.
    pub fn new(
        font_id: u32,
        checksum: u32,
        scaled_size: u32,
        design_size: u32,
        font_name: impl Into<String>,
    ) -> Self {
        Self {
            font_id,
            checksum,
            scaled_size,
            design_size,
            area: String::new(),
            font_name: font_name.into(),
            source: FontSource::Tfm,
        }
    }

    /// Factor by which the font has to be enlarged before use, given the
    /// document magnification (times 1000).
    pub fn enlargement(&self, magnification: u32) -> f64 {
        if self.design_size == 0 {
            return magnification as f64 / 1000.0;
        }
        (self.scaled_size as f64 * magnification as f64) / (self.design_size as f64 * 1000.0)
    }

    pub fn is_native(&self) -> bool {
        matches!(self.source, FontSource::Native { .. })
    }
}

impl fmt::Display for FontDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "font {} '{}' scaled {} design {} checksum {:#010x}",
            self.font_id, self.font_name, self.scaled_size, self.design_size, self.checksum
        )
    }
}

/// Font definitions keyed by font id, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontDefinitionRegistry {
    fonts: IndexMap<u32, FontDefinition>,
}

impl FontDefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. A later definition with the same id replaces
    /// the earlier one, which is returned.
    pub fn register(&mut self, definition: FontDefinition) -> Option<FontDefinition> {
        self.fonts.insert(definition.font_id, definition)
    }

    pub fn lookup(&self, font_id: u32) -> Option<&FontDefinition> {
        self.fonts.get(&font_id)
    }

    /// All definitions in the order their ids were first seen.
    pub fn all(&self) -> &IndexMap<u32, FontDefinition> {
        &self.fonts
    }

    pub fn iter(&self) -> impl Iterator<Item = &FontDefinition> {
        self.fonts.values()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

/// The font-pool collaborator.
///
/// Several documents may be decoded concurrently and resolve overlapping
/// font ids, so implementations must be shareable across threads and do
/// their own synchronisation.
pub trait FontPool: Send + Sync {
    /// Renderable glyph source for a font.
    type Glyphs;
    type Error;

    fn resolve(
        &self,
        definition: &FontDefinition,
        enlargement: f64,
    ) -> std::result::Result<Self::Glyphs, Self::Error>;
}
