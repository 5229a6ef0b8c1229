//! Core types used throughout dvi-index

use std::fmt;

/// DVI identification byte enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DviVersion {
    /// Standard TeX DVI (id 2)
    Standard,
    /// Ascii pTeX with vertical writing extension (id 3)
    PTeXVertical,
    /// XeTeX extended DVI, first revision (id 5)
    Xdv5,
    /// XeTeX extended DVI without the text-and-glyphs opcode (id 6)
    Xdv6,
    /// XeTeX extended DVI (id 7)
    Xdv7,
}

impl DviVersion {
    /// Map an identification byte to a version.
    pub fn from_id_byte(id: u8) -> Option<Self> {
        match id {
            2 => Some(DviVersion::Standard),
            3 => Some(DviVersion::PTeXVertical),
            5 => Some(DviVersion::Xdv5),
            6 => Some(DviVersion::Xdv6),
            7 => Some(DviVersion::Xdv7),
            _ => None,
        }
    }

    /// The identification byte written to the file.
    pub fn id_byte(&self) -> u8 {
        match self {
            DviVersion::Standard => 2,
            DviVersion::PTeXVertical => 3,
            DviVersion::Xdv5 => 5,
            DviVersion::Xdv6 => 6,
            DviVersion::Xdv7 => 7,
        }
    }

    /// Whether XeTeX native font and glyph opcodes may appear.
    pub fn is_xdv(&self) -> bool {
        matches!(self, DviVersion::Xdv5 | DviVersion::Xdv6 | DviVersion::Xdv7)
    }

    /// Whether `post_id` is a legal trailer id for a file whose preamble
    /// carries this version. pTeX writes id 2 in the preamble and id 3 in the
    /// trailer when vertical typesetting was used.
    pub fn matches_trailer(&self, post_id: u8) -> bool {
        post_id == self.id_byte() || (*self == DviVersion::Standard && post_id == 3)
    }
}

impl fmt::Display for DviVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DviVersion::Standard => write!(f, "DVI (id 2)"),
            DviVersion::PTeXVertical => write!(f, "pTeX DVI (id 3)"),
            other => write!(f, "XDV (id {})", other.id_byte()),
        }
    }
}

/// The three scale factors shared by the preamble and the postamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaleFactors {
    pub numerator: u32,
    pub denominator: u32,
    /// Magnification times 1000.
    pub magnification: u32,
}

impl ScaleFactors {
    /// Values TeX writes: DVI units are scaled points, no magnification.
    pub const TEX_DEFAULT: ScaleFactors = ScaleFactors {
        numerator: 25_400_000,
        denominator: 473_628_672,
        magnification: 1000,
    };

    pub fn new(numerator: u32, denominator: u32, magnification: u32) -> Self {
        Self {
            numerator,
            denominator,
            magnification,
        }
    }

    /// Centimetres per DVI unit.
    ///
    /// `num/den` gives units of 10^-7 m; the evaluation order is kept fixed
    /// so the resulting double is reproducible.
    pub fn cm_per_dvi_unit(&self) -> f64 {
        (self.numerator as f64 / self.denominator as f64)
            * (self.magnification as f64 / 1000.0)
            * (2.54 / 254000.0)
    }

    /// Magnification as a plain factor (1.0 for `mag = 1000`).
    pub fn magnification_factor(&self) -> f64 {
        self.magnification as f64 / 1000.0
    }
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self::TEX_DEFAULT
    }
}

impl fmt::Display for ScaleFactors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "num={}, den={}, mag={}",
            self.numerator, self.denominator, self.magnification
        )
    }
}

/// A paper size hint in centimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperSize {
    pub width_cm: f64,
    pub height_cm: f64,
}

impl PaperSize {
    pub fn new(width_cm: f64, height_cm: f64) -> Self {
        Self {
            width_cm,
            height_cm,
        }
    }

    pub fn is_landscape(&self) -> bool {
        self.width_cm > self.height_cm
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}cm x {:.2}cm", self.width_cm, self.height_cm)
    }
}

/// Stages of the decode pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecodeStage {
    Start,
    PreambleParsed,
    PostambleLocated,
    PostambleParsed,
    PageIndexBuilt,
    Ready,
}
