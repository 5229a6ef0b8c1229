//! Paper size hints from `papersize=` specials and the preamble comment.

use ahash::AHashMap;
use log::debug;
use nom::{
    bytes::complete::tag_no_case,
    character::complete::{alpha1, char, multispace0},
    combinator::opt,
    number::complete::double,
    sequence::{delimited, separated_pair},
    IResult,
};
use once_cell::sync::Lazy;

use crate::types::{PaperSize, ScaleFactors};

/// Centimetres per TeX unit of measure.
static TEX_UNITS: Lazy<AHashMap<&'static str, f64>> = Lazy::new(|| {
    let pt = 2.54 / 72.27;
    let dd = 1238.0 / 1157.0 * pt;
    let mut units = AHashMap::new();
    units.insert("pt", pt);
    units.insert("pc", 12.0 * pt);
    units.insert("in", 2.54);
    units.insert("bp", 2.54 / 72.0);
    units.insert("cm", 1.0);
    units.insert("mm", 0.1);
    units.insert("dd", dd);
    units.insert("cc", 12.0 * dd);
    units.insert("sp", pt / 65536.0);
    units
});

const KEY: &str = "papersize=";

/// A dimension as written in the special.
#[derive(Debug, Clone, PartialEq)]
struct Dimension<'a> {
    value: f64,
    is_true: bool,
    unit: Option<&'a str>,
}

impl Dimension<'_> {
    /// Length in centimetres. Unitless values are DVI units; `true`
    /// dimensions ignore the document magnification.
    fn to_cm(&self, scale: &ScaleFactors) -> Option<f64> {
        let cm = match self.unit {
            None => self.value * scale.cm_per_dvi_unit(),
            Some(unit) => {
                let per_unit = TEX_UNITS.get(unit.to_ascii_lowercase().as_str())?;
                let mag = if self.is_true {
                    1.0
                } else {
                    scale.magnification_factor()
                };
                self.value * per_unit * mag
            }
        };
        (cm.is_finite() && cm > 0.0).then_some(cm)
    }
}

fn dimension(input: &str) -> IResult<&str, Dimension<'_>> {
    let (input, value) = delimited(multispace0, double, multispace0)(input)?;
    let (input, is_true) = opt(tag_no_case("true"))(input)?;
    let (input, unit) = delimited(multispace0, opt(alpha1), multispace0)(input)?;
    Ok((
        input,
        Dimension {
            value,
            is_true: is_true.is_some(),
            unit,
        },
    ))
}

fn dimension_pair(input: &str) -> IResult<&str, (Dimension<'_>, Dimension<'_>)> {
    separated_pair(dimension, char(','), dimension)(input)
}

/// Extracts a suggested paper size.
pub struct PaperSizeDetector;

impl PaperSizeDetector {
    /// First valid `papersize=` found in `sources`, searched in order.
    pub fn detect<'s, I>(sources: I, scale: &ScaleFactors) -> Option<PaperSize>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let size = sources
            .into_iter()
            .find_map(|text| Self::parse_special(text, scale));
        if let Some(size) = size {
            debug!("Suggested paper size: {}", size);
        }
        size
    }

    /// Parse the first valid `papersize=<width>,<height>` in `text`.
    pub fn parse_special(text: &str, scale: &ScaleFactors) -> Option<PaperSize> {
        let mut rest = text;
        while let Some(index) = rest.find(KEY) {
            let after = &rest[index + KEY.len()..];
            if let Ok((_, (width, height))) = dimension_pair(after) {
                if let (Some(w), Some(h)) = (width.to_cm(scale), height.to_cm(scale)) {
                    return Some(PaperSize::new(w, h));
                }
            }
            rest = after;
        }
        None
    }
}
