use bitflags::bitflags;
use log::trace;

use crate::error::{DviError, Result};
use crate::io::dvi::byte_cursor::ByteCursor;
use crate::io::dvi::dvi_opcodes::*;

use super::decode_text;

bitflags! {
    /// Kinds of specials seen while prescanning.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpecialFlags: u16 {
        /// Inline PostScript (`ps:`, `"`, `!`, `header=`).
        const POSTSCRIPT = 0x0001;
        /// Included PostScript/EPS files (`psfile=`, `PSfile=`).
        const EXTERNAL_PS_FILE = 0x0002;
        /// Source specials (`src:`) linking back to the TeX input.
        const SOURCE_SPECIALS = 0x0004;
        const PAPERSIZE = 0x0008;
        const LANDSCAPE = 0x0010;
        /// Hyperlinks (`html:`).
        const HYPERTEXT = 0x0020;
        const COLOR = 0x0040;
    }
}

impl Default for SpecialFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Summary of the specials found on all indexed pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialSummary {
    pub flags: SpecialFlags,
    pub total_specials: u32,
    pub postscript_specials: u32,
    pub external_ps_files: u16,
    pub source_specials: u32,
}

impl SpecialSummary {
    /// Account for one special payload.
    pub fn record(&mut self, special: &str) {
        self.total_specials = self.total_specials.saturating_add(1);
        let kind = classify(special);
        if kind.contains(SpecialFlags::POSTSCRIPT) {
            self.postscript_specials = self.postscript_specials.saturating_add(1);
        }
        if kind.contains(SpecialFlags::EXTERNAL_PS_FILE) {
            self.external_ps_files = self.external_ps_files.saturating_add(1);
        }
        if kind.contains(SpecialFlags::SOURCE_SPECIALS) {
            self.source_specials = self.source_specials.saturating_add(1);
        }
        self.flags |= kind;
    }

    pub fn has_postscript(&self) -> bool {
        self.flags
            .intersects(SpecialFlags::POSTSCRIPT | SpecialFlags::EXTERNAL_PS_FILE)
    }
}

/// Classify a special by its prefix. PostScript is never interpreted.
pub fn classify(special: &str) -> SpecialFlags {
    let s = special.trim_start();
    let lower = s.to_ascii_lowercase();
    let mut flags = SpecialFlags::empty();
    if lower.starts_with("psfile=") {
        flags |= SpecialFlags::EXTERNAL_PS_FILE;
    } else if lower.starts_with("ps:")
        || lower.starts_with("header=")
        || s.starts_with('"')
        || s.starts_with('!')
    {
        flags |= SpecialFlags::POSTSCRIPT;
    }
    if lower.starts_with("src:") {
        flags |= SpecialFlags::SOURCE_SPECIALS;
    }
    if lower.starts_with("papersize") {
        flags |= SpecialFlags::PAPERSIZE;
    }
    if lower.starts_with("landscape") {
        flags |= SpecialFlags::LANDSCAPE;
    }
    if lower.starts_with("html:") {
        flags |= SpecialFlags::HYPERTEXT;
    }
    if lower.starts_with("color") || lower.starts_with("background") {
        flags |= SpecialFlags::COLOR;
    }
    flags
}

/// Walks opcode streams and extracts special payloads.
///
/// Only operand lengths are interpreted; nothing is typeset.
pub struct SpecialScanner;

impl SpecialScanner {
    /// Specials of the page whose BOP is at `offset`, up to its EOP.
    pub fn scan_page(data: &[u8], offset: u32) -> Result<Vec<String>> {
        let mut cursor = ByteCursor::at(data, offset as usize)?;
        let opcode = cursor.read_u8()?;
        if opcode != BOP {
            return Err(DviError::UnexpectedOpcode {
                opcode,
                offset: offset as usize,
                context: "page start",
            });
        }
        cursor.skip(BOP_LENGTH - 1)?;

        let mut specials = Vec::new();
        loop {
            let opcode_offset = cursor.position();
            let opcode = cursor.read_u8()?;
            match opcode {
                EOP => break,
                XXX1..=XXX4 => specials.push(read_special(&mut cursor, opcode)?),
                _ => skip_operands(&mut cursor, opcode, opcode_offset, "page")?,
            }
        }
        trace!("Page at {}: {} specials", offset, specials.len());
        Ok(specials)
    }

    /// Specials between the end of the preamble and the first BOP.
    ///
    /// Only NOP, font definitions and specials are accepted there; scanning
    /// stops at the first BOP or any other opcode.
    pub fn scan_leading(data: &[u8], start: usize) -> Vec<String> {
        let mut specials = Vec::new();
        let mut cursor = match ByteCursor::at(data, start) {
            Ok(c) => c,
            Err(_) => return specials,
        };
        while let Ok(opcode) = cursor.read_u8() {
            let opcode_offset = cursor.position() - 1;
            let step = match opcode {
                XXX1..=XXX4 => read_special(&mut cursor, opcode).map(|s| specials.push(s)),
                NOP | FNT_DEF1..=FNT_DEF4 => {
                    skip_operands(&mut cursor, opcode, opcode_offset, "leading bytes")
                }
                _ => break,
            };
            if step.is_err() {
                break;
            }
        }
        specials
    }
}

fn read_special(cursor: &mut ByteCursor<'_>, opcode: u8) -> Result<String> {
    let length = cursor.read_unsigned(variant_width(opcode, XXX1))? as usize;
    Ok(decode_text(cursor.read_bytes(length)?))
}

/// Skip the operands of any opcode that may appear inside a page.
fn skip_operands(
    cursor: &mut ByteCursor<'_>,
    opcode: u8,
    opcode_offset: usize,
    context: &'static str,
) -> Result<()> {
    if let Some(length) = fixed_operand_length(opcode) {
        if opcode == BOP {
            return Err(DviError::UnexpectedOpcode {
                opcode,
                offset: opcode_offset,
                context,
            });
        }
        return cursor.skip(length);
    }
    match opcode {
        XXX1..=XXX4 => {
            let length = cursor.read_unsigned(variant_width(opcode, XXX1))? as usize;
            cursor.skip(length)
        }
        FNT_DEF1..=FNT_DEF4 => {
            cursor.skip(variant_width(opcode, FNT_DEF1) + 12)?;
            let area = cursor.read_u8()? as usize;
            let name = cursor.read_u8()? as usize;
            cursor.skip(area + name)
        }
        XDV_NATIVE_FONT_DEF => {
            cursor.skip(8)?;
            let flags = cursor.read_u16()?;
            let name = cursor.read_u8()? as usize;
            cursor.skip(name + 4)?;
            let optional = [
                XDV_FLAG_COLORED,
                XDV_FLAG_EXTEND,
                XDV_FLAG_SLANT,
                XDV_FLAG_EMBOLDEN,
            ]
            .iter()
            .filter(|&&f| flags & f != 0)
            .count();
            cursor.skip(optional * 4)
        }
        XDV_GLYPHS => {
            cursor.skip(4)?;
            let glyphs = cursor.read_u16()? as usize;
            cursor.skip(glyphs * 10)
        }
        XDV_TEXT_AND_GLYPHS => {
            let chars = cursor.read_u16()? as usize;
            cursor.skip(chars * 2 + 4)?;
            let glyphs = cursor.read_u16()? as usize;
            cursor.skip(glyphs * 10)
        }
        _ => Err(DviError::UnexpectedOpcode {
            opcode,
            offset: opcode_offset,
            context,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bop(data: &mut Vec<u8>) -> u32 {
        let offset = data.len() as u32;
        data.push(BOP);
        data.extend_from_slice(&[0u8; 40]);
        data.extend_from_slice(&(-1i32).to_be_bytes());
        offset
    }

    fn xxx1(data: &mut Vec<u8>, text: &str) {
        data.push(XXX1);
        data.push(text.len() as u8);
        data.extend_from_slice(text.as_bytes());
    }

    #[test]
    fn test_scan_page_collects_specials() {
        let mut data = Vec::new();
        let offset = bop(&mut data);
        data.extend_from_slice(&[PUSH, 72, 101, RIGHT1 + 1, 0x01, 0x00]);
        xxx1(&mut data, "ps: 0 0 moveto");
        data.extend_from_slice(&[DOWN4, 0, 0, 0, 1, FNT_NUM_0 + 3, POP]);
        data.push(XXX4);
        data.extend_from_slice(&11u32.to_be_bytes());
        data.extend_from_slice(b"src:12a.tex");
        data.extend_from_slice(&[SET_RULE, 0, 0, 0, 1, 0, 0, 0, 2, EOP]);

        let specials = SpecialScanner::scan_page(&data, offset).unwrap();
        assert_eq!(specials, vec!["ps: 0 0 moveto", "src:12a.tex"]);
    }

    #[test]
    fn test_scan_page_skips_font_defs_and_glyphs() {
        let mut data = Vec::new();
        let offset = bop(&mut data);
        data.push(FNT_DEF1);
        data.push(3);
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(&[0, 5]);
        data.extend_from_slice(b"cmr10");
        data.push(XDV_GLYPHS);
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&[0u8; 10]);
        xxx1(&mut data, "papersize=210mm,297mm");
        data.push(EOP);

        let specials = SpecialScanner::scan_page(&data, offset).unwrap();
        assert_eq!(specials, vec!["papersize=210mm,297mm"]);
    }

    #[test]
    fn test_scan_page_rejects_unknown_opcode() {
        let mut data = Vec::new();
        let offset = bop(&mut data);
        data.push(PRE);
        data.push(EOP);
        assert!(matches!(
            SpecialScanner::scan_page(&data, offset),
            Err(DviError::UnexpectedOpcode { opcode: PRE, .. })
        ));
    }

    #[test]
    fn test_scan_page_passes_reflect_opcodes() {
        let mut data = Vec::new();
        let offset = bop(&mut data);
        data.extend_from_slice(&[BEGIN_REFLECT, 65, END_REFLECT]);
        xxx1(&mut data, "papersize=210mm,297mm");
        data.push(EOP);

        let specials = SpecialScanner::scan_page(&data, offset).unwrap();
        assert_eq!(specials, vec!["papersize=210mm,297mm"]);
    }

    #[test]
    fn test_scan_page_truncated() {
        let mut data = Vec::new();
        let offset = bop(&mut data);
        data.push(XXX1);
        data.push(40);
        data.extend_from_slice(b"short");
        assert!(matches!(
            SpecialScanner::scan_page(&data, offset),
            Err(DviError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_scan_leading() {
        let mut data = vec![0u8; 4];
        data.push(NOP);
        xxx1(&mut data, "papersize=8.5in,11in");
        data.push(FNT_DEF1);
        data.push(0);
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(&[0, 0]);
        xxx1(&mut data, "landscape");
        bop(&mut data);
        xxx1(&mut data, "not leading");

        let specials = SpecialScanner::scan_leading(&data, 4);
        assert_eq!(specials, vec!["papersize=8.5in,11in", "landscape"]);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("ps: newpath"), SpecialFlags::POSTSCRIPT);
        assert_eq!(classify("\" 0 0 moveto"), SpecialFlags::POSTSCRIPT);
        assert_eq!(classify("PSfile=fig.eps"), SpecialFlags::EXTERNAL_PS_FILE);
        assert_eq!(classify("src:10file.tex"), SpecialFlags::SOURCE_SPECIALS);
        assert_eq!(classify("html:<a href=\"#x\">"), SpecialFlags::HYPERTEXT);
        assert_eq!(classify("color push rgb 1 0 0"), SpecialFlags::COLOR);
        assert!(classify("em:linewidth 1pt").is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = SpecialSummary::default();
        for s in ["ps: a", "psfile=x.eps", "src:1a.tex", "src:2a.tex", "landscape"] {
            summary.record(s);
        }
        assert_eq!(summary.total_specials, 5);
        assert_eq!(summary.postscript_specials, 1);
        assert_eq!(summary.external_ps_files, 1);
        assert_eq!(summary.source_specials, 2);
        assert!(summary.has_postscript());
        assert!(summary.flags.contains(SpecialFlags::LANDSCAPE));
        assert!(!summary.flags.contains(SpecialFlags::PAPERSIZE));
    }
}
