use log::{debug, trace};

use crate::error::{DviError, Result};
use crate::io::dvi::byte_cursor::ByteCursor;
use crate::io::dvi::dvi_opcodes::*;
use crate::io::dvi::font_definition_registry::{
    FontDefinition, FontDefinitionRegistry, FontSource,
};
use crate::notification::NotificationCollection;
use crate::types::ScaleFactors;

use super::decode_text;
use super::postamble_locator::PostambleLocation;

/// Fixed postamble fields.
///
/// ```text
/// post[1] p[4] num[4] den[4] mag[4] l[4] u[4] s[2] t[2]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostambleHeader {
    /// Offset of the last page's BOP, or -1 for an empty document.
    pub last_page_offset: i32,
    pub scale: ScaleFactors,
    /// Height plus depth of the tallest page.
    pub max_page_height: u32,
    /// Width of the widest page.
    pub max_page_width: u32,
    pub max_stack_depth: u16,
    pub total_pages: u16,
}

/// Result of reading the postamble.
///
/// Whatever was read before a failure is kept: the last-page pointer is
/// available as soon as the first four bytes after POST could be read.
#[derive(Debug)]
pub struct PostambleOutcome {
    pub offset: u32,
    pub last_page_offset: Option<i32>,
    pub header: Option<PostambleHeader>,
    pub fonts: FontDefinitionRegistry,
    pub notifications: NotificationCollection,
    pub failure: Option<DviError>,
}

/// Reads the postamble fields and its font definitions.
pub struct PostambleReader;

impl PostambleReader {
    /// Read the postamble found by the trailer walk. Reads never go past
    /// the POST_POST opcode that closes it.
    pub fn read_located(data: &[u8], location: &PostambleLocation) -> PostambleOutcome {
        let end = location.post_post_offset.saturating_add(1).min(data.len());
        Self::read(&data[..end], location.offset)
    }

    /// Read the postamble whose POST opcode is at `offset`.
    pub fn read(data: &[u8], offset: u32) -> PostambleOutcome {
        let mut outcome = PostambleOutcome {
            offset,
            last_page_offset: None,
            header: None,
            fonts: FontDefinitionRegistry::new(),
            notifications: NotificationCollection::new(),
            failure: None,
        };

        let mut cursor = ByteCursor::new(data);
        if let Err(e) = Self::read_into(&mut cursor, offset, &mut outcome) {
            let failure = match e {
                DviError::TruncatedInput { offset, needed, .. } => DviError::TruncatedPostamble(
                    format!("ran out of data at offset {} reading {} bytes", offset, needed),
                ),
                other => other,
            };
            outcome.failure = Some(failure);
        }

        debug!(
            "Postamble: {} font definitions, header {}",
            outcome.fonts.len(),
            if outcome.header.is_some() { "complete" } else { "incomplete" }
        );
        outcome
    }

    fn read_into(
        cursor: &mut ByteCursor<'_>,
        offset: u32,
        outcome: &mut PostambleOutcome,
    ) -> Result<()> {
        cursor.seek(offset as usize)?;
        let opcode = cursor.read_u8()?;
        if opcode != POST {
            return Err(DviError::PostambleNotFound {
                offset,
                found: opcode,
            });
        }

        let last_page_offset = cursor.read_i32()?;
        outcome.last_page_offset = Some(last_page_offset);

        let numerator = cursor.read_u32()?;
        let denominator = cursor.read_u32()?;
        let magnification = cursor.read_u32()?;
        let max_page_height = cursor.read_u32()?;
        let max_page_width = cursor.read_u32()?;
        let max_stack_depth = cursor.read_u16()?;
        let total_pages = cursor.read_u16()?;
        outcome.header = Some(PostambleHeader {
            last_page_offset,
            scale: ScaleFactors::new(numerator, denominator, magnification),
            max_page_height,
            max_page_width,
            max_stack_depth,
            total_pages,
        });
        trace!(
            "Postamble header: last page {} pages {} max {}x{} stack {}",
            last_page_offset,
            total_pages,
            max_page_width,
            max_page_height,
            max_stack_depth
        );

        loop {
            let opcode_offset = cursor.position();
            let opcode = cursor.read_u8()?;
            let definition = match opcode {
                POST_POST => return Ok(()),
                NOP => continue,
                FNT_DEF1..=FNT_DEF4 => {
                    let font_id = cursor.read_unsigned(variant_width(opcode, FNT_DEF1))?;
                    read_font_definition(cursor, font_id)?
                }
                XDV_NATIVE_FONT_DEF => {
                    let font_id = cursor.read_u32()?;
                    read_native_font_definition(cursor, font_id)?
                }
                _ => {
                    return Err(DviError::UnexpectedOpcode {
                        opcode,
                        offset: opcode_offset,
                        context: "postamble font definitions",
                    })
                }
            };

            trace!("Postamble {}", definition);
            let font_id = definition.font_id;
            let design_size = definition.design_size;
            if let Some(previous) = outcome.fonts.register(definition) {
                outcome.notifications.warn(format!(
                    "Font {} defined twice in the postamble ('{}' design size {}, \
                     then design size {}); keeping the last definition",
                    font_id, previous.font_name, previous.design_size, design_size
                ));
            }
        }
    }
}

/// Read the body of a `fnt_def` record after its font number.
///
/// ```text
/// c[4] s[4] d[4] a[1] l[1] n[a+l]
/// ```
pub(crate) fn read_font_definition(
    cursor: &mut ByteCursor<'_>,
    font_id: u32,
) -> Result<FontDefinition> {
    let checksum = cursor.read_u32()?;
    let scaled_size = cursor.read_u32()?;
    let design_size = cursor.read_u32()?;
    let area_length = cursor.read_u8()? as usize;
    let name_length = cursor.read_u8()? as usize;
    let area = decode_text(cursor.read_bytes(area_length)?);
    let name = decode_text(cursor.read_bytes(name_length)?);
    Ok(FontDefinition {
        font_id,
        checksum,
        scaled_size,
        design_size,
        font_name: format!("{}{}", area, name),
        area,
        source: FontSource::Tfm,
    })
}

/// Read the body of a XeTeX native font definition after its font number.
///
/// ```text
/// size[4] flags[2] l[1] name[l] index[4] [rgba[4]] [extend[4]] [slant[4]] [embolden[4]]
/// ```
pub(crate) fn read_native_font_definition(
    cursor: &mut ByteCursor<'_>,
    font_id: u32,
) -> Result<FontDefinition> {
    let scaled_size = cursor.read_u32()?;
    let flags = cursor.read_u16()?;
    let name_length = cursor.read_u8()? as usize;
    let name = decode_text(cursor.read_bytes(name_length)?);
    let face_index = cursor.read_u32()?;
    for flag in [
        XDV_FLAG_COLORED,
        XDV_FLAG_EXTEND,
        XDV_FLAG_SLANT,
        XDV_FLAG_EMBOLDEN,
    ] {
        if flags & flag != 0 {
            cursor.skip(4)?;
        }
    }
    Ok(FontDefinition {
        font_id,
        checksum: 0,
        scaled_size,
        // Native fonts carry no design size; XeTeX assumes 10pt.
        design_size: 655_360,
        area: String::new(),
        font_name: name,
        source: FontSource::Native { face_index, flags },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postamble(last_page: i32, pages: u16) -> Vec<u8> {
        let mut v = vec![POST];
        v.extend_from_slice(&last_page.to_be_bytes());
        v.extend_from_slice(&25_400_000u32.to_be_bytes());
        v.extend_from_slice(&473_628_672u32.to_be_bytes());
        v.extend_from_slice(&1000u32.to_be_bytes());
        v.extend_from_slice(&43_725_786u32.to_be_bytes());
        v.extend_from_slice(&30_785_863u32.to_be_bytes());
        v.extend_from_slice(&3u16.to_be_bytes());
        v.extend_from_slice(&pages.to_be_bytes());
        v
    }

    fn fnt_def1(v: &mut Vec<u8>, id: u8, design: u32, name: &str) {
        v.push(FNT_DEF1);
        v.push(id);
        v.extend_from_slice(&0x4BF1_6079u32.to_be_bytes());
        v.extend_from_slice(&655_360u32.to_be_bytes());
        v.extend_from_slice(&design.to_be_bytes());
        v.push(0);
        v.push(name.len() as u8);
        v.extend_from_slice(name.as_bytes());
    }

    #[test]
    fn test_read_complete_postamble() {
        let mut data = postamble(100, 3);
        fnt_def1(&mut data, 0, 655_360, "cmr10");
        data.push(NOP);
        fnt_def1(&mut data, 1, 655_360, "cmbx10");
        data.push(POST_POST);

        let outcome = PostambleReader::read(&data, 0);
        assert!(outcome.failure.is_none());
        let header = outcome.header.unwrap();
        assert_eq!(header.last_page_offset, 100);
        assert_eq!(header.total_pages, 3);
        assert_eq!(header.max_stack_depth, 3);
        assert_eq!(header.scale, ScaleFactors::TEX_DEFAULT);
        assert_eq!(outcome.fonts.len(), 2);
        assert_eq!(outcome.fonts.lookup(1).unwrap().font_name, "cmbx10");
        assert_eq!(outcome.fonts.lookup(0).unwrap().checksum, 0x4BF1_6079);
        assert!(outcome.notifications.is_empty());
    }

    #[test]
    fn test_duplicate_font_last_wins() {
        let mut data = postamble(100, 1);
        fnt_def1(&mut data, 5, 655_360, "cmr10");
        fnt_def1(&mut data, 5, 786_432, "cmr12");
        data.push(POST_POST);

        let outcome = PostambleReader::read(&data, 0);
        assert!(outcome.failure.is_none());
        assert_eq!(outcome.fonts.len(), 1);
        assert_eq!(outcome.fonts.lookup(5).unwrap().design_size, 786_432);
        assert_eq!(outcome.notifications.len(), 1);
        assert_eq!(outcome.notifications.error_count(), 0);
    }

    #[test]
    fn test_wide_font_ids() {
        let mut data = postamble(100, 1);
        data.push(FNT_DEF3);
        data.extend_from_slice(&[0x01, 0x00, 0x02]);
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(&[4, 4]);
        data.extend_from_slice(b"/usrcmr9");
        data.push(POST_POST);

        let outcome = PostambleReader::read(&data, 0);
        assert!(outcome.failure.is_none());
        let font = outcome.fonts.lookup(0x010002).unwrap();
        assert_eq!(font.area, "/usr");
        assert_eq!(font.font_name, "/usrcmr9");
    }

    #[test]
    fn test_native_font() {
        let mut data = postamble(100, 1);
        data.push(XDV_NATIVE_FONT_DEF);
        data.extend_from_slice(&12u32.to_be_bytes());
        data.extend_from_slice(&655_360u32.to_be_bytes());
        data.extend_from_slice(&(XDV_FLAG_COLORED | XDV_FLAG_SLANT).to_be_bytes());
        data.push(5);
        data.extend_from_slice(b"Arial");
        data.extend_from_slice(&2u32.to_be_bytes());
        data.extend_from_slice(&[0xFF; 8]);
        data.push(POST_POST);

        let outcome = PostambleReader::read(&data, 0);
        assert!(outcome.failure.is_none());
        let font = outcome.fonts.lookup(12).unwrap();
        assert_eq!(font.font_name, "Arial");
        assert_eq!(
            font.source,
            FontSource::Native {
                face_index: 2,
                flags: XDV_FLAG_COLORED | XDV_FLAG_SLANT
            }
        );
    }

    #[test]
    fn test_truncated_font_block_keeps_earlier_fonts() {
        let mut data = postamble(100, 2);
        fnt_def1(&mut data, 0, 655_360, "cmr10");
        fnt_def1(&mut data, 1, 655_360, "cmbx10");
        data.truncate(data.len() - 3);

        let outcome = PostambleReader::read(&data, 0);
        assert!(matches!(outcome.failure, Some(DviError::TruncatedPostamble(_))));
        assert_eq!(outcome.header.unwrap().total_pages, 2);
        assert_eq!(outcome.fonts.len(), 1);
    }

    #[test]
    fn test_truncated_header_keeps_pointer() {
        let mut data = postamble(321, 2);
        data.truncate(10);
        let outcome = PostambleReader::read(&data, 0);
        assert!(matches!(outcome.failure, Some(DviError::TruncatedPostamble(_))));
        assert_eq!(outcome.last_page_offset, Some(321));
        assert!(outcome.header.is_none());
    }

    #[test]
    fn test_located_read_stops_at_post_post() {
        let mut data = postamble(100, 1);
        fnt_def1(&mut data, 0, 655_360, "cmr10");
        // Name length runs past the end of the postamble into the trailer.
        let name_length = data.len() - 6;
        data[name_length] = 40;
        let post_post_offset = data.len();
        data.push(POST_POST);
        data.extend_from_slice(&0u32.to_be_bytes());
        data.push(2);
        data.extend_from_slice(&[PADDING; 40]);

        let location = PostambleLocation {
            offset: 0,
            post_post_offset,
            id_byte: 2,
            padding: 40,
        };
        let outcome = PostambleReader::read_located(&data, &location);
        assert!(matches!(outcome.failure, Some(DviError::TruncatedPostamble(_))));
        assert!(outcome.fonts.is_empty());
        assert_eq!(outcome.header.unwrap().total_pages, 1);
    }

    #[test]
    fn test_unexpected_opcode() {
        let mut data = postamble(100, 1);
        fnt_def1(&mut data, 0, 655_360, "cmr10");
        data.push(BOP);
        let outcome = PostambleReader::read(&data, 0);
        assert!(matches!(
            outcome.failure,
            Some(DviError::UnexpectedOpcode { opcode: BOP, .. })
        ));
        assert_eq!(outcome.fonts.len(), 1);
    }
}
