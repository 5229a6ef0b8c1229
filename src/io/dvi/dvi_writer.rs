//! Minimal DVI writer.
//!
//! Produces structurally valid files: preamble, pages with their
//! back-pointer chain, postamble with font definitions and the padded
//! trailer. Page content is written as given; the writer does not
//! typeset anything.

use std::io::{self, Cursor, Write};

use byteorder::{BigEndian, WriteBytesExt};

use crate::error::{DviError, Result};
use crate::types::{DviVersion, ScaleFactors};

use super::dvi_opcodes::*;
use super::font_definition_registry::{FontDefinition, FontDefinitionRegistry, FontSource};

/// Builds a DVI file in memory.
pub struct DviWriter {
    stream: Cursor<Vec<u8>>,
    version: DviVersion,
    scale: ScaleFactors,
    fonts: FontDefinitionRegistry,
    last_page: i32,
    page_open: bool,
    total_pages: u16,
    stack_depth: u16,
    max_stack_depth: u16,
    max_page_height: u32,
    max_page_width: u32,
}

impl DviWriter {
    /// Start a file and write its preamble. Comments longer than 255 bytes
    /// are cut.
    pub fn new(version: DviVersion, scale: ScaleFactors, comment: &str) -> Result<Self> {
        let mut writer = Self {
            stream: Cursor::new(Vec::new()),
            version,
            scale,
            fonts: FontDefinitionRegistry::new(),
            last_page: NO_PREVIOUS_PAGE,
            page_open: false,
            total_pages: 0,
            stack_depth: 0,
            max_stack_depth: 0,
            max_page_height: 0,
            max_page_width: 0,
        };
        let comment = comment.as_bytes();
        let comment = &comment[..comment.len().min(u8::MAX as usize)];

        writer.stream.write_u8(PRE)?;
        writer.stream.write_u8(version.id_byte())?;
        writer.write_scale()?;
        writer.stream.write_u8(comment.len() as u8)?;
        writer.stream.write_all(comment)?;
        Ok(writer)
    }

    /// Current length of the output.
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    /// Values stored in the postamble's `l` and `u` fields.
    pub fn set_max_page_size(&mut self, height: u32, width: u32) {
        self.max_page_height = height;
        self.max_page_width = width;
    }

    /// Write a font definition at the current position and remember it for
    /// the postamble.
    pub fn define_font(&mut self, definition: FontDefinition) -> Result<()> {
        write_font_definition(&mut self.stream, &definition)?;
        self.fonts.register(definition);
        Ok(())
    }

    /// Open a page. Returns the offset of its BOP.
    pub fn begin_page(&mut self, counters: [i32; 10]) -> Result<u32> {
        if self.page_open {
            return Err(self.misplaced(BOP, "page already open"));
        }
        let offset = self.offset()?;
        self.stream.write_u8(BOP)?;
        for counter in counters {
            self.stream.write_i32::<BigEndian>(counter)?;
        }
        self.stream.write_i32::<BigEndian>(self.last_page)?;
        self.last_page = offset as i32;
        self.page_open = true;
        self.stack_depth = 0;
        Ok(offset)
    }

    /// Append raw page content.
    pub fn content(&mut self, bytes: &[u8]) -> Result<()> {
        self.require_page(NOP)?;
        self.stream.write_all(bytes)?;
        Ok(())
    }

    pub fn set_char(&mut self, code: u8) -> Result<()> {
        self.require_page(SET1)?;
        if code > SET_CHAR_127 {
            self.stream.write_u8(SET1)?;
        }
        self.stream.write_u8(code)?;
        Ok(())
    }

    pub fn select_font(&mut self, font_id: u32) -> Result<()> {
        self.require_page(FNT1)?;
        if font_id <= u32::from(FNT_NUM_63 - FNT_NUM_0) {
            self.stream.write_u8(FNT_NUM_0 + font_id as u8)?;
        } else {
            let width = minimal_width(font_id);
            self.stream.write_u8(FNT1 + width as u8 - 1)?;
            self.stream.write_uint::<BigEndian>(u64::from(font_id), width)?;
        }
        Ok(())
    }

    pub fn push(&mut self) -> Result<()> {
        self.require_page(PUSH)?;
        self.stream.write_u8(PUSH)?;
        self.stack_depth = self.stack_depth.saturating_add(1);
        self.max_stack_depth = self.max_stack_depth.max(self.stack_depth);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<()> {
        self.require_page(POP)?;
        if self.stack_depth == 0 {
            return Err(self.misplaced(POP, "pop without push"));
        }
        self.stream.write_u8(POP)?;
        self.stack_depth -= 1;
        Ok(())
    }

    /// Write a special with the shortest length encoding.
    pub fn special(&mut self, text: &str) -> Result<()> {
        let bytes = text.as_bytes();
        let length = u32::try_from(bytes.len())
            .map_err(|_| invalid_input("special longer than 4 GiB"))?;
        let width = minimal_width(length);
        self.stream.write_u8(XXX1 + width as u8 - 1)?;
        self.stream.write_uint::<BigEndian>(u64::from(length), width)?;
        self.stream.write_all(bytes)?;
        Ok(())
    }

    pub fn end_page(&mut self) -> Result<()> {
        self.require_page(EOP)?;
        self.stream.write_u8(EOP)?;
        self.page_open = false;
        self.total_pages = self.total_pages.saturating_add(1);
        Ok(())
    }

    /// Write postamble and trailer, padding to a multiple of four bytes
    /// with at least four fill bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        self.finish_with(None)
    }

    /// Write postamble and trailer with exactly `padding` fill bytes.
    pub fn finish_with_padding(self, padding: usize) -> Result<Vec<u8>> {
        self.finish_with(Some(padding))
    }

    fn finish_with(mut self, padding: Option<usize>) -> Result<Vec<u8>> {
        if self.page_open {
            return Err(self.misplaced(POST, "page still open"));
        }
        let postamble = self.offset()?;
        self.stream.write_u8(POST)?;
        self.stream.write_i32::<BigEndian>(self.last_page)?;
        self.write_scale()?;
        self.stream.write_u32::<BigEndian>(self.max_page_height)?;
        self.stream.write_u32::<BigEndian>(self.max_page_width)?;
        self.stream.write_u16::<BigEndian>(self.max_stack_depth)?;
        self.stream.write_u16::<BigEndian>(self.total_pages)?;
        for definition in self.fonts.iter() {
            write_font_definition(&mut self.stream, definition)?;
        }
        self.stream.write_u8(POST_POST)?;
        self.stream.write_u32::<BigEndian>(postamble)?;
        self.stream.write_u8(self.version.id_byte())?;

        let padding = padding.unwrap_or_else(|| {
            let length = self.stream.position() as usize;
            4 + (4 - length % 4) % 4
        });
        self.stream.write_all(&vec![PADDING; padding])?;
        Ok(self.stream.into_inner())
    }

    fn write_scale(&mut self) -> Result<()> {
        self.stream.write_u32::<BigEndian>(self.scale.numerator)?;
        self.stream.write_u32::<BigEndian>(self.scale.denominator)?;
        self.stream.write_u32::<BigEndian>(self.scale.magnification)?;
        Ok(())
    }

    fn offset(&self) -> Result<u32> {
        u32::try_from(self.stream.position())
            .map_err(|_| invalid_input("output exceeds the 32-bit offset range"))
    }

    fn require_page(&self, opcode: u8) -> Result<()> {
        if self.page_open {
            Ok(())
        } else {
            Err(self.misplaced(opcode, "no open page"))
        }
    }

    fn misplaced(&self, opcode: u8, context: &'static str) -> DviError {
        DviError::UnexpectedOpcode {
            opcode,
            offset: self.stream.position() as usize,
            context,
        }
    }
}

/// Bytes needed to hold `value`, between 1 and 4.
fn minimal_width(value: u32) -> usize {
    match value {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    }
}

fn invalid_input(message: &str) -> DviError {
    DviError::Io(io::Error::new(io::ErrorKind::InvalidInput, message.to_string()))
}

fn write_font_definition<W: Write>(stream: &mut W, definition: &FontDefinition) -> Result<()> {
    match definition.source {
        FontSource::Tfm => {
            let name = definition
                .font_name
                .strip_prefix(definition.area.as_str())
                .unwrap_or(&definition.font_name);
            let area = definition.area.as_bytes();
            let name = name.as_bytes();
            if area.len() > u8::MAX as usize || name.len() > u8::MAX as usize {
                return Err(invalid_input("font area or name longer than 255 bytes"));
            }
            let width = minimal_width(definition.font_id);
            stream.write_u8(FNT_DEF1 + width as u8 - 1)?;
            stream.write_uint::<BigEndian>(u64::from(definition.font_id), width)?;
            stream.write_u32::<BigEndian>(definition.checksum)?;
            stream.write_u32::<BigEndian>(definition.scaled_size)?;
            stream.write_u32::<BigEndian>(definition.design_size)?;
            stream.write_u8(area.len() as u8)?;
            stream.write_u8(name.len() as u8)?;
            stream.write_all(area)?;
            stream.write_all(name)?;
        }
        FontSource::Native { face_index, flags } => {
            let name = definition.font_name.as_bytes();
            if name.len() > u8::MAX as usize {
                return Err(invalid_input("font name longer than 255 bytes"));
            }
            stream.write_u8(XDV_NATIVE_FONT_DEF)?;
            stream.write_u32::<BigEndian>(definition.font_id)?;
            stream.write_u32::<BigEndian>(definition.scaled_size)?;
            stream.write_u16::<BigEndian>(flags)?;
            stream.write_u8(name.len() as u8)?;
            stream.write_all(name)?;
            stream.write_u32::<BigEndian>(face_index)?;
            for flag in [
                XDV_FLAG_COLORED,
                XDV_FLAG_EXTEND,
                XDV_FLAG_SLANT,
                XDV_FLAG_EMBOLDEN,
            ] {
                if flags & flag != 0 {
                    stream.write_u32::<BigEndian>(0)?;
                }
            }
        }
    }
    Ok(())
}
