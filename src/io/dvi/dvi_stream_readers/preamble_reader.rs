use log::debug;

use crate::error::{DviError, Result};
use crate::io::dvi::byte_cursor::ByteCursor;
use crate::io::dvi::dvi_opcodes::PRE;
use crate::types::{DviVersion, ScaleFactors};

use super::decode_text;

/// Contents of the preamble.
#[derive(Debug, Clone, PartialEq)]
pub struct Preamble {
    pub version: DviVersion,
    pub scale: ScaleFactors,
    /// Free-form comment, e.g. `" TeX output 2024.01.01:1200"`.
    pub comment: String,
    /// Offset of the first byte after the preamble.
    pub end_offset: usize,
}

impl Preamble {
    pub fn cm_per_dvi_unit(&self) -> f64 {
        self.scale.cm_per_dvi_unit()
    }
}

/// Reads the fixed preamble at the start of the file.
///
/// ```text
/// pre[1] i[1] num[4] den[4] mag[4] k[1] x[k]
/// ```
pub struct PreambleReader;

impl PreambleReader {
    /// Read the preamble. Every failure is reported as
    /// [`DviError::BadPreamble`]: without it the file cannot be interpreted.
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Preamble> {
        Self::read_fields(cursor).map_err(|e| match e {
            DviError::BadPreamble(_) => e,
            other => DviError::BadPreamble(other.to_string()),
        })
    }

    fn read_fields(cursor: &mut ByteCursor<'_>) -> Result<Preamble> {
        cursor.seek(0)?;
        let opcode = cursor.read_u8()?;
        if opcode != PRE {
            return Err(DviError::BadPreamble(format!(
                "file does not start with PRE (found {:#04x})",
                opcode
            )));
        }

        let id = cursor.read_u8()?;
        let version = DviVersion::from_id_byte(id).ok_or_else(|| {
            DviError::BadPreamble(format!("unsupported identification byte {}", id))
        })?;

        let numerator = cursor.read_u32()?;
        let denominator = cursor.read_u32()?;
        let magnification = cursor.read_u32()?;
        if numerator == 0 || denominator == 0 || magnification == 0 {
            return Err(DviError::BadPreamble(format!(
                "scale factors must be positive (num={}, den={}, mag={})",
                numerator, denominator, magnification
            )));
        }

        let comment_length = cursor.read_u8()? as usize;
        let comment = decode_text(cursor.read_bytes(comment_length)?);

        let scale = ScaleFactors::new(numerator, denominator, magnification);
        debug!(
            "Preamble: {} num={} den={} mag={} comment={:?}",
            version, numerator, denominator, magnification, comment
        );

        Ok(Preamble {
            version,
            scale,
            comment,
            end_offset: cursor.position(),
        })
    }
}
