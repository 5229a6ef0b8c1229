//! Big-endian cursor over an in-memory DVI buffer.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{DviError, Result};

/// Bounds-checked big-endian reader with a current position.
///
/// Every read either consumes exactly its width or fails with
/// [`DviError::TruncatedInput`] without moving the position.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Create a cursor already positioned at `position`.
    pub fn at(data: &'a [u8], position: usize) -> Result<Self> {
        let mut cursor = Self::new(data);
        cursor.seek(position)?;
        Ok(cursor)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Move to an absolute position in `[0, len]`.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(DviError::OutOfBounds {
                position: position as i64,
                len: self.data.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Move `offset` bytes towards the start of the buffer.
    pub fn seek_backward(&mut self, offset: usize) -> Result<()> {
        match self.position.checked_sub(offset) {
            Some(position) => {
                self.position = position;
                Ok(())
            }
            None => Err(DviError::OutOfBounds {
                position: self.position as i64 - offset as i64,
                len: self.data.len(),
            }),
        }
    }

    /// Skip `count` bytes forward.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    /// Borrow the next `count` bytes and advance past them.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(DviError::TruncatedInput {
                offset: self.position,
                needed: 1,
                remaining: 0,
            })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u24(self.take(3)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    /// Read an unsigned big-endian integer of 1 to 4 bytes.
    pub fn read_unsigned(&mut self, width: usize) -> Result<u32> {
        check_width(width, self.position)?;
        Ok(BigEndian::read_uint(self.take(width)?, width) as u32)
    }

    /// Read a signed big-endian integer of 1 to 4 bytes, sign-extending
    /// from the most significant bit of that width.
    pub fn read_signed(&mut self, width: usize) -> Result<i32> {
        check_width(width, self.position)?;
        Ok(BigEndian::read_int(self.take(width)?, width) as i32)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(DviError::TruncatedInput {
                offset: self.position,
                needed: count,
                remaining,
            });
        }
        let slice = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }
}

fn check_width(width: usize, offset: usize) -> Result<()> {
    if (1..=4).contains(&width) {
        Ok(())
    } else {
        Err(DviError::UnexpectedOpcode {
            opcode: width as u8,
            offset,
            context: "integer width",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_reads() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u8().unwrap(), 0x01);
        assert_eq!(c.read_u16().unwrap(), 0x0203);
        assert_eq!(c.read_u24().unwrap(), 0x040506);
        assert_eq!(c.read_u32().unwrap(), 0x0708090A);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn test_signed_sign_extension() {
        let data = [0xFF, 0xFF, 0xFE, 0x80, 0x00, 0x00, 0x7F];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_signed(1).unwrap(), -1);
        assert_eq!(c.read_signed(2).unwrap(), -2);
        assert_eq!(c.read_signed(3).unwrap(), -0x800000);
        assert_eq!(c.read_signed(1).unwrap(), 0x7F);
    }

    #[test]
    fn test_variable_width_unsigned() {
        let data = [0xFF, 0x12, 0x34, 0x56];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_unsigned(1).unwrap(), 0xFF);
        assert_eq!(c.read_unsigned(3).unwrap(), 0x123456);
    }

    #[test]
    fn test_truncated_read_keeps_position() {
        let data = [0x00, 0x01, 0x02];
        let mut c = ByteCursor::new(&data);
        c.read_u8().unwrap();
        match c.read_u32() {
            Err(DviError::TruncatedInput {
                offset,
                needed,
                remaining,
            }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
                assert_eq!(remaining, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(c.position(), 1);
    }

    #[test]
    fn test_seek_bounds() {
        let data = [0u8; 4];
        let mut c = ByteCursor::new(&data);
        assert!(c.seek(4).is_ok());
        assert_eq!(c.remaining(), 0);
        assert!(matches!(c.seek(5), Err(DviError::OutOfBounds { .. })));
        c.seek(2).unwrap();
        assert!(c.seek_backward(2).is_ok());
        assert_eq!(c.position(), 0);
        assert!(matches!(
            c.seek_backward(1),
            Err(DviError::OutOfBounds { position: -1, .. })
        ));
    }

    #[test]
    fn test_bad_width() {
        let data = [0u8; 8];
        let mut c = ByteCursor::new(&data);
        assert!(c.read_signed(0).is_err());
        assert!(c.read_unsigned(5).is_err());
    }
}
