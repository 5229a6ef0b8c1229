use log::{debug, trace};

use crate::error::{DviError, Result};
use crate::io::dvi::byte_cursor::ByteCursor;
use crate::io::dvi::dvi_opcodes::{PADDING, POST, POST_POST};
use crate::types::DviVersion;

/// Where the postamble lives, as recorded by the trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostambleLocation {
    /// Offset of the POST opcode.
    pub offset: u32,
    /// Offset of the POST_POST opcode.
    pub post_post_offset: usize,
    /// Identification byte found in the trailer.
    pub id_byte: u8,
    /// Number of fill bytes after the identification byte.
    pub padding: usize,
}

/// Finds the postamble by walking the trailer backwards.
///
/// ```text
/// post_post[1] q[4] i[1] 223[0..]
/// ```
pub struct PostambleLocator;

impl PostambleLocator {
    pub fn locate(data: &[u8]) -> Result<PostambleLocation> {
        let mut cursor = ByteCursor::new(data);
        cursor.seek(data.len())?;

        let mut padding = 0usize;
        let id_byte = loop {
            if cursor.seek_backward(1).is_err() {
                return Err(DviError::MalformedTrailer(
                    "no identification byte before the end of the file".into(),
                ));
            }
            let byte = cursor.peek_u8()?;
            if byte != PADDING {
                break byte;
            }
            padding += 1;
        };
        trace!("Trailer: {} padding bytes, id byte {}", padding, id_byte);

        if DviVersion::from_id_byte(id_byte).is_none() {
            return Err(DviError::MalformedTrailer(format!(
                "unknown identification byte {} at offset {}",
                id_byte,
                cursor.position()
            )));
        }

        cursor.seek_backward(4).map_err(|_| {
            DviError::MalformedTrailer("file too short for a postamble pointer".into())
        })?;
        let pointer_offset = cursor.position();
        let postamble_offset = cursor.read_u32()?;

        cursor.seek(pointer_offset)?;
        cursor.seek_backward(1).map_err(|_| {
            DviError::MalformedTrailer("file too short for a POST_POST marker".into())
        })?;
        let post_post_offset = cursor.position();
        let marker = cursor.read_u8()?;
        if marker != POST_POST {
            return Err(DviError::MalformedTrailer(format!(
                "expected POST_POST at offset {}, found {:#04x}",
                post_post_offset, marker
            )));
        }

        if postamble_offset as usize >= post_post_offset {
            return Err(DviError::PostambleNotFound {
                offset: postamble_offset,
                found: data.get(postamble_offset as usize).copied().unwrap_or(0),
            });
        }
        let found = data[postamble_offset as usize];
        if found != POST {
            return Err(DviError::PostambleNotFound {
                offset: postamble_offset,
                found,
            });
        }

        debug!("Postamble located at offset {}", postamble_offset);
        Ok(PostambleLocation {
            offset: postamble_offset,
            post_post_offset,
            id_byte,
            padding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trailer(prefix: &[u8], pointer: u32, id: u8, padding: usize) -> Vec<u8> {
        let mut v = prefix.to_vec();
        v.push(POST_POST);
        v.extend_from_slice(&pointer.to_be_bytes());
        v.push(id);
        v.extend(std::iter::repeat(PADDING).take(padding));
        v
    }

    #[test]
    fn test_locate_with_padding() {
        let data = trailer(&[0, 0, POST, 1, 2], 2, 2, 4);
        let loc = PostambleLocator::locate(&data).unwrap();
        assert_eq!(loc.offset, 2);
        assert_eq!(loc.post_post_offset, 5);
        assert_eq!(loc.id_byte, 2);
        assert_eq!(loc.padding, 4);
    }

    #[test]
    fn test_locate_without_padding() {
        let data = trailer(&[POST], 0, 7, 0);
        let loc = PostambleLocator::locate(&data).unwrap();
        assert_eq!(loc.offset, 0);
        assert_eq!(loc.padding, 0);
    }

    #[test]
    fn test_all_padding() {
        let data = vec![PADDING; 12];
        assert!(matches!(
            PostambleLocator::locate(&data),
            Err(DviError::MalformedTrailer(_))
        ));
    }

    #[test]
    fn test_empty_buffer() {
        assert!(matches!(
            PostambleLocator::locate(&[]),
            Err(DviError::MalformedTrailer(_))
        ));
    }

    #[test]
    fn test_bad_id_byte() {
        let data = trailer(&[POST], 0, 42, 4);
        assert!(matches!(
            PostambleLocator::locate(&data),
            Err(DviError::MalformedTrailer(_))
        ));
    }

    #[test]
    fn test_missing_post_post() {
        let mut data = trailer(&[POST, 0], 0, 2, 4);
        data[2] = 0;
        assert!(matches!(
            PostambleLocator::locate(&data),
            Err(DviError::MalformedTrailer(_))
        ));
    }

    #[test]
    fn test_pointer_to_non_post() {
        let data = trailer(&[0, 0, 0], 1, 2, 4);
        assert!(matches!(
            PostambleLocator::locate(&data),
            Err(DviError::PostambleNotFound { offset: 1, found: 0 })
        ));
    }

    #[test]
    fn test_pointer_past_trailer() {
        let data = trailer(&[POST], 1000, 2, 4);
        assert!(matches!(
            PostambleLocator::locate(&data),
            Err(DviError::PostambleNotFound { offset: 1000, .. })
        ));
    }

    #[test]
    fn test_short_file() {
        let data = vec![0x01, 0x02, 2, PADDING];
        assert!(matches!(
            PostambleLocator::locate(&data),
            Err(DviError::MalformedTrailer(_))
        ));
    }
}
