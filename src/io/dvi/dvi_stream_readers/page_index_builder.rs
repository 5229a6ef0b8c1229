use ahash::AHashSet;
use log::{debug, trace};

use crate::error::{DviError, Result};
use crate::io::dvi::byte_cursor::ByteCursor;
use crate::io::dvi::dvi_opcodes::{BOP, NO_PREVIOUS_PAGE};

/// One page of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEntry {
    /// Offset of the page's BOP opcode.
    pub offset: u32,
    /// The ten `\count` registers recorded in the BOP.
    pub counters: [i32; 10],
}

/// Result of walking the page chain.
#[derive(Debug)]
pub struct PageIndexOutcome {
    /// Pages in file order.
    pub pages: Vec<PageEntry>,
    pub failure: Option<DviError>,
}

impl PageIndexOutcome {
    pub fn offsets(&self) -> Vec<u32> {
        self.pages.iter().map(|p| p.offset).collect()
    }
}

/// Rebuilds the page table from the reverse-linked BOP chain.
///
/// Each BOP ends with the offset of the previous page's BOP, the first page
/// holding -1. Walking from the postamble's last-page pointer therefore yields
/// the pages last to first.
pub struct PageIndexBuilder;

impl PageIndexBuilder {
    /// Walk the chain starting at `last_page_offset`.
    ///
    /// `declared_pages` is the postamble's page count, when known. A chain
    /// that ends cleanly with a different number of pages is reported as
    /// [`DviError::PageCountMismatch`]; the collected pages are kept as they
    /// are.
    pub fn build(
        data: &[u8],
        last_page_offset: i32,
        declared_pages: Option<u16>,
    ) -> PageIndexOutcome {
        let mut pages = Vec::new();
        let mut failure = None;

        if last_page_offset == NO_PREVIOUS_PAGE {
            if let Some(declared) = declared_pages.filter(|&d| d > 0) {
                failure = Some(DviError::PageCountMismatch {
                    declared,
                    found: 0,
                });
            }
            return PageIndexOutcome { pages, failure };
        }

        if let Err(e) = Self::walk(data, last_page_offset, &mut pages) {
            failure = Some(e);
        }
        pages.reverse();

        if failure.is_none() {
            if let Some(declared) = declared_pages {
                if pages.len() != declared as usize {
                    failure = Some(DviError::PageCountMismatch {
                        declared,
                        found: pages.len(),
                    });
                }
            }
        }

        debug!("Page index: {} pages", pages.len());
        PageIndexOutcome { pages, failure }
    }

    /// Like [`Self::build`], for pages that must all lie before the
    /// postamble at `postamble_offset`.
    pub fn build_before_postamble(
        data: &[u8],
        last_page_offset: i32,
        declared_pages: Option<u16>,
        postamble_offset: u32,
    ) -> PageIndexOutcome {
        if last_page_offset >= 0 && last_page_offset as u32 >= postamble_offset {
            return PageIndexOutcome {
                pages: Vec::new(),
                failure: Some(DviError::CorruptPageChain {
                    offset: last_page_offset as u32,
                    reason: format!(
                        "last page pointer does not precede the postamble at {}",
                        postamble_offset
                    ),
                }),
            };
        }
        let end = (postamble_offset as usize).min(data.len());
        Self::build(&data[..end], last_page_offset, declared_pages)
    }

    fn walk(data: &[u8], last_page_offset: i32, pages: &mut Vec<PageEntry>) -> Result<()> {
        let mut cursor = ByteCursor::new(data);
        let mut visited: AHashSet<u32> = AHashSet::new();

        if last_page_offset < 0 {
            return Err(DviError::CorruptPageChain {
                offset: last_page_offset as u32,
                reason: format!("invalid last page pointer {}", last_page_offset),
            });
        }
        let mut current = last_page_offset as u32;

        loop {
            visited.insert(current);
            let entry = Self::read_bop(&mut cursor, current)?;
            let previous = Self::read_previous(&mut cursor, current)?;
            pages.push(entry);
            trace!("Page at {} -> previous {}", current, previous);

            if previous == NO_PREVIOUS_PAGE {
                return Ok(());
            }
            if previous < 0 {
                return Err(DviError::CorruptPageChain {
                    offset: current,
                    reason: format!("invalid previous page pointer {}", previous),
                });
            }
            let previous = previous as u32;
            if visited.contains(&previous) {
                return Err(DviError::CorruptPageChain {
                    offset: current,
                    reason: format!("cycle: page pointer {} was already visited", previous),
                });
            }
            if previous >= current {
                return Err(DviError::CorruptPageChain {
                    offset: current,
                    reason: format!(
                        "previous page pointer {} does not precede the page",
                        previous
                    ),
                });
            }
            current = previous;
        }
    }

    fn read_bop(cursor: &mut ByteCursor<'_>, offset: u32) -> Result<PageEntry> {
        let len = cursor.len();
        cursor
            .seek(offset as usize)
            .map_err(|_| DviError::CorruptPageChain {
                offset,
                reason: format!("page pointer outside the file ({} bytes)", len),
            })?;

        let opcode = cursor.read_u8().map_err(|_| DviError::CorruptPageChain {
            offset,
            reason: "page pointer at end of file".into(),
        })?;
        if opcode != BOP {
            return Err(DviError::CorruptPageChain {
                offset,
                reason: format!("expected BOP, found opcode {}", opcode),
            });
        }

        let mut counters = [0i32; 10];
        for counter in counters.iter_mut() {
            *counter = cursor.read_i32().map_err(|_| truncated_bop(offset))?;
        }
        Ok(PageEntry { offset, counters })
    }

    fn read_previous(cursor: &mut ByteCursor<'_>, offset: u32) -> Result<i32> {
        cursor.read_i32().map_err(|_| truncated_bop(offset))
    }
}

fn truncated_bop(offset: u32) -> DviError {
    DviError::CorruptPageChain {
        offset,
        reason: "BOP record is truncated".into(),
    }
}
