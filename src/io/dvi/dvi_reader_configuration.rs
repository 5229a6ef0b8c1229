//! Configuration for reading DVI files.

/// Configuration options for the DVI reader.
#[derive(Debug, Clone)]
pub struct DviReaderConfiguration {
    /// Walk the opcodes of every indexed page and summarise the specials
    /// found there. Default: `true`.
    ///
    /// Only operand lengths are interpreted, but every page byte is visited,
    /// so large documents take proportionally longer to load.
    pub prescan_specials: bool,

    /// Look for a `papersize=` hint in the preamble comment, the bytes
    /// before the first page and (when prescanning) the first page.
    /// Default: `true`.
    pub detect_paper_size: bool,

    /// Compare the postamble's scale factors with the preamble's and record
    /// a warning when they differ. The postamble values are used either way.
    /// Default: `true`.
    pub cross_check_scale: bool,

    /// Maximum number of notifications stored on the document. The error
    /// count keeps counting past this limit. Default: unbounded.
    pub max_notifications: usize,
}

impl Default for DviReaderConfiguration {
    fn default() -> Self {
        Self {
            prescan_specials: true,
            detect_paper_size: true,
            cross_check_scale: true,
            max_notifications: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = DviReaderConfiguration::default();
        assert!(cfg.prescan_specials);
        assert!(cfg.detect_paper_size);
        assert!(cfg.cross_check_scale);
        assert_eq!(cfg.max_notifications, usize::MAX);
    }
}
