//! Record predicate
//!
//! A record passes when its mapping quality reaches the minimum, every
//! required flag bit is set, and no excluded flag bit is set. The same
//! predicate is used by both the sequential and the indexed scanner.

use crate::core::error::FilterError;

/// SAM flag bits
pub mod flags {
    pub const PAIRED: u16 = 0x1;
    pub const PROPER_PAIR: u16 = 0x2;
    pub const UNMAPPED: u16 = 0x4;
    pub const MATE_UNMAPPED: u16 = 0x8;
    pub const REVERSE: u16 = 0x10;
    pub const MATE_REVERSE: u16 = 0x20;
    pub const FIRST_IN_PAIR: u16 = 0x40;
    pub const SECOND_IN_PAIR: u16 = 0x80;
    pub const SECONDARY: u16 = 0x100;
    pub const QC_FAIL: u16 = 0x200;
    pub const DUPLICATE: u16 = 0x400;
    pub const SUPPLEMENTARY: u16 = 0x800;
}

/// Fields of an alignment record the predicate looks at
pub trait AlignmentFields {
    /// FLAG bitmask
    fn status_bits(&self) -> u16;
    /// MAPQ
    fn mapping_quality(&self) -> u8;
}

/// Filter settings, built once before scanning and shared read-only
/// by every scanner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Minimum mapping quality (inclusive)
    pub min_mapq: u8,
    /// Bits that must all be set (`-f`)
    pub required_flags: u16,
    /// Bits that must all be unset (`-F`)
    pub excluded_flags: u16,
}

impl FilterConfig {
    pub fn new(min_mapq: u8, required_flags: u16, excluded_flags: u16) -> Self {
        Self {
            min_mapq,
            required_flags,
            excluded_flags,
        }
    }

    /// Evaluate the predicate on raw field values
    #[inline(always)]
    pub fn passes_fields(&self, status_bits: u16, mapq: u8) -> bool {
        mapq >= self.min_mapq
            && status_bits & self.required_flags == self.required_flags
            && status_bits & self.excluded_flags == 0
    }

    /// Evaluate the predicate on a record
    #[inline(always)]
    pub fn passes<R: AlignmentFields + ?Sized>(&self, record: &R) -> bool {
        self.passes_fields(record.status_bits(), record.mapping_quality())
    }
}

/// Parse a flag mask the way `strtol(s, 0, 0)` reads it: `0x` prefix for
/// hexadecimal, leading `0` for octal, decimal otherwise.
///
/// # Examples
/// ```
/// use fast_samview::core::parse_flag_mask;
/// assert_eq!(parse_flag_mask("4"), Ok(4));
/// assert_eq!(parse_flag_mask("0x904"), Ok(0x904));
/// assert_eq!(parse_flag_mask("010"), Ok(8));
/// ```
pub fn parse_flag_mask(s: &str) -> Result<u16, FilterError> {
    let trimmed = s.trim();
    let (digits, radix) = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        (hex, 16)
    } else if trimmed.len() > 1 && trimmed.starts_with('0') {
        (&trimmed[1..], 8)
    } else {
        (trimmed, 10)
    };

    let value = u32::from_str_radix(digits, radix)
        .map_err(|_| FilterError::InvalidMask(s.to_string()))?;
    u16::try_from(value).map_err(|_| FilterError::MaskOutOfRange(s.to_string()))
}
