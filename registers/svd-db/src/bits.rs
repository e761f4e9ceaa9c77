// Licensed under the Apache-2.0 license

//! Bit-spec normalizer.
//!
//! SVD files describe a field's position in one of three ways:
//!
//! | encoding                 | example                         |
//! |--------------------------|---------------------------------|
//! | `bitOffset` + `bitWidth` | `<bitOffset>16</bitOffset><bitWidth>4</bitWidth>` |
//! | `bitRange`               | `<bitRange>[19:16]</bitRange>`  |
//! | `lsb` + `msb`            | `<lsb>16</lsb><msb>19</msb>`    |
//!
//! All of them are reduced to a [`BitPosition`]. The `lsb`/`msb` form is
//! recognised but rejected.

use registers_svd::Field;
use thiserror::Error;

/// Canonical position of a field within its register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitPosition {
    pub bit_offset: u32,
    pub num_bits: u32,
}

impl BitPosition {
    pub fn new(bit_offset: u32, num_bits: u32) -> Self {
        Self {
            bit_offset,
            num_bits,
        }
    }

    /// `2^num_bits - 1`, not shifted into place.
    pub fn mask(&self) -> u64 {
        if self.num_bits >= u64::BITS {
            u64::MAX
        } else {
            (1u64 << self.num_bits) - 1
        }
    }

    /// The mask shifted left by `bit_offset`.
    pub fn shifted_mask(&self) -> u64 {
        self.mask().checked_shl(self.bit_offset).unwrap_or(0)
    }

    /// One past the highest bit covered by the field.
    pub fn end(&self) -> u32 {
        self.bit_offset.saturating_add(self.num_bits)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitSpecError {
    #[error("unable to convert {element} {value:?} to an integer")]
    InvalidInteger { element: &'static str, value: String },

    #[error("bitRange {0:?} is not of the form [msb:lsb]")]
    InvalidRange(String),

    #[error("bit width must be at least 1")]
    ZeroWidth,

    #[error("lsb/msb bit positions are not handled")]
    LsbMsbUnsupported,

    #[error("no valid bit position found")]
    Missing,
}

/// The bit-position encoding a field was written with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitSpec<'a> {
    OffsetWidth { offset: &'a str, width: &'a str },
    Range(&'a str),
    LsbMsb { lsb: &'a str, msb: &'a str },
}

impl<'a> BitSpec<'a> {
    /// Detect which encoding `field` uses.
    ///
    /// When several are present the first complete one in the order
    /// offset/width, range, lsb/msb wins.
    pub fn of(field: &'a Field) -> Option<Self> {
        let present = |v: &'a Option<String>| v.as_deref().filter(|s| !s.is_empty());

        if let (Some(offset), Some(width)) = (present(&field.bit_offset), present(&field.bit_width))
        {
            Some(BitSpec::OffsetWidth { offset, width })
        } else if let Some(range) = present(&field.bit_range) {
            Some(BitSpec::Range(range))
        } else if let (Some(lsb), Some(msb)) = (present(&field.lsb), present(&field.msb)) {
            Some(BitSpec::LsbMsb { lsb, msb })
        } else {
            None
        }
    }

    pub fn normalize(&self) -> Result<BitPosition, BitSpecError> {
        let position = match *self {
            BitSpec::OffsetWidth { offset, width } => BitPosition::new(
                parse_int("bitOffset", offset)?,
                parse_int("bitWidth", width)?,
            ),
            BitSpec::Range(range) => parse_range(range)?,
            BitSpec::LsbMsb { .. } => return Err(BitSpecError::LsbMsbUnsupported),
        };
        if position.num_bits == 0 {
            return Err(BitSpecError::ZeroWidth);
        }
        Ok(position)
    }
}

/// Reduce a field's bit position to canonical offset/width form.
pub fn normalize(field: &Field) -> Result<BitPosition, BitSpecError> {
    BitSpec::of(field).ok_or(BitSpecError::Missing)?.normalize()
}

fn parse_int(element: &'static str, value: &str) -> Result<u32, BitSpecError> {
    value
        .trim()
        .parse()
        .map_err(|_| BitSpecError::InvalidInteger {
            element,
            value: value.to_string(),
        })
}

/// `[hi:lo]` → offset `lo`, width `hi - lo + 1`.
fn parse_range(range: &str) -> Result<BitPosition, BitSpecError> {
    let invalid = || BitSpecError::InvalidRange(range.to_string());
    let (hi, lo) = range
        .trim()
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .and_then(|r| r.split_once(':'))
        .ok_or_else(invalid)?;
    let hi = parse_int("bitRange", hi)?;
    let lo = parse_int("bitRange", lo)?;
    let width = hi
        .checked_sub(lo)
        .and_then(|w| w.checked_add(1))
        .ok_or_else(invalid)?;
    Ok(BitPosition::new(lo, width))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Field {
        Field {
            name: "F".to_string(),
            ..Default::default()
        }
    }

    fn offset_width(offset: &str, width: &str) -> Field {
        Field {
            bit_offset: Some(offset.to_string()),
            bit_width: Some(width.to_string()),
            ..field()
        }
    }

    fn range(range: &str) -> Field {
        Field {
            bit_range: Some(range.to_string()),
            ..field()
        }
    }

    #[test]
    fn test_equivalent_encodings_agree() {
        let expected = BitPosition::new(16, 4);
        assert_eq!(normalize(&offset_width("16", "4")), Ok(expected));
        assert_eq!(normalize(&range("[19:16]")), Ok(expected));
    }

    #[test]
    fn test_single_bit_range() {
        assert_eq!(normalize(&range("[7:7]")), Ok(BitPosition::new(7, 1)));
        assert_eq!(normalize(&range(" [31:0] ")), Ok(BitPosition::new(0, 32)));
    }

    #[test]
    fn test_offset_width_takes_precedence() {
        let f = Field {
            bit_range: Some("[3:0]".to_string()),
            ..offset_width("8", "2")
        };
        assert_eq!(normalize(&f), Ok(BitPosition::new(8, 2)));
    }

    #[test]
    fn test_lsb_msb_rejected() {
        let f = Field {
            lsb: Some("0".to_string()),
            msb: Some("3".to_string()),
            ..field()
        };
        assert_eq!(
            BitSpec::of(&f),
            Some(BitSpec::LsbMsb { lsb: "0", msb: "3" })
        );
        assert_eq!(normalize(&f), Err(BitSpecError::LsbMsbUnsupported));
    }

    #[test]
    fn test_malformed_encodings() {
        assert_eq!(
            normalize(&offset_width("0x10", "4")),
            Err(BitSpecError::InvalidInteger {
                element: "bitOffset",
                value: "0x10".to_string()
            })
        );
        assert_eq!(
            normalize(&range("[a:0]")),
            Err(BitSpecError::InvalidInteger {
                element: "bitRange",
                value: "a".to_string()
            })
        );
        assert_eq!(
            normalize(&range("19:16")),
            Err(BitSpecError::InvalidRange("19:16".to_string()))
        );
        assert_eq!(
            normalize(&range("[3:5]")),
            Err(BitSpecError::InvalidRange("[3:5]".to_string()))
        );
        assert_eq!(normalize(&offset_width("3", "0")), Err(BitSpecError::ZeroWidth));
    }

    #[test]
    fn test_range_width_overflow() {
        assert_eq!(
            normalize(&range("[4294967295:0]")),
            Err(BitSpecError::InvalidRange("[4294967295:0]".to_string()))
        );
        assert_eq!(
            normalize(&range("[4294967295:1]")),
            Ok(BitPosition::new(1, u32::MAX))
        );
    }

    #[test]
    fn test_missing_encoding() {
        assert_eq!(normalize(&field()), Err(BitSpecError::Missing));
        // An offset without a width is not a complete encoding.
        let f = Field {
            bit_offset: Some("4".to_string()),
            ..field()
        };
        assert_eq!(normalize(&f), Err(BitSpecError::Missing));
    }

    #[test]
    fn test_masks() {
        let bit = BitPosition::new(5, 1);
        assert_eq!(bit.mask(), 1);
        assert_eq!(bit.shifted_mask(), 0x20);

        let nibble = BitPosition::new(8, 4);
        assert_eq!(nibble.mask(), 0xF);
        assert_eq!(nibble.shifted_mask(), 0xF00);
        assert_eq!(nibble.end(), 12);

        assert_eq!(BitPosition::new(0, 32).shifted_mask(), 0xFFFF_FFFF);
    }
}
