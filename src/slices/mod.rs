// SPDX-FileCopyrightText: The icdutil authors
// SPDX-License-Identifier: MPL-2.0

//! Bit slices
//!
//! A [`Slice`] selects the contiguous bits `left` down to `right` of a
//! register or bus, written as `[7:0]` or `[3]` for a single bit.

use std::{fmt, ops::RangeInclusive, str::FromStr, sync::LazyLock};

use derive_more::{Display, Error};
use regex::Regex;

use crate::num::{self, ParseNumError};

/// Number of addressable bits.
pub const MAX_BITS: u32 = u128::BITS;

/// A slice error
#[derive(Debug, Display, Error)]
pub enum SliceError {
    /// The left index is below the right index.
    #[display("left index {left} is below right index {right}")]
    Reversed {
        /// The left index
        left: u32,
        /// The right index
        right: u32,
    },

    /// The slice exceeds [`MAX_BITS`].
    #[display("bit {left} is out of range")]
    OutOfRange {
        /// The left index
        left: u32,
    },

    /// A slice must cover at least one bit.
    #[display("zero width")]
    ZeroWidth,

    /// The bits of a mask are not contiguous.
    #[display("mask 0x{mask:X} is not contiguous")]
    NonContiguous {
        /// The offending mask
        mask: u128,
    },

    /// Syntax error.
    #[display("{_0}")]
    Syntax(#[error(not(source))] anyhow::Error),
}

impl From<anyhow::Error> for SliceError {
    fn from(from: anyhow::Error) -> Self {
        Self::Syntax(from)
    }
}

impl From<ParseNumError> for SliceError {
    fn from(from: ParseNumError) -> Self {
        anyhow::Error::from(from).into()
    }
}

/// Contiguous bits from `left` down to `right`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slice {
    left: u32,
    right: u32,
}

impl Slice {
    /// Create a slice from its boundaries.
    ///
    /// # Errors
    ///
    /// Returns a [`SliceError`] if `left` is below `right` or exceeds [`MAX_BITS`].
    pub const fn new(left: u32, right: u32) -> Result<Self, SliceError> {
        if left < right {
            return Err(SliceError::Reversed { left, right });
        }
        if left >= MAX_BITS {
            return Err(SliceError::OutOfRange { left });
        }
        Ok(Self { left, right })
    }

    /// Create a slice covering a single bit.
    ///
    /// # Errors
    ///
    /// Returns a [`SliceError`] if `index` exceeds [`MAX_BITS`].
    pub const fn bit(index: u32) -> Result<Self, SliceError> {
        Self::new(index, index)
    }

    /// Create a slice of `width` bits starting at `right`.
    ///
    /// # Errors
    ///
    /// Returns a [`SliceError`] if `width` is zero or the slice exceeds [`MAX_BITS`].
    pub fn from_width(width: u32, right: u32) -> Result<Self, SliceError> {
        if width == 0 {
            return Err(SliceError::ZeroWidth);
        }
        let left = right
            .checked_add(width - 1)
            .ok_or(SliceError::OutOfRange { left: u32::MAX })?;
        Self::new(left, right)
    }

    /// Create the slice covering exactly the bits set in `mask`.
    ///
    /// # Errors
    ///
    /// Returns a [`SliceError`] if `mask` is zero or not contiguous.
    pub fn from_mask(mask: u128) -> Result<Self, SliceError> {
        let (Some(right), Some(left)) = (
            num::calc_lowest_bit_set(mask),
            num::calc_highest_bit_set(mask),
        ) else {
            return Err(SliceError::ZeroWidth);
        };
        let slice = Self { left, right };
        if slice.mask() != mask {
            return Err(SliceError::NonContiguous { mask });
        }
        Ok(slice)
    }

    /// The most significant bit.
    #[must_use]
    pub const fn left(&self) -> u32 {
        self.left
    }

    /// The least significant bit.
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.right
    }

    /// Number of bits.
    #[must_use]
    pub const fn width(&self) -> u32 {
        debug_assert!(self.left >= self.right);
        self.left - self.right + 1
    }

    /// Check for a single-bit slice.
    #[must_use]
    pub const fn is_bit(&self) -> bool {
        self.left == self.right
    }

    /// Mask with all bits of the slice set.
    #[must_use]
    pub const fn mask(&self) -> u128 {
        num::mask(self.width()) << self.right
    }

    /// Iterate over all bit indices in ascending order.
    #[must_use]
    pub fn bits(&self) -> RangeInclusive<u32> {
        self.right..=self.left
    }

    /// Check if bit `index` lies within the slice.
    #[must_use]
    pub const fn contains(&self, index: u32) -> bool {
        self.right <= index && index <= self.left
    }

    /// Check if both slices share at least one bit.
    #[must_use]
    pub const fn is_overlapping(&self, other: &Self) -> bool {
        self.right <= other.left && other.right <= self.left
    }

    /// Return the bits shared by both slices.
    #[must_use]
    pub fn get_intersect(&self, other: &Self) -> Option<Self> {
        let left = self.left.min(other.left);
        let right = self.right.max(other.right);
        (left >= right).then_some(Self { left, right })
    }

    /// Extract the slice bits of `value`, shifted down to bit 0.
    #[must_use]
    pub const fn extract(&self, value: u128) -> u128 {
        (value & self.mask()) >> self.right
    }

    /// Replace the slice bits of `target` by the lowest bits of `value`.
    ///
    /// Excess bits of `value` are discarded.
    #[must_use]
    pub const fn insert(&self, target: u128, value: u128) -> u128 {
        let mask = self.mask();
        (target & !mask) | ((value << self.right) & mask)
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { left, right } = self;
        if self.is_bit() {
            write!(f, "[{left}]")
        } else {
            write!(f, "[{left}:{right}]")
        }
    }
}

const SLICE_REGEX_STR: &str = r"^\[?\s*(?<left>[0-9a-zA-Z_]+)\s*(?::\s*(?<right>[0-9a-zA-Z_]+)\s*)?\]?$";

static SLICE_REGEX: LazyLock<Regex> = LazyLock::new(|| SLICE_REGEX_STR.parse().unwrap());

fn parse_index(index: &str) -> Result<u32, SliceError> {
    let value = num::parse_int(index)?;
    u32::try_from(value).map_err(|_| anyhow::anyhow!("bit index {value} out of range").into())
}

impl FromStr for Slice {
    type Err = SliceError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let Some(captures) = SLICE_REGEX.captures(trimmed) else {
            return Err(anyhow::anyhow!("invalid slice '{trimmed}'").into());
        };
        // Brackets must be balanced
        if trimmed.starts_with('[') != trimmed.ends_with(']') {
            return Err(anyhow::anyhow!("unbalanced brackets in slice '{trimmed}'").into());
        }
        let left = parse_index(&captures["left"])?;
        let right = captures
            .name("right")
            .map_or(Ok(left), |right| parse_index(right.as_str()))?;
        Self::new(left, right)
    }
}

/// Split a mask into its contiguous runs of set bits.
///
/// The most significant slice comes first. A zero mask yields no slices.
#[must_use]
pub fn mask_to_slices(mask: u128) -> Vec<Slice> {
    let mut slices = Vec::new();
    let mut remaining = mask;
    while let Some(left) = num::calc_highest_bit_set(remaining) {
        // Number of consecutive ones from `left` downwards
        let run = (remaining << (MAX_BITS - 1 - left)).leading_ones();
        let right = left + 1 - run;
        let slice = Slice { left, right };
        remaining &= !slice.mask();
        slices.push(slice);
    }
    slices
}

/// Combine the masks of all slices.
#[must_use]
pub fn slices_to_mask(slices: &[Slice]) -> u128 {
    slices.iter().fold(0, |mask, slice| mask | slice.mask())
}

/// Format slices as comma-separated list, e.g. `[11:8], [3:0]`.
#[must_use]
pub fn format_slices(slices: &[Slice]) -> String {
    itertools::join(slices, ", ")
}
