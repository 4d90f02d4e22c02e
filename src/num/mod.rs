// SPDX-FileCopyrightText: The icdutil authors
// SPDX-License-Identifier: MPL-2.0

//! Numeric tools
//!
//! Bit widths, powers, alignment and the two display types used all over
//! the crate: [`Hex`] for addresses and [`Bytes`] for sizes.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
    sync::LazyLock,
};

use derive_more::{Display, Error};
use regex::Regex;

/// Number of bytes in a kibibyte.
pub const KIB: u64 = 1 << 10;

/// Number of bytes in a mebibyte.
pub const MIB: u64 = 1 << 20;

/// Number of bytes in a gibibyte.
pub const GIB: u64 = 1 << 30;

/// Number of bytes in a tebibyte.
pub const TIB: u64 = 1 << 40;

/// A numeric parsing error
#[derive(Debug, Display, Error)]
pub enum ParseNumError {
    /// The value does not fit into the target type.
    #[display("value out of range")]
    Overflow,

    /// Syntax error.
    #[display("{_0}")]
    Syntax(#[error(not(source))] anyhow::Error),
}

impl From<anyhow::Error> for ParseNumError {
    fn from(from: anyhow::Error) -> Self {
        Self::Syntax(from)
    }
}

/// Parse an integer literal.
///
/// Accepts decimal digits or a `0x`, `0o` or `0b` prefix (case-insensitive),
/// with optional `_` separators and surrounding whitespace.
///
/// # Errors
///
/// Returns a [`ParseNumError`] if the input is not an integer literal or
/// does not fit into `u128`.
pub fn parse_int(input: &str) -> Result<u128, ParseNumError> {
    let trimmed = input.trim();
    let (radix, digits) = split_radix_prefix(trimmed);
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    if digits.is_empty() {
        return Err(anyhow::anyhow!("missing digits in '{trimmed}'").into());
    }
    // from_str_radix() would also accept a leading sign
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(anyhow::anyhow!("invalid digit in '{trimmed}'").into());
    }
    u128::from_str_radix(&digits, radix).map_err(|_| ParseNumError::Overflow)
}

fn split_radix_prefix(literal: &str) -> (u32, &str) {
    let Some(prefix) = literal.get(..2) else {
        return (10, literal);
    };
    let radix = match prefix {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return (10, literal),
    };
    (radix, &literal[2..])
}

/// Number of bits required to represent `value` as unsigned integer.
///
/// Zero still occupies one bit.
#[must_use]
pub const fn calc_unsigned_width(value: u128) -> u32 {
    let width = u128::BITS - value.leading_zeros();
    if width == 0 { 1 } else { width }
}

/// Number of bits required to represent `value` in two's complement.
#[must_use]
pub const fn calc_signed_width(value: i128) -> u32 {
    let magnitude = if value < 0 { !value } else { value };
    u128::BITS - magnitude.unsigned_abs().leading_zeros() + 1
}

/// Index of the lowest bit set, `None` for zero.
#[must_use]
pub const fn calc_lowest_bit_set(value: u128) -> Option<u32> {
    if value == 0 {
        None
    } else {
        Some(value.trailing_zeros())
    }
}

/// Index of the highest bit set, `None` for zero.
#[must_use]
pub const fn calc_highest_bit_set(value: u128) -> Option<u32> {
    value.checked_ilog2()
}

/// Check if `value` is a power of two.
#[must_use]
pub const fn is_power_of2(value: u128) -> bool {
    value.is_power_of_two()
}

/// Check if `value` is a power of `base`.
///
/// A `base` below 2 has no powers.
#[must_use]
pub const fn is_power_of(value: u128, base: u128) -> bool {
    if base < 2 || value == 0 {
        return false;
    }
    let mut remainder = value;
    while remainder % base == 0 {
        remainder /= base;
    }
    remainder == 1
}

/// Smallest power of two greater than or equal to `value`.
///
/// Returns `None` on overflow.
#[must_use]
pub const fn calc_next_power_of2(value: u128) -> Option<u128> {
    value.checked_next_power_of_two()
}

/// Smallest power of `base` greater than or equal to `value`.
///
/// Returns `None` on overflow or if `base` is below 2.
#[must_use]
pub fn calc_next_power_of(value: u128, base: u128) -> Option<u128> {
    if base < 2 {
        return None;
    }
    let mut power = 1u128;
    while power < value {
        power = power.checked_mul(base)?;
    }
    Some(power)
}

/// Mask with the lowest `width` bits set.
#[must_use]
pub const fn mask(width: u32) -> u128 {
    if width >= u128::BITS {
        u128::MAX
    } else {
        (1 << width) - 1
    }
}

/// Round `value` up to the next multiple of `align`.
///
/// Returns `None` if `align` is zero or on overflow.
#[must_use]
pub const fn align_up(value: u64, align: u64) -> Option<u64> {
    if align == 0 {
        return None;
    }
    match value % align {
        0 => Some(value),
        rem => value.checked_add(align - rem),
    }
}

/// Round `value` down to the previous multiple of `align`.
///
/// Returns `None` if `align` is zero.
#[must_use]
pub const fn align_down(value: u64, align: u64) -> Option<u64> {
    if align == 0 {
        return None;
    }
    Some(value - value % align)
}

/// Check if `value` is a multiple of `align`.
#[must_use]
pub const fn is_aligned(value: u64, align: u64) -> bool {
    align != 0 && value % align == 0
}

/// An integer displayed in hexadecimal
///
/// The optional `width` is given in bits and only affects formatting.
/// Comparison and hashing consider the value exclusively.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hex {
    value: u128,
    width: Option<u32>,
}

impl Hex {
    /// Create a value without a fixed width.
    #[must_use]
    pub const fn new(value: u128) -> Self {
        Self { value, width: None }
    }

    /// Create a value that is zero-padded to `width` bits.
    #[must_use]
    pub const fn with_width(value: u128, width: u32) -> Self {
        Self {
            value,
            width: Some(width),
        }
    }

    /// The value.
    #[must_use]
    pub const fn value(&self) -> u128 {
        self.value
    }

    /// The width in bits, if any.
    #[must_use]
    pub const fn width(&self) -> Option<u32> {
        self.width
    }
}

impl PartialEq for Hex {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Hex {}

impl PartialOrd for Hex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Hex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl Hash for Hex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl From<u64> for Hex {
    fn from(from: u64) -> Self {
        Self::new(from.into())
    }
}

impl From<u128> for Hex {
    fn from(from: u128) -> Self {
        Self::new(from)
    }
}

impl From<Hex> for u128 {
    fn from(from: Hex) -> Self {
        from.value
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { value, width } = *self;
        if let Some(width) = width {
            let digits = width.div_ceil(4) as usize;
            write!(f, "0x{value:0digits$X}")
        } else {
            write!(f, "0x{value:X}")
        }
    }
}

impl FromStr for Hex {
    type Err = ParseNumError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_int(input).map(Self::new)
    }
}

/// A size in bytes with human-readable formatting
///
/// Sizes are displayed in the largest binary unit that divides them
/// exactly, e.g. `4 KB` or `256 bytes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bytes(u64);

const UNITS: [(&str, u64); 4] = [("TB", TIB), ("GB", GIB), ("MB", MIB), ("KB", KIB)];

impl Bytes {
    /// Create a size from a number of bytes.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Create a size from a number of kibibytes.
    ///
    /// # Panics
    ///
    /// Panics if the number of bytes overflows.
    #[must_use]
    pub const fn kib(value: u64) -> Self {
        match value.checked_mul(KIB) {
            Some(value) => Self(value),
            None => panic!("size overflow"),
        }
    }

    /// Create a size from a number of mebibytes.
    ///
    /// # Panics
    ///
    /// Panics if the number of bytes overflows.
    #[must_use]
    pub const fn mib(value: u64) -> Self {
        match value.checked_mul(MIB) {
            Some(value) => Self(value),
            None => panic!("size overflow"),
        }
    }

    /// Create a size from a number of gibibytes.
    ///
    /// # Panics
    ///
    /// Panics if the number of bytes overflows.
    #[must_use]
    pub const fn gib(value: u64) -> Self {
        match value.checked_mul(GIB) {
            Some(value) => Self(value),
            None => panic!("size overflow"),
        }
    }

    /// The number of bytes.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for Bytes {
    fn from(from: u64) -> Self {
        Self(from)
    }
}

impl From<Bytes> for u64 {
    fn from(from: Bytes) -> Self {
        from.0
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        for (unit, factor) in UNITS {
            if value >= factor && value % factor == 0 {
                return write!(f, "{count} {unit}", count = value / factor);
            }
        }
        if value == 1 {
            f.write_str("1 byte")
        } else {
            write!(f, "{value} bytes")
        }
    }
}

// The binary alternative requires at least one digit, so that `0b`
// still reads as zero bytes. Units are matched from a fixed list, so a
// hex literal gives back its trailing `b` when followed by `ytes`/`yte`.
// A bare `b` directly after hex digits stays a digit.
const BYTES_REGEX_STR: &str = concat!(
    r"^(?<num>0[xX][0-9a-fA-F_]+|0[oO][0-7_]+|0[bB][01_]+|[0-9][0-9_]*)",
    r"\s*(?<unit>(?i:bytes?|[kmgt]i?b|[kmgtb]))?$"
);

static BYTES_REGEX: LazyLock<Regex> = LazyLock::new(|| BYTES_REGEX_STR.parse().unwrap());

fn unit_factor(unit: &str) -> u64 {
    match unit.to_ascii_lowercase().chars().next() {
        Some('k') => KIB,
        Some('m') => MIB,
        Some('g') => GIB,
        Some('t') => TIB,
        _ => 1,
    }
}

impl FromStr for Bytes {
    type Err = ParseNumError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let Some(captures) = BYTES_REGEX.captures(trimmed) else {
            return Err(anyhow::anyhow!("invalid size '{trimmed}'").into());
        };
        let factor = captures
            .name("unit")
            .map_or(1, |unit| unit_factor(unit.as_str()));
        let count = parse_int(&captures["num"])?;
        count
            .checked_mul(factor.into())
            .and_then(|value| u64::try_from(value).ok())
            .map(Self)
            .ok_or(ParseNumError::Overflow)
    }
}

#[cfg(test)]
mod tests;
