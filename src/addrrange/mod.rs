// SPDX-FileCopyrightText: The icdutil authors
// SPDX-License-Identifier: MPL-2.0

//! Address ranges

use std::{fmt, ops::RangeInclusive, str::FromStr, sync::LazyLock};

use derive_more::{Display, Error};
use regex::Regex;

use crate::num::{self, Bytes, Hex, ParseNumError};

/// Widest supported address width in bits.
pub const MAX_ADDRWIDTH: u32 = u64::BITS;

/// An address range error
#[derive(Debug, Display, Error)]
pub enum AddrRangeError {
    /// An address range must contain at least one address.
    #[display("size must not be zero")]
    ZeroSize,

    /// The end address is below the base address.
    #[display("end address 0x{endaddr:X} is below base address 0x{baseaddr:X}")]
    Reversed {
        /// The base address
        baseaddr: u64,
        /// The end address
        endaddr: u64,
    },

    /// The range does not fit into the 64-bit address space.
    #[display("range at 0x{baseaddr:X} with size 0x{size:X} exceeds the address space")]
    Overflow {
        /// The base address
        baseaddr: u64,
        /// The requested size
        size: u128,
    },

    /// The address width is zero or too wide.
    #[display("invalid address width {addrwidth}")]
    InvalidAddrWidth {
        /// The address width
        addrwidth: u32,
    },

    /// The end address is not representable with the address width.
    #[display("end address 0x{endaddr:X} exceeds address width {addrwidth}")]
    ExceedsAddrWidth {
        /// The end address
        endaddr: u64,
        /// The address width
        addrwidth: u32,
    },

    /// An explicitly given size disagrees with the boundaries.
    #[display("size {actual} does not match the stated size {expected}")]
    SizeMismatch {
        /// The stated size
        expected: Bytes,
        /// The size derived from the boundaries
        actual: Bytes,
    },

    /// Syntax error.
    #[display("{_0}")]
    Syntax(#[error(not(source))] anyhow::Error),
}

impl From<anyhow::Error> for AddrRangeError {
    fn from(from: anyhow::Error) -> Self {
        Self::Syntax(from)
    }
}

impl From<ParseNumError> for AddrRangeError {
    fn from(from: ParseNumError) -> Self {
        anyhow::Error::from(from).into()
    }
}

/// Check if all addresses up to `endaddr` are representable with `addrwidth` bits.
///
/// # Errors
///
/// Returns an [`AddrRangeError`] if `addrwidth` is invalid or too narrow.
pub const fn check_addrwidth(endaddr: u64, addrwidth: u32) -> Result<(), AddrRangeError> {
    if addrwidth == 0 || addrwidth > MAX_ADDRWIDTH {
        return Err(AddrRangeError::InvalidAddrWidth { addrwidth });
    }
    if addrwidth < MAX_ADDRWIDTH && endaddr >> addrwidth != 0 {
        return Err(AddrRangeError::ExceedsAddrWidth { endaddr, addrwidth });
    }
    Ok(())
}

/// Address range starting at `baseaddr` with `size` in bytes
///
/// The optional address width only affects how addresses are displayed,
/// but it is part of the identity: ranges with different address widths
/// are not equal.
///
/// Ranges are never empty and never wrap around the end of the
/// 64-bit address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddrRange {
    baseaddr: u64,
    size: u64,
    addrwidth: Option<u32>,
}

impl AddrRange {
    /// Create a range without an address width.
    ///
    /// # Errors
    ///
    /// Returns an [`AddrRangeError`] if the range is empty or exceeds the address space.
    pub fn new(baseaddr: u64, size: u64) -> Result<Self, AddrRangeError> {
        Self::validated(baseaddr, size, None)
    }

    /// Create a range whose addresses are displayed with `addrwidth` bits.
    ///
    /// # Errors
    ///
    /// Returns an [`AddrRangeError`] if the range is empty, exceeds the address space
    /// or does not fit into `addrwidth` bits.
    pub fn with_addrwidth(
        baseaddr: u64,
        size: u64,
        addrwidth: u32,
    ) -> Result<Self, AddrRangeError> {
        Self::validated(baseaddr, size, Some(addrwidth))
    }

    /// Create a range from its first and last address.
    ///
    /// # Errors
    ///
    /// Returns an [`AddrRangeError`] if `endaddr` is below `baseaddr`, the range
    /// spans the whole 64-bit address space, or does not fit into `addrwidth` bits.
    pub fn from_endaddr(
        baseaddr: u64,
        endaddr: u64,
        addrwidth: Option<u32>,
    ) -> Result<Self, AddrRangeError> {
        if endaddr < baseaddr {
            return Err(AddrRangeError::Reversed { baseaddr, endaddr });
        }
        let Some(size) = (endaddr - baseaddr).checked_add(1) else {
            return Err(AddrRangeError::Overflow {
                baseaddr,
                size: u128::from(u64::MAX) + 1,
            });
        };
        Self::validated(baseaddr, size, addrwidth)
    }

    fn validated(baseaddr: u64, size: u64, addrwidth: Option<u32>) -> Result<Self, AddrRangeError> {
        if size == 0 {
            return Err(AddrRangeError::ZeroSize);
        }
        let Some(endaddr) = baseaddr.checked_add(size - 1) else {
            return Err(AddrRangeError::Overflow {
                baseaddr,
                size: size.into(),
            });
        };
        if let Some(addrwidth) = addrwidth {
            check_addrwidth(endaddr, addrwidth)?;
        }
        Ok(Self {
            baseaddr,
            size,
            addrwidth,
        })
    }

    /// Replace the address width.
    ///
    /// # Errors
    ///
    /// Returns an [`AddrRangeError`] if the range does not fit into `addrwidth` bits.
    /// The range remains unchanged in this case.
    pub fn set_addrwidth(&mut self, addrwidth: Option<u32>) -> Result<(), AddrRangeError> {
        if let Some(addrwidth) = addrwidth {
            check_addrwidth(self.endaddr(), addrwidth)?;
        }
        self.addrwidth = addrwidth;
        Ok(())
    }

    /// First address.
    #[must_use]
    pub const fn baseaddr(&self) -> u64 {
        self.baseaddr
    }

    /// Last address.
    #[must_use]
    pub const fn endaddr(&self) -> u64 {
        self.baseaddr + (self.size - 1)
    }

    /// First address after the range.
    ///
    /// Returns `None` if the range ends at the top of the address space.
    #[must_use]
    pub const fn nextaddr(&self) -> Option<u64> {
        self.endaddr().checked_add(1)
    }

    /// Number of addresses.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Number of addresses for display.
    #[must_use]
    pub const fn bytes(&self) -> Bytes {
        Bytes::new(self.size)
    }

    /// The address width.
    #[must_use]
    pub const fn addrwidth(&self) -> Option<u32> {
        self.addrwidth
    }

    /// Format an address with the address width of this range.
    #[must_use]
    pub fn hex(&self, addr: u64) -> Hex {
        match self.addrwidth {
            Some(addrwidth) => Hex::with_width(addr.into(), addrwidth),
            None => Hex::new(addr.into()),
        }
    }

    /// Check whether `addr` lies within the range.
    #[must_use]
    pub const fn contains(&self, addr: u64) -> bool {
        self.baseaddr <= addr && addr <= self.endaddr()
    }

    /// Check whether `other` lies completely within the range.
    #[must_use]
    pub const fn contains_range(&self, other: &Self) -> bool {
        self.baseaddr <= other.baseaddr && other.endaddr() <= self.endaddr()
    }

    /// Offset of `addr` relative to the base address.
    ///
    /// Returns `None` if `addr` lies outside of the range.
    #[must_use]
    pub const fn offset_of(&self, addr: u64) -> Option<u64> {
        if self.contains(addr) {
            Some(addr - self.baseaddr)
        } else {
            None
        }
    }

    /// Iterate over all addresses in ascending order.
    #[must_use]
    pub fn iter(&self) -> RangeInclusive<u64> {
        self.baseaddr..=self.endaddr()
    }

    /// Check if `other` shares at least one address.
    #[must_use]
    pub const fn is_overlapping(&self, other: &Self) -> bool {
        if self.baseaddr < other.baseaddr {
            // other is to the right of self
            self.endaddr() >= other.baseaddr
        } else {
            // other is to the left of self
            self.baseaddr <= other.endaddr()
        }
    }

    /// Return the addresses shared with `other`.
    ///
    /// The intersection keeps the address width of `self`.
    #[must_use]
    pub fn get_intersect(&self, other: &Self) -> Option<Self> {
        let baseaddr = self.baseaddr.max(other.baseaddr);
        let endaddr = self.endaddr().min(other.endaddr());
        (baseaddr <= endaddr).then(|| Self {
            baseaddr,
            size: endaddr - baseaddr + 1,
            addrwidth: self.addrwidth,
        })
    }
}

impl IntoIterator for &AddrRange {
    type Item = u64;
    type IntoIter = RangeInclusive<u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for AddrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{baseaddr}-{endaddr}({size})",
            baseaddr = self.hex(self.baseaddr),
            endaddr = self.hex(self.endaddr()),
            size = self.bytes(),
        )
    }
}

// Either `<base>-<end>` with an optional `(<size>)` or `<base>+<size>`
const ADDRRANGE_REGEX_STR: &str = r"^(?<base>\w+)\s*(?:-\s*(?<end>\w+)\s*(?:\(\s*(?<size>[^()]+?)\s*\))?|\+\s*(?<plus>[^()]+?))$";

static ADDRRANGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| ADDRRANGE_REGEX_STR.parse().unwrap());

fn parse_addr(addr: &str) -> Result<u64, AddrRangeError> {
    let value = num::parse_int(addr)?;
    u64::try_from(value)
        .map_err(|_| anyhow::anyhow!("address '{addr}' exceeds the address space").into())
}

impl FromStr for AddrRange {
    type Err = AddrRangeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let Some(captures) = ADDRRANGE_REGEX.captures(trimmed) else {
            return Err(anyhow::anyhow!("invalid address range '{trimmed}'").into());
        };
        let baseaddr = parse_addr(&captures["base"])?;
        if let Some(plus) = captures.name("plus") {
            let size: Bytes = plus.as_str().parse()?;
            return Self::new(baseaddr, size.value());
        }
        let endaddr = parse_addr(&captures["end"])?;
        let range = Self::from_endaddr(baseaddr, endaddr, None)?;
        if let Some(size) = captures.name("size") {
            let expected: Bytes = size.as_str().parse()?;
            if expected != range.bytes() {
                return Err(AddrRangeError::SizeMismatch {
                    expected,
                    actual: range.bytes(),
                });
            }
        }
        Ok(range)
    }
}
