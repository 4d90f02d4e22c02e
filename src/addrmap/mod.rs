// SPDX-FileCopyrightText: The icdutil authors
// SPDX-License-Identifier: MPL-2.0

//! Address maps
//!
//! An [`AddrMap`] places items at non-overlapping address ranges and
//! resolves addresses back to the item that occupies them.

use std::{collections::BTreeMap, fmt};

use derive_more::{Display, Error};

use crate::{
    addrrange::{self, AddrRange, AddrRangeError},
    num,
};

/// An address map error
#[derive(Debug, Display, Error)]
pub enum AddrMapError {
    /// The range overlaps an existing entry.
    #[display("{addrrange} overlaps with {existing}")]
    Overlap {
        /// The rejected range
        addrrange: AddrRange,
        /// The range of the conflicting entry
        existing: AddrRange,
    },

    /// The range does not fit into the address width of the map.
    #[display("{addrrange} exceeds address width {addrwidth}")]
    ExceedsAddrWidth {
        /// The rejected range
        addrrange: AddrRange,
        /// The address width of the map
        addrwidth: u32,
    },

    /// No free range with the requested size and alignment is left.
    #[display("no free range of {size} bytes aligned to {align}")]
    NoSpace {
        /// The requested size
        size: u64,
        /// The requested alignment
        align: u64,
    },

    /// Alignments must not be zero.
    #[display("alignment must not be zero")]
    InvalidAlign,

    /// Invalid address range.
    #[display("invalid address range: {_0}")]
    Range(AddrRangeError),
}

impl From<AddrRangeError> for AddrMapError {
    fn from(from: AddrRangeError) -> Self {
        Self::Range(from)
    }
}

/// An item placed at an address range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrMapEntry<T> {
    addrrange: AddrRange,
    item: T,
}

impl<T> AddrMapEntry<T> {
    /// The occupied address range.
    #[must_use]
    pub const fn addrrange(&self) -> &AddrRange {
        &self.addrrange
    }

    /// The item.
    #[must_use]
    pub const fn item(&self) -> &T {
        &self.item
    }

    /// The item, mutable.
    #[must_use]
    pub fn item_mut(&mut self) -> &mut T {
        &mut self.item
    }

    /// Split into address range and item.
    #[must_use]
    pub fn into_parts(self) -> (AddrRange, T) {
        let Self { addrrange, item } = self;
        (addrrange, item)
    }
}

/// Either an entry or an unoccupied range between entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddrMapSlot<'a, T> {
    /// An occupied range
    Entry(&'a AddrMapEntry<T>),

    /// An unoccupied range
    Gap(AddrRange),
}

impl<T> AddrMapSlot<'_, T> {
    /// The address range of the slot.
    #[must_use]
    pub const fn addrrange(&self) -> &AddrRange {
        match self {
            Self::Entry(entry) => entry.addrrange(),
            Self::Gap(addrrange) => addrrange,
        }
    }

    /// Check for a gap.
    #[must_use]
    pub const fn is_gap(&self) -> bool {
        matches!(self, Self::Gap(_))
    }
}

/// Items at non-overlapping address ranges, ordered by address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrMap<T> {
    addrwidth: Option<u32>,
    // Keyed by base address
    entries: BTreeMap<u64, AddrMapEntry<T>>,
}

impl<T> Default for AddrMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AddrMap<T> {
    /// Create an empty map spanning the 64-bit address space.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            addrwidth: None,
            entries: BTreeMap::new(),
        }
    }

    /// Create an empty map restricted to `addrwidth` bits.
    ///
    /// # Errors
    ///
    /// Returns an [`AddrMapError`] if `addrwidth` is zero or exceeds 64 bits.
    pub fn with_addrwidth(addrwidth: u32) -> Result<Self, AddrMapError> {
        addrrange::check_addrwidth(0, addrwidth)?;
        Ok(Self {
            addrwidth: Some(addrwidth),
            entries: BTreeMap::new(),
        })
    }

    /// The address width.
    #[must_use]
    pub const fn addrwidth(&self) -> Option<u32> {
        self.addrwidth
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest address of the map.
    fn maxaddr(&self) -> u64 {
        self.addrwidth.map_or(u64::MAX, |addrwidth| {
            u64::try_from(num::mask(addrwidth)).unwrap_or(u64::MAX)
        })
    }

    /// Place `item` at `addrrange`.
    ///
    /// A range without an address width adopts the address width of the map.
    ///
    /// # Errors
    ///
    /// Returns an [`AddrMapError`] if the range overlaps an existing entry
    /// or exceeds the address width of the map.
    pub fn add(&mut self, mut addrrange: AddrRange, item: T) -> Result<(), AddrMapError> {
        if let Some(addrwidth) = self.addrwidth {
            if addrrange.endaddr() > self.maxaddr() {
                return Err(AddrMapError::ExceedsAddrWidth {
                    addrrange,
                    addrwidth,
                });
            }
            if addrrange.addrwidth().is_none() {
                addrrange.set_addrwidth(Some(addrwidth))?;
            }
        }
        if let Some(existing) = self.last_entry_below_or_at(addrrange.endaddr()) {
            if existing.addrrange.is_overlapping(&addrrange) {
                return Err(AddrMapError::Overlap {
                    addrrange,
                    existing: existing.addrrange,
                });
            }
        }
        self.entries
            .insert(addrrange.baseaddr(), AddrMapEntry { addrrange, item });
        Ok(())
    }

    // Entries never overlap, so the entry with the highest base address
    // not above `addr` is the only candidate that may contain `addr`.
    fn last_entry_below_or_at(&self, addr: u64) -> Option<&AddrMapEntry<T>> {
        self.entries
            .range(..=addr)
            .next_back()
            .map(|(_, entry)| entry)
    }

    /// Return the entry containing `addr`.
    #[must_use]
    pub fn get_entry(&self, addr: u64) -> Option<&AddrMapEntry<T>> {
        self.last_entry_below_or_at(addr)
            .filter(|entry| entry.addrrange.contains(addr))
    }

    /// Return the item at `addr`.
    #[must_use]
    pub fn get(&self, addr: u64) -> Option<&T> {
        self.get_entry(addr).map(AddrMapEntry::item)
    }

    /// Return the item at `addr`, mutable.
    #[must_use]
    pub fn get_mut(&mut self, addr: u64) -> Option<&mut T> {
        self.entries
            .range_mut(..=addr)
            .next_back()
            .map(|(_, entry)| entry)
            .filter(|entry| entry.addrrange.contains(addr))
            .map(AddrMapEntry::item_mut)
    }

    /// Remove the entry containing `addr`.
    pub fn remove(&mut self, addr: u64) -> Option<AddrMapEntry<T>> {
        let baseaddr = self.get_entry(addr)?.addrrange.baseaddr();
        self.entries.remove(&baseaddr)
    }

    /// Iterate over all entries overlapping `addrrange` in ascending order.
    pub fn get_overlapping<'a>(
        &'a self,
        addrrange: &AddrRange,
    ) -> impl Iterator<Item = &'a AddrMapEntry<T>> + use<'a, T> {
        // An entry starting below the range may still reach into it.
        let start = self
            .get_entry(addrrange.baseaddr())
            .map_or(addrrange.baseaddr(), |entry| entry.addrrange.baseaddr());
        self.entries
            .range(start..=addrrange.endaddr())
            .map(|(_, entry)| entry)
    }

    /// Iterate over all entries in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &AddrMapEntry<T>> + '_ {
        self.entries.values()
    }

    /// Iterate over all entries and the gaps between them in ascending order.
    ///
    /// A map with an address width covers its whole address space, including
    /// the gaps before the first and after the last entry. Otherwise the
    /// covered space starts at zero and ends with the last entry.
    pub fn iter_filled(&self) -> impl Iterator<Item = AddrMapSlot<'_, T>> {
        let mut slots = Vec::with_capacity(self.entries.len() * 2 + 1);
        let mut nextaddr = Some(0);
        for entry in self.entries.values() {
            let baseaddr = entry.addrrange.baseaddr();
            if let Some(gap) = nextaddr.and_then(|nextaddr| self.gap(nextaddr, baseaddr)) {
                slots.push(AddrMapSlot::Gap(gap));
            }
            slots.push(AddrMapSlot::Entry(entry));
            nextaddr = entry.addrrange.nextaddr();
        }
        if self.addrwidth.is_some() {
            // Nothing is left after an entry that ends at the top of the address space
            let trailing = nextaddr.and_then(|nextaddr| {
                AddrRange::from_endaddr(nextaddr, self.maxaddr(), self.addrwidth).ok()
            });
            if let Some(gap) = trailing {
                slots.push(AddrMapSlot::Gap(gap));
            }
        }
        slots.into_iter()
    }

    // The gap from `baseaddr` up to, but excluding, `nextaddr`
    fn gap(&self, baseaddr: u64, nextaddr: u64) -> Option<AddrRange> {
        if nextaddr <= baseaddr {
            return None;
        }
        AddrRange::from_endaddr(baseaddr, nextaddr - 1, self.addrwidth).ok()
    }

    /// The range from the lowest to the highest occupied address.
    #[must_use]
    pub fn addrrange(&self) -> Option<AddrRange> {
        let (_, first) = self.entries.first_key_value()?;
        let (_, last) = self.entries.last_key_value()?;
        AddrRange::from_endaddr(
            first.addrrange.baseaddr(),
            last.addrrange.endaddr(),
            self.addrwidth,
        )
        .ok()
    }

    /// Find the lowest free range of `size` bytes starting at a multiple of `align`.
    #[must_use]
    pub fn get_free(&self, size: u64, align: u64) -> Option<AddrRange> {
        if size == 0 || align == 0 {
            return None;
        }
        let mut baseaddr: u64 = 0;
        for entry in self.entries.values() {
            let endaddr = baseaddr.checked_add(size - 1)?;
            if endaddr < entry.addrrange.baseaddr() {
                break;
            }
            if entry.addrrange.endaddr() >= baseaddr {
                baseaddr = num::align_up(entry.addrrange.nextaddr()?, align)?;
            }
        }
        let endaddr = baseaddr.checked_add(size - 1)?;
        if endaddr > self.maxaddr() {
            return None;
        }
        AddrRange::from_endaddr(baseaddr, endaddr, self.addrwidth).ok()
    }

    /// Place `item` at the lowest free range of `size` bytes aligned to `align`.
    ///
    /// # Errors
    ///
    /// Returns an [`AddrMapError`] if `size` or `align` is zero or no such range is free.
    pub fn allocate(&mut self, size: u64, align: u64, item: T) -> Result<AddrRange, AddrMapError> {
        if align == 0 {
            return Err(AddrMapError::InvalidAlign);
        }
        if size == 0 {
            return Err(AddrRangeError::ZeroSize.into());
        }
        let addrrange = self
            .get_free(size, align)
            .ok_or(AddrMapError::NoSpace { size, align })?;
        self.add(addrrange, item)?;
        Ok(addrrange)
    }
}

impl<'a, T> IntoIterator for &'a AddrMap<T> {
    type Item = &'a AddrMapEntry<T>;
    type IntoIter = std::collections::btree_map::Values<'a, u64, AddrMapEntry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl<T> fmt::Display for AddrMap<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self.entries.values().map(|entry| {
            let AddrMapEntry { addrrange, item } = entry;
            format!("{addrrange}  {item}")
        });
        f.write_str(&itertools::join(lines, "\n"))
    }
}
