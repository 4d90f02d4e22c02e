// SPDX-FileCopyrightText: The icdutil authors
// SPDX-License-Identifier: MPL-2.0

#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![warn(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(test), deny(clippy::panic_in_result_fn))]
#![cfg_attr(not(debug_assertions), deny(clippy::used_underscore_binding))]

//! Utilities for describing hardware: address ranges, address maps,
//! bit slices and numeric tools.
//!
//! Refer to [`docs`] for an introduction.

pub mod docs;

pub mod addrmap;
pub mod addrrange;
pub mod num;
pub mod slices;

#[cfg(feature = "serde")]
mod serde;

pub use self::{
    addrmap::{AddrMap, AddrMapEntry, AddrMapError, AddrMapSlot},
    addrrange::{AddrRange, AddrRangeError},
    num::{Bytes, Hex, ParseNumError},
    slices::{Slice, SliceError},
};
