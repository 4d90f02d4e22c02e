// SPDX-FileCopyrightText: The icdutil authors
// SPDX-License-Identifier: MPL-2.0

//! Documentation and examples

#![doc = include_str!("../README.md")]
