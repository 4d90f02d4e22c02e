// SPDX-FileCopyrightText: The icdutil authors
// SPDX-License-Identifier: MPL-2.0

//! Serde support
//!
//! Scalar types are (de)serialized from their display representation.
//! Address ranges are (de)serialized as structs and validated on the way in.

use std::{fmt, marker::PhantomData, str::FromStr};

use ::serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{AddrRange, Bytes, Hex, Slice};

struct FromStrVisitor<T>(PhantomData<T>);

impl<T> de::Visitor<'_> for FromStrVisitor<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string")
    }

    fn visit_str<E>(self, input: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        input.parse().map_err(E::custom)
    }
}

macro_rules! impl_serde_via_str {
    ($type:ty) => {
        impl Serialize for $type {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $type {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_str(FromStrVisitor(PhantomData))
            }
        }
    };
}

impl_serde_via_str!(Hex);
impl_serde_via_str!(Bytes);
impl_serde_via_str!(Slice);

#[derive(Serialize, Deserialize)]
#[serde(rename = "AddrRange")]
struct AddrRangeRepr {
    baseaddr: u64,
    size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    addrwidth: Option<u32>,
}

impl Serialize for AddrRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        AddrRangeRepr {
            baseaddr: self.baseaddr(),
            size: self.size(),
            addrwidth: self.addrwidth(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AddrRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let AddrRangeRepr {
            baseaddr,
            size,
            addrwidth,
        } = AddrRangeRepr::deserialize(deserializer)?;
        let mut addrrange = Self::new(baseaddr, size).map_err(de::Error::custom)?;
        addrrange
            .set_addrwidth(addrwidth)
            .map_err(de::Error::custom)?;
        Ok(addrrange)
    }
}
