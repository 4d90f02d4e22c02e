// SPDX-FileCopyrightText: The icdutil authors
// SPDX-License-Identifier: MPL-2.0

use super::*;

#[test]
fn parse_int_accepts_prefixes_and_separators() {
    assert_eq!(42, parse_int("42").unwrap());
    assert_eq!(0x1F, parse_int("0x1F").unwrap());
    assert_eq!(0x1F, parse_int("0X1f").unwrap());
    assert_eq!(0o17, parse_int("0o17").unwrap());
    assert_eq!(0b1010, parse_int("0b1010").unwrap());
    assert_eq!(0xFFFF_0000, parse_int("0xFFFF_0000").unwrap());
    assert_eq!(1_000_000, parse_int(" 1_000_000\t").unwrap());
    assert_eq!(0, parse_int("0").unwrap());
}

#[test]
fn parse_int_rejects_garbage() {
    assert!(matches!(parse_int(""), Err(ParseNumError::Syntax(_))));
    assert!(matches!(parse_int("0x"), Err(ParseNumError::Syntax(_))));
    assert!(matches!(parse_int("_"), Err(ParseNumError::Syntax(_))));
    assert!(matches!(parse_int("+5"), Err(ParseNumError::Syntax(_))));
    assert!(matches!(parse_int("-5"), Err(ParseNumError::Syntax(_))));
    assert!(matches!(parse_int("0b102"), Err(ParseNumError::Syntax(_))));
    assert!(matches!(parse_int("12ab"), Err(ParseNumError::Syntax(_))));
    assert!(matches!(
        parse_int("0x1_0000_0000_0000_0000_0000_0000_0000_0000"),
        Err(ParseNumError::Overflow)
    ));
}

#[test]
fn unsigned_width() {
    assert_eq!(1, calc_unsigned_width(0));
    assert_eq!(1, calc_unsigned_width(1));
    assert_eq!(2, calc_unsigned_width(2));
    assert_eq!(2, calc_unsigned_width(3));
    assert_eq!(8, calc_unsigned_width(255));
    assert_eq!(9, calc_unsigned_width(256));
    assert_eq!(128, calc_unsigned_width(u128::MAX));
}

#[test]
fn signed_width() {
    assert_eq!(1, calc_signed_width(0));
    assert_eq!(2, calc_signed_width(1));
    assert_eq!(1, calc_signed_width(-1));
    assert_eq!(2, calc_signed_width(-2));
    assert_eq!(8, calc_signed_width(127));
    assert_eq!(8, calc_signed_width(-128));
    assert_eq!(9, calc_signed_width(128));
    assert_eq!(9, calc_signed_width(-129));
    assert_eq!(128, calc_signed_width(i128::MIN));
    assert_eq!(128, calc_signed_width(i128::MAX));
}

#[test]
fn lowest_and_highest_bit_set() {
    assert_eq!(None, calc_lowest_bit_set(0));
    assert_eq!(None, calc_highest_bit_set(0));
    assert_eq!(Some(0), calc_lowest_bit_set(1));
    assert_eq!(Some(0), calc_highest_bit_set(1));
    assert_eq!(Some(4), calc_lowest_bit_set(0xF0));
    assert_eq!(Some(7), calc_highest_bit_set(0xF0));
    assert_eq!(Some(127), calc_highest_bit_set(u128::MAX));
}

#[test]
fn powers() {
    assert!(!is_power_of2(0));
    assert!(is_power_of2(1));
    assert!(is_power_of2(2));
    assert!(!is_power_of2(6));
    assert!(is_power_of2(1 << 100));

    assert!(is_power_of(1, 3));
    assert!(is_power_of(81, 3));
    assert!(!is_power_of(82, 3));
    assert!(!is_power_of(0, 3));
    assert!(!is_power_of(1, 1));
    assert!(!is_power_of(4, 0));
}

#[test]
fn next_powers() {
    assert_eq!(Some(1), calc_next_power_of2(0));
    assert_eq!(Some(1), calc_next_power_of2(1));
    assert_eq!(Some(4), calc_next_power_of2(3));
    assert_eq!(Some(4), calc_next_power_of2(4));
    assert_eq!(Some(8), calc_next_power_of2(5));
    assert_eq!(None, calc_next_power_of2(u128::MAX));

    assert_eq!(Some(1), calc_next_power_of(0, 10));
    assert_eq!(Some(100), calc_next_power_of(11, 10));
    assert_eq!(Some(100), calc_next_power_of(100, 10));
    assert_eq!(Some(27), calc_next_power_of(10, 3));
    assert_eq!(None, calc_next_power_of(10, 1));
    assert_eq!(None, calc_next_power_of(u128::MAX, 3));
}

#[test]
fn masks() {
    assert_eq!(0, mask(0));
    assert_eq!(1, mask(1));
    assert_eq!(0xFF, mask(8));
    assert_eq!(u128::MAX, mask(128));
    assert_eq!(u128::MAX, mask(200));
}

#[test]
fn alignment() {
    assert_eq!(Some(0x1000), align_up(0x1000, 0x1000));
    assert_eq!(Some(0x2000), align_up(0x1001, 0x1000));
    assert_eq!(Some(12), align_up(10, 6));
    assert_eq!(None, align_up(10, 0));
    assert_eq!(None, align_up(u64::MAX, 0x10));

    assert_eq!(Some(0x1000), align_down(0x1FFF, 0x1000));
    assert_eq!(Some(6), align_down(10, 6));
    assert_eq!(None, align_down(10, 0));

    assert!(is_aligned(0x3000, 0x1000));
    assert!(!is_aligned(0x3004, 0x1000));
    assert!(!is_aligned(0, 0));
}

#[test]
fn hex_display() {
    assert_eq!("0x1000", Hex::new(0x1000).to_string());
    assert_eq!("0x1FFF", Hex::new(0x1FFF).to_string());
    assert_eq!("0x0", Hex::new(0).to_string());
    assert_eq!("0x00001000", Hex::with_width(0x1000, 32).to_string());
    assert_eq!("0x0FF", Hex::with_width(0xFF, 10).to_string());
    // The width never truncates.
    assert_eq!("0x12345", Hex::with_width(0x12345, 8).to_string());
}

#[test]
fn hex_compares_value_only() {
    assert_eq!(Hex::new(0x10), Hex::with_width(0x10, 32));
    assert!(Hex::new(0x10) < Hex::with_width(0x11, 8));
    assert_eq!(0x10_u128, u128::from(Hex::with_width(0x10, 32)));
}

#[test]
fn hex_from_str() {
    let hex: Hex = "0x1000".parse().unwrap();
    assert_eq!(0x1000, hex.value());
    assert_eq!(None, hex.width());
    assert!("0xZZ".parse::<Hex>().is_err());
}

#[test]
fn bytes_display() {
    assert_eq!("0 bytes", Bytes::new(0).to_string());
    assert_eq!("1 byte", Bytes::new(1).to_string());
    assert_eq!("256 bytes", Bytes::new(256).to_string());
    assert_eq!("1 KB", Bytes::new(1024).to_string());
    assert_eq!("4 KB", Bytes::new(0x1000).to_string());
    assert_eq!("32 KB", Bytes::new(0x8000).to_string());
    assert_eq!("1536 bytes", Bytes::new(1536).to_string());
    assert_eq!("3 MB", Bytes::mib(3).to_string());
    assert_eq!("1025 KB", Bytes::kib(1025).to_string());
    assert_eq!("2 GB", Bytes::gib(2).to_string());
    assert_eq!("1 TB", Bytes::new(TIB).to_string());
}

#[test]
fn bytes_from_str() {
    assert_eq!(Bytes::kib(4), "4 KB".parse().unwrap());
    assert_eq!(Bytes::kib(4), "4KB".parse().unwrap());
    assert_eq!(Bytes::kib(4), "4 kib".parse().unwrap());
    assert_eq!(Bytes::kib(4), " 4k ".parse().unwrap());
    assert_eq!(Bytes::mib(2), "2 MB".parse().unwrap());
    assert_eq!(Bytes::new(256), "256 bytes".parse().unwrap());
    assert_eq!(Bytes::new(1), "1 byte".parse().unwrap());
    assert_eq!(Bytes::new(0x100), "0x100".parse().unwrap());
    assert_eq!(Bytes::new(0x100), "0x100 B".parse().unwrap());
    assert_eq!(Bytes::new(0), "0b".parse().unwrap());
    assert_eq!(Bytes::new(5), "0b101".parse().unwrap());
}

#[test]
fn bytes_from_str_hex_followed_by_byte_unit() {
    assert_eq!(Bytes::new(16), "0x10bytes".parse().unwrap());
    assert_eq!(Bytes::new(16), "0x10byte".parse().unwrap());
    assert_eq!(Bytes::new(16), "0x10 b".parse().unwrap());
    assert_eq!(Bytes::new(16), "0x10 BYTES".parse().unwrap());
    assert_eq!(Bytes::new(0xAB), "0xABbytes".parse().unwrap());
    // Without a separator a trailing `b` is a hex digit
    assert_eq!(Bytes::new(0x10B), "0x10b".parse().unwrap());
    assert_eq!(Bytes::kib(0x10), "0x10kb".parse().unwrap());
    assert_eq!(Bytes::new(16), "16bytes".parse().unwrap());
}

#[test]
fn bytes_from_str_rejects_invalid_input() {
    assert!(matches!("".parse::<Bytes>(), Err(ParseNumError::Syntax(_))));
    assert!(matches!("KB".parse::<Bytes>(), Err(ParseNumError::Syntax(_))));
    assert!(matches!("4 XB".parse::<Bytes>(), Err(ParseNumError::Syntax(_))));
    assert!(matches!("-4 KB".parse::<Bytes>(), Err(ParseNumError::Syntax(_))));
    assert!(matches!(
        "16777216 TB".parse::<Bytes>(),
        Err(ParseNumError::Overflow)
    ));
}

#[test]
fn bytes_display_round_trips_through_from_str() {
    for value in [0, 1, 2, 1023, 1024, 0x1000, 0x1800, MIB, 7 * GIB] {
        let bytes = Bytes::new(value);
        assert_eq!(bytes, bytes.to_string().parse().unwrap());
    }
}
