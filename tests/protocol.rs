// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use routeros_monitor::{encode_length, encode_sentence};

#[test]
fn prefix_width_grows_at_each_boundary() {
    let widths = [
        (0x7F, 1),
        (0x80, 2),
        (0x3FFF, 2),
        (0x4000, 3),
        (0x1F_FFFF, 3),
        (0x0020_0000, 4),
        (0x0FFF_FFFF, 4),
        (0x1000_0000, 5),
    ];
    for (len, width) in widths {
        assert_eq!(encode_length(len).len(), width, "length {len:#X}");
    }
}

#[test]
fn five_byte_prefix_is_marker_plus_big_endian_u32() {
    let encoded = encode_length(0x1234_5678);
    assert_eq!(encoded[0], 0xF0);
    assert_eq!(u32::from_be_bytes([encoded[1], encoded[2], encoded[3], encoded[4]]), 0x1234_5678);
}

#[test]
fn login_sentence_layout() {
    let bytes = encode_sentence(&["/login", "=name=admin", "=password="]);

    let mut expected = vec![6];
    expected.extend_from_slice(b"/login");
    expected.push(11);
    expected.extend_from_slice(b"=name=admin");
    expected.push(10);
    expected.extend_from_slice(b"=password=");
    expected.push(0);
    assert_eq!(bytes, expected);
}

#[test]
fn word_length_counts_utf8_bytes() {
    // "=comment=Büro" is 13 characters but 14 bytes
    let bytes = encode_sentence(&["=comment=Büro"]);
    assert_eq!(bytes[0], 14);
    assert_eq!(bytes.len(), 1 + 14 + 1);
}

#[test]
fn long_word_uses_two_byte_prefix() {
    let word = "x".repeat(200);
    let bytes = encode_sentence(&[word]);
    assert_eq!(&bytes[..2], &[0x80, 0xC8]);
    assert_eq!(bytes.len(), 2 + 200 + 1);
    assert_eq!(bytes.last(), Some(&0));
}
