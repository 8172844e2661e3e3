// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS wire protocol helpers
//!
//! A sentence is a sequence of length-prefixed words terminated by a
//! zero-length word.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{AppError, Result};

/// Largest word accepted from a router
pub(super) const MAX_WORD_LEN: usize = 16 * 1024 * 1024;

// RouterOS protocol length encoding - intentional truncation is part of the wire format
#[allow(clippy::cast_possible_truncation)]
pub fn encode_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        vec![len as u8]
    } else if len < 0x4000 {
        vec![((len >> 8) as u8) | 0x80, (len & 0xFF) as u8]
    } else if len < 0x0020_0000 {
        vec![
            ((len >> 16) as u8) | 0xC0,
            ((len >> 8) & 0xFF) as u8,
            (len & 0xFF) as u8,
        ]
    } else if len < 0x1000_0000 {
        vec![
            ((len >> 24) as u8) | 0xE0,
            ((len >> 16) & 0xFF) as u8,
            ((len >> 8) & 0xFF) as u8,
            (len & 0xFF) as u8,
        ]
    } else {
        vec![
            0xF0,
            ((len >> 24) & 0xFF) as u8,
            ((len >> 16) & 0xFF) as u8,
            ((len >> 8) & 0xFF) as u8,
            (len & 0xFF) as u8,
        ]
    }
}

/// Encodes a full sentence, including the terminating empty word
pub fn encode_sentence<S: AsRef<str>>(words: &[S]) -> Vec<u8> {
    let mut out = Vec::new();
    for word in words {
        let bytes = word.as_ref().as_bytes();
        out.extend_from_slice(&encode_length(bytes.len()));
        out.extend_from_slice(bytes);
    }
    out.push(0);
    out
}

pub(super) async fn read_length<R>(stream: &mut R) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let first = stream.read_u8().await?;
    let len = if first & 0x80 == 0 {
        first as usize
    } else if first & 0xC0 == 0x80 {
        let second = stream.read_u8().await?;
        (((first & 0x3F) as usize) << 8) + second as usize
    } else if first & 0xE0 == 0xC0 {
        let second = stream.read_u8().await?;
        let third = stream.read_u8().await?;
        (((first & 0x1F) as usize) << 16) + ((second as usize) << 8) + third as usize
    } else if first & 0xF0 == 0xE0 {
        let second = stream.read_u8().await?;
        let third = stream.read_u8().await?;
        let fourth = stream.read_u8().await?;
        (((first & 0x0F) as usize) << 24)
            + ((second as usize) << 16)
            + ((third as usize) << 8)
            + fourth as usize
    } else if first == 0xF0 {
        // five byte length: marker followed by a big-endian u32
        let rest = stream.read_u32().await?;
        rest as usize
    } else {
        // 0xF8..=0xFF are reserved control bytes
        return Err(AppError::RouterOs(format!(
            "Unsupported control byte in length prefix: {first:#04X}"
        )));
    };
    Ok(len)
}

/// Reads one word; an empty string marks the end of a sentence
pub(super) async fn read_word<R>(stream: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let len = read_length(stream).await?;
    if len == 0 {
        return Ok(String::new());
    }
    if len > MAX_WORD_LEN {
        return Err(AppError::RouterOs(format!("Word too long: {len} bytes")));
    }
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into())
}

/// Reads words up to the terminating empty word
pub(super) async fn read_sentence<R>(stream: &mut R) -> Result<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let mut words = Vec::new();
    loop {
        let word = read_word(stream).await?;
        if word.is_empty() {
            // stray terminators between sentences are skipped
            if words.is_empty() {
                continue;
            }
            return Ok(words);
        }
        words.push(word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_length_small() {
        assert_eq!(encode_length(0), vec![0]);
        assert_eq!(encode_length(1), vec![1]);
        assert_eq!(encode_length(127), vec![127]);
    }

    #[test]
    fn test_encode_length_medium() {
        assert_eq!(encode_length(128), vec![0x80, 0x80]);
        assert_eq!(encode_length(256), vec![0x81, 0x00]);
        assert_eq!(encode_length(0x3FFF), vec![0xBF, 0xFF]);
    }

    #[test]
    fn test_encode_length_large() {
        assert_eq!(encode_length(0x4000), vec![0xC0, 0x40, 0x00]);
        assert_eq!(encode_length(0x1F_FFFF), vec![0xDF, 0xFF, 0xFF]);
        assert_eq!(
            encode_length(0x1000_0000),
            vec![0xF0, 0x10, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_encode_sentence() {
        let mut expected = vec![6u8];
        expected.extend_from_slice(b"/login");
        expected.push(11);
        expected.extend_from_slice(b"=name=admin");
        expected.push(0);
        assert_eq!(encode_sentence(&["/login", "=name=admin"]), expected);
        assert_eq!(encode_sentence::<&str>(&[]), vec![0]);
    }

    #[tokio::test]
    async fn test_read_length_all_widths() {
        for len in [0usize, 0x7F, 0x80, 0x3FFF, 0x4000, 0x1F_FFFF, 0x20_0000, 0x1000_0000] {
            let encoded = encode_length(len);
            let mut reader = encoded.as_slice();
            assert_eq!(read_length(&mut reader).await.unwrap(), len);
        }
    }

    #[tokio::test]
    async fn test_read_length_rejects_control_byte() {
        let mut reader: &[u8] = &[0xF8];
        assert!(matches!(
            read_length(&mut reader).await,
            Err(AppError::RouterOs(_))
        ));
    }

    #[tokio::test]
    async fn test_read_sentence_skips_leading_terminators() {
        let mut bytes = vec![0u8];
        bytes.extend(encode_sentence(&["!re", "=name=ether1"]));
        let mut reader = bytes.as_slice();
        let words = read_sentence(&mut reader).await.unwrap();
        assert_eq!(words, vec!["!re", "=name=ether1"]);
    }

    #[tokio::test]
    async fn test_read_sentence_truncated_stream() {
        let bytes = [3u8, b'!', b'r'];
        let mut reader = bytes.as_slice();
        assert!(matches!(
            read_sentence(&mut reader).await,
            Err(AppError::Io(_))
        ));
    }
}
