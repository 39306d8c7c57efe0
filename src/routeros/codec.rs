use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Upper bound for a single word. RouterOS never sends anything close to this.
pub const MAX_WORD_LEN: usize = 16 * 1024 * 1024;

/// Appends the variable-length prefix for a word of `len` bytes.
pub fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x4000 {
        let value = (len as u16) | 0x8000;
        out.extend_from_slice(&value.to_be_bytes());
    } else if len < 0x20_0000 {
        let value = (len as u32) | 0x00C0_0000;
        out.extend_from_slice(&value.to_be_bytes()[1..]);
    } else if len < 0x1000_0000 {
        let value = (len as u32) | 0xE000_0000;
        out.extend_from_slice(&value.to_be_bytes());
    } else {
        out.push(0xF0);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
}

/// Encodes a complete sentence, including the terminating empty word.
pub fn encode_sentence<S: AsRef<str>>(words: &[S]) -> Vec<u8> {
    let mut out = Vec::new();
    for word in words {
        let bytes = word.as_ref().as_bytes();
        encode_length(bytes.len(), &mut out);
        out.extend_from_slice(bytes);
    }
    out.push(0);
    out
}

pub async fn read_length<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<usize> {
    let first = reader.read_u8().await?;

    let len = if first & 0x80 == 0x00 {
        u32::from(first)
    } else if first & 0xC0 == 0x80 {
        let rest = reader.read_u8().await?;
        (u32::from(first & 0x3F) << 8) | u32::from(rest)
    } else if first & 0xE0 == 0xC0 {
        let mut rest = [0u8; 2];
        reader.read_exact(&mut rest).await?;
        (u32::from(first & 0x1F) << 16) | (u32::from(rest[0]) << 8) | u32::from(rest[1])
    } else if first & 0xF0 == 0xE0 {
        let mut rest = [0u8; 3];
        reader.read_exact(&mut rest).await?;
        (u32::from(first & 0x0F) << 24)
            | (u32::from(rest[0]) << 16)
            | (u32::from(rest[1]) << 8)
            | u32::from(rest[2])
    } else if first == 0xF0 {
        reader.read_u32().await?
    } else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("reserved control byte 0x{first:02X} in word length"),
        ));
    };

    Ok(len as usize)
}

pub async fn read_word<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<String> {
    let len = read_length(reader).await?;
    if len > MAX_WORD_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("word of {len} bytes exceeds the {MAX_WORD_LEN} byte limit"),
        ));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(decode_text(buf))
}

/// Reads words up to (and excluding) the terminating empty word.
pub async fn read_sentence<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Vec<String>> {
    let mut words = Vec::new();
    loop {
        let word = read_word(reader).await?;
        if word.is_empty() {
            return Ok(words);
        }
        words.push(word);
    }
}

// Identity and comment fields are stored in the device's codepage, not UTF-8.
fn decode_text(buf: Vec<u8>) -> String {
    match String::from_utf8(buf) {
        Ok(text) => text,
        Err(e) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            decoded.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(len: usize) -> Vec<u8> {
        let mut out = Vec::new();
        encode_length(len, &mut out);
        out
    }

    #[test]
    fn test_length_prefix_boundaries() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(0x7F), vec![0x7F]);
        assert_eq!(encoded(0x80), vec![0x80, 0x80]);
        assert_eq!(encoded(0x3FFF), vec![0xBF, 0xFF]);
        assert_eq!(encoded(0x4000), vec![0xC0, 0x40, 0x00]);
        assert_eq!(encoded(0x20_0000), vec![0xE0, 0x20, 0x00, 0x00]);
        assert_eq!(encoded(0x1000_0000), vec![0xF0, 0x10, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_sentence_terminates_with_empty_word() {
        let bytes = encode_sentence(&["/login", "=name=admin"]);
        let mut expected = vec![6];
        expected.extend_from_slice(b"/login");
        expected.push(11);
        expected.extend_from_slice(b"=name=admin");
        expected.push(0);
        assert_eq!(bytes, expected);
    }

    #[tokio::test]
    async fn test_read_sentence_with_long_word() {
        let long_value = "x".repeat(300);
        let words = vec!["!re".to_string(), format!("=comment={long_value}")];
        let bytes = encode_sentence(&words);
        let mut reader = bytes.as_slice();

        let sentence = read_sentence(&mut reader).await.unwrap();
        assert_eq!(sentence, words);
        assert!(reader.is_empty());
    }

    #[tokio::test]
    async fn test_reserved_control_byte_is_rejected() {
        let mut reader: &[u8] = &[0xF8, 0x00];
        let err = read_length(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_non_utf8_word_falls_back_to_windows_1252() {
        // "café" in Windows-1252
        let mut reader: &[u8] = &[4, b'c', b'a', b'f', 0xE9];
        let word = read_word(&mut reader).await.unwrap();
        assert_eq!(word, "café");
    }
}
