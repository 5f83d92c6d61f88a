//! Encoding normalization ahead of parsing.
//!
//! Raw bytes become a `String` before any grammar sees them. The encoding is
//! chosen in this order:
//!
//! 1. a magic comment on line 1, or on line 2 when line 1 is a shebang
//!    (`# encoding: X`, `# coding: X`, `# -*- coding: X -*-`)
//! 2. the caller's default (`ParseOptions::encoding`)
//! 3. UTF-8
//!
//! A leading UTF-8 byte-order mark is dropped in every case.

use std::fmt;
use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::error::ParseError;

const BOM: &[u8] = b"\xEF\xBB\xBF";

static MAGIC_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^#.*coding[:=][ \t]*([A-Za-z0-9_.\-]+)").expect("magic comment pattern")
});

/// Encodings the ingestion layer can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    UsAscii,
    /// `ASCII-8BIT`: every byte is one character.
    Binary,
    /// `ISO-8859-1`: every byte is the code point of the same value.
    Latin1,
}

impl Encoding {
    /// Resolve an encoding name case-insensitively, with the usual aliases.
    pub fn from_name(name: &str) -> Option<Encoding> {
        match name.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            "us-ascii" | "ascii" | "ansi_x3.4-1968" | "646" => Some(Encoding::UsAscii),
            "ascii-8bit" | "binary" => Some(Encoding::Binary),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Some(Encoding::Latin1),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::UsAscii => "US-ASCII",
            Encoding::Binary => "ASCII-8BIT",
            Encoding::Latin1 => "ISO-8859-1",
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<String, ParseError> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|err| {
                self.invalid(err.utf8_error().valid_up_to())
            }),
            Encoding::UsAscii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(at) => Err(self.invalid(at)),
                None => Ok(bytes.iter().copied().map(char::from).collect()),
            },
            Encoding::Binary | Encoding::Latin1 => Ok(bytes.iter().copied().map(char::from).collect()),
        }
    }

    fn invalid(self, offset: usize) -> ParseError {
        ParseError::Encoding {
            encoding: self.name().to_string(),
            message: format!("invalid byte sequence in {} at offset {}", self.name(), offset),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded source text and the encoding it was read as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: Encoding,
}

/// The encoding named by a magic comment, if the source has one.
pub fn magic_comment(raw: &[u8]) -> Option<&str> {
    let raw = raw.strip_prefix(BOM).unwrap_or(raw);
    let mut lines = raw.split(|&b| b == b'\n');
    let first = lines.next()?;
    let line = if first.starts_with(b"#!") {
        lines.next()?
    } else {
        first
    };
    let name = MAGIC_COMMENT.captures(line)?.get(1)?;
    std::str::from_utf8(name.as_bytes()).ok()
}

/// Decode `raw` for parsing.
///
/// # Errors
///
/// [`ParseError::Encoding`] when the chosen encoding name is unknown or the
/// bytes are invalid in it.
pub fn decode(raw: &[u8], default: Option<&str>) -> Result<Decoded, ParseError> {
    let name = magic_comment(raw).or(default);
    let encoding = match name {
        Some(name) => Encoding::from_name(name).ok_or_else(|| ParseError::Encoding {
            encoding: name.to_string(),
            message: format!("unknown encoding name - {}", name),
        })?,
        None => Encoding::Utf8,
    };
    let body = raw.strip_prefix(BOM).unwrap_or(raw);
    let text = encoding.decode(body)?;
    Ok(Decoded { text, encoding })
}
