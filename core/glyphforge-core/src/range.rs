//! Hex character-range expressions (`0x30-0x39,0x2B,...`)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Why a range expression was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRangeError {
    #[error("range expression is empty")]
    Empty,
    #[error("empty token at position {index}")]
    EmptyToken { index: usize },
    #[error("invalid hex literal: {token} (expected 0x-prefixed hex)")]
    InvalidHex { token: String },
    #[error("invalid range: {token} (0x{lo:X} > 0x{hi:X})")]
    Reversed { token: String, lo: u32, hi: u32 },
    #[error("{token} is not a Unicode scalar value (0x{value:X})")]
    NotScalar { token: String, value: u32 },
}

/// One comma-separated piece of a range expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeToken {
    Interval { lo: u32, hi: u32 },
    Single(u32),
}

impl RangeToken {
    /// Number of characters this token decodes to.
    pub fn count(&self) -> usize {
        match *self {
            RangeToken::Interval { lo, hi } => (hi - lo) as usize + 1,
            RangeToken::Single(_) => 1,
        }
    }

    fn chars(self) -> impl Iterator<Item = char> {
        let (lo, hi) = match self {
            RangeToken::Interval { lo, hi } => (lo, hi),
            RangeToken::Single(cp) => (cp, cp),
        };
        // Parsing rejects tokens that touch non-scalar values.
        (lo..=hi).filter_map(char::from_u32)
    }
}

impl fmt::Display for RangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeToken::Interval { lo, hi } => write!(f, "0x{lo:X}-0x{hi:X}"),
            RangeToken::Single(cp) => write!(f, "0x{cp:X}"),
        }
    }
}

/// A parsed, immutable glyph selection.
///
/// The textual form (`Display`) is what the rasterizer receives through
/// `--range`; [`CharacterRangeSpec::decode`] is what the glyph set actually
/// contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRangeSpec {
    tokens: Vec<RangeToken>,
}

impl CharacterRangeSpec {
    pub fn parse(input: &str) -> Result<Self, MalformedRangeError> {
        if input.trim().is_empty() {
            return Err(MalformedRangeError::Empty);
        }

        let mut tokens = Vec::new();
        for (index, part) in input.split(',').enumerate() {
            let part = part.trim();
            if part.is_empty() {
                return Err(MalformedRangeError::EmptyToken { index });
            }
            tokens.push(parse_token(part)?);
        }

        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[RangeToken] {
        &self.tokens
    }

    /// Expand every token, in token order, into its characters.
    pub fn decode(&self) -> Vec<char> {
        let mut result = Vec::with_capacity(self.len());
        for token in &self.tokens {
            result.extend(token.chars());
        }
        result
    }

    /// Number of decoded characters, duplicates included.
    pub fn len(&self) -> usize {
        self.tokens.iter().map(RangeToken::count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Normalized form: upper-case hex, `0x` prefixes, no whitespace. This is the
/// exact text passed to the rasterizer's `--range`, so `0x2b, 0x30-0x39`
/// goes out as `0x2B,0x30-0x39`.
impl fmt::Display for CharacterRangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl FromStr for CharacterRangeSpec {
    type Err = MalformedRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CharacterRangeSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CharacterRangeSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse and decode in one step.
pub fn decode_range(input: &str) -> Result<Vec<char>, MalformedRangeError> {
    Ok(CharacterRangeSpec::parse(input)?.decode())
}

fn parse_token(part: &str) -> Result<RangeToken, MalformedRangeError> {
    match part.split_once('-') {
        Some((start, end)) => {
            let lo = parse_hex(start.trim(), part)?;
            let hi = parse_hex(end.trim(), part)?;
            if lo > hi {
                return Err(MalformedRangeError::Reversed {
                    token: part.to_string(),
                    lo,
                    hi,
                });
            }
            // Both endpoints must be scalars and the span must not cross the surrogate block.
            ensure_scalar(lo, part)?;
            ensure_scalar(hi, part)?;
            if lo < 0xD800 && hi > 0xDFFF {
                return Err(MalformedRangeError::NotScalar {
                    token: part.to_string(),
                    value: 0xD800,
                });
            }
            Ok(RangeToken::Interval { lo, hi })
        }
        None => {
            let cp = parse_hex(part, part)?;
            ensure_scalar(cp, part)?;
            Ok(RangeToken::Single(cp))
        }
    }
}

fn parse_hex(raw: &str, token: &str) -> Result<u32, MalformedRangeError> {
    let invalid = || MalformedRangeError::InvalidHex {
        token: token.to_string(),
    };
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(invalid)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u32::from_str_radix(digits, 16).map_err(|_| invalid())
}

fn ensure_scalar(value: u32, token: &str) -> Result<(), MalformedRangeError> {
    match char::from_u32(value) {
        Some(_) => Ok(()),
        None => Err(MalformedRangeError::NotScalar {
            token: token.to_string(),
            value,
        }),
    }
}
