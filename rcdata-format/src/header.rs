//! The fixed MicroCode preamble.
//!
//! Sixteen bits, most significant field first:
//!
//! ```text
//!  15    12  11   10   9   7   6   5          0
//! [ident:4 ][C:1][E:1][prime:3][H:1][expand_len:6]
//! ```
//!
//! `C`, `E` and `H` flag the compaction, encryption and hash stages.
//! `expand_len` counts the expansion bytes that follow immediately after the
//! header. The 6-bit width is part of format version 1.

use crate::error::{FormatError, FormatResult};

/// Width of the fixed header in bytes.
pub const HEADER_LEN: usize = 2;

/// Bit width of the `expand_len` field.
pub const EXPAND_LEN_BITS: u32 = 6;

/// Largest expansion area the header can describe.
pub const MAX_EXPAND_LEN: u8 = (1 << EXPAND_LEN_BITS) - 1;

/// Largest value of the `prime` parameter field.
pub const MAX_PRIME: u8 = 0b111;

const IDENT_SHIFT: u32 = 12;
const COMPACT_BIT: u16 = 1 << 11;
const ENCRYPT_BIT: u16 = 1 << 10;
const PRIME_SHIFT: u32 = 7;
const HASH_BIT: u16 = 1 << 6;
const EXPAND_MASK: u16 = 0b11_1111;

/// The decoded preamble bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MicroCodeHeader {
    pub(crate) identifier: u8,
    pub(crate) compact: bool,
    pub(crate) encrypt: bool,
    pub(crate) prime: u8,
    pub(crate) hash: bool,
    pub(crate) expand_len: u8,
}

impl MicroCodeHeader {
    /// Builds a header, checking every field against its bit width.
    ///
    /// An active compaction or encryption stage needs a nonzero
    /// `expand_len`, since the expansion area names its algorithm.
    pub fn new(
        identifier: u8,
        compact: bool,
        encrypt: bool,
        prime: u8,
        hash: bool,
        expand_len: u8,
    ) -> FormatResult<Self> {
        if identifier > 0x0f {
            return Err(FormatError::InvalidHeader(format!(
                "identifier {identifier:#x} does not fit in 4 bits"
            )));
        }
        if prime > MAX_PRIME {
            return Err(FormatError::InvalidHeader(format!(
                "prime {prime} does not fit in 3 bits"
            )));
        }
        if expand_len > MAX_EXPAND_LEN {
            return Err(FormatError::InvalidHeader(format!(
                "expand length {expand_len} exceeds {MAX_EXPAND_LEN}"
            )));
        }
        if (compact || encrypt) && expand_len == 0 {
            return Err(FormatError::InvalidHeader(
                "expand length must be nonzero when compaction or encryption is active".into(),
            ));
        }
        Ok(Self {
            identifier,
            compact,
            encrypt,
            prime,
            hash,
            expand_len,
        })
    }

    pub fn identifier(&self) -> u8 {
        self.identifier
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }

    pub fn is_encrypt(&self) -> bool {
        self.encrypt
    }

    pub fn prime(&self) -> u8 {
        self.prime
    }

    pub fn is_hash(&self) -> bool {
        self.hash
    }

    pub fn expand_len(&self) -> usize {
        usize::from(self.expand_len)
    }

    /// Packs the header into its 16-bit big-endian form.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut bits = u16::from(self.identifier) << IDENT_SHIFT;
        if self.compact {
            bits |= COMPACT_BIT;
        }
        if self.encrypt {
            bits |= ENCRYPT_BIT;
        }
        bits |= u16::from(self.prime) << PRIME_SHIFT;
        if self.hash {
            bits |= HASH_BIT;
        }
        bits |= u16::from(self.expand_len) & EXPAND_MASK;
        bits.to_be_bytes()
    }

    /// Unpacks the header from the start of `buf`.
    ///
    /// Fails if `buf` is shorter than the header or if `expand_len` claims
    /// more bytes than `buf` holds after it.
    pub fn decode(buf: &[u8]) -> FormatResult<Self> {
        if buf.len() < HEADER_LEN {
            return Err(FormatError::Truncated {
                expected: HEADER_LEN,
                actual: buf.len(),
            });
        }
        let bits = u16::from_be_bytes([buf[0], buf[1]]);
        let header = Self::new(
            (bits >> IDENT_SHIFT) as u8,
            bits & COMPACT_BIT != 0,
            bits & ENCRYPT_BIT != 0,
            ((bits >> PRIME_SHIFT) as u8) & MAX_PRIME,
            bits & HASH_BIT != 0,
            (bits & EXPAND_MASK) as u8,
        )?;

        let available = buf.len() - HEADER_LEN;
        if header.expand_len() > available {
            return Err(FormatError::ExpandLength {
                claimed: header.expand_len(),
                available,
            });
        }
        Ok(header)
    }

    /// Decodes the header and splits `buf` into expansion bytes and the
    /// remaining payload.
    pub fn split(buf: &[u8]) -> FormatResult<(Self, &[u8], &[u8])> {
        let header = Self::decode(buf)?;
        let body = &buf[HEADER_LEN..];
        let (expansion, payload) = body.split_at(header.expand_len());
        Ok((header, expansion, payload))
    }
}
