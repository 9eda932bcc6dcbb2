use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};

use crate::error::ClientError;

/// Text form is always 58 characters: 32 key bytes + 4 checksum bytes in base32
pub const ADDRESS_TEXT_LEN: usize = 58;

const CHECKSUM_LEN: usize = 4;
const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// A 32-byte account public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub fn from_public_key(key: [u8; 32]) -> Self {
        Address(key)
    }

    /// Derived account that holds an application's funds
    pub fn for_application(app_id: u64) -> Self {
        let mut hasher = Sha512_256::new();
        hasher.update(b"appID");
        hasher.update(app_id.to_be_bytes());
        Address(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let digest = Sha512_256::digest(self.0);
        let mut tail = [0u8; CHECKSUM_LEN];
        tail.copy_from_slice(&digest[32 - CHECKSUM_LEN..]);
        tail
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = [0u8; 32 + CHECKSUM_LEN];
        raw[..32].copy_from_slice(&self.0);
        raw[32..].copy_from_slice(&self.checksum());
        f.write_str(&base32_encode(&raw))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_TEXT_LEN {
            return Err(ClientError::Validation(format!(
                "Invalid address format: expected {ADDRESS_TEXT_LEN} characters, got {}",
                s.len()
            )));
        }

        let raw = base32_decode(s)
            .ok_or_else(|| ClientError::Validation("Invalid address format".to_string()))?;
        if raw.len() < 32 + CHECKSUM_LEN {
            return Err(ClientError::Validation("Invalid address format".to_string()));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&raw[..32]);
        let address = Address(key);

        if raw[32..32 + CHECKSUM_LEN] != address.checksum() {
            return Err(ClientError::Validation(
                "Invalid address checksum".to_string(),
            ));
        }

        Ok(address)
    }
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8 + 4) / 5);
    let mut buf: u32 = 0;
    let mut bits = 0;

    for &byte in data {
        buf = (buf << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buf >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buf << (5 - bits)) & 0x1f) as usize] as char);
    }

    out
}

fn base32_decode(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buf: u32 = 0;
    let mut bits = 0;

    for ch in text.bytes() {
        let value = ALPHABET.iter().position(|&a| a == ch)? as u32;
        buf = (buf << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buf >> bits) as u8);
        }
    }

    Some(out)
}
