//! Locking and unlocking scripts for the funding chain.
//!
//! Only the three script shapes the wallet needs are built and recognised:
//!
//! ```text
//! P2PKH     OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
//! P2SH      OP_HASH160 <20 bytes> OP_EQUAL
//! scriptSig <signature || sighash byte> <public key>
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;

/// Raw script bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
    /// An empty script (unsigned inputs carry one).
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pay-to-pubkey-hash locking script.
    pub fn p2pkh(pubkey_hash: &[u8; 20]) -> Self {
        let mut bytes = Vec::with_capacity(25);
        bytes.extend_from_slice(&[OP_DUP, OP_HASH160, 20]);
        bytes.extend_from_slice(pubkey_hash);
        bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Self(bytes)
    }

    /// Pay-to-script-hash locking script.
    pub fn p2sh(script_hash: &[u8; 20]) -> Self {
        let mut bytes = Vec::with_capacity(23);
        bytes.extend_from_slice(&[OP_HASH160, 20]);
        bytes.extend_from_slice(script_hash);
        bytes.push(OP_EQUAL);
        Self(bytes)
    }

    /// Unlocking script for a P2PKH output: `<signature> <public key>`.
    ///
    /// `signature` must already carry the trailing sighash type byte.
    pub fn unlocking(signature: &[u8], public_key: &[u8]) -> Self {
        let mut script = Self::new();
        script.push_slice(signature);
        script.push_slice(public_key);
        script
    }

    /// Append a minimal data push.
    pub fn push_slice(&mut self, data: &[u8]) {
        let len = data.len();
        if len < OP_PUSHDATA1 as usize {
            self.0.push(len as u8);
        } else if len <= u8::MAX as usize {
            self.0.push(OP_PUSHDATA1);
            self.0.push(len as u8);
        } else if len <= u16::MAX as usize {
            self.0.push(OP_PUSHDATA2);
            self.0.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.0.push(OP_PUSHDATA4);
            self.0.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.0.extend_from_slice(data);
    }

    /// The 20-byte hash if this is a P2PKH locking script.
    pub fn p2pkh_hash(&self) -> Option<[u8; 20]> {
        let b = &self.0;
        if b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == 20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
        {
            b[3..23].try_into().ok()
        } else {
            None
        }
    }

    /// The 20-byte hash if this is a P2SH locking script.
    pub fn p2sh_hash(&self) -> Option<[u8; 20]> {
        let b = &self.0;
        if b.len() == 23 && b[0] == OP_HASH160 && b[1] == 20 && b[22] == OP_EQUAL {
            b[2..22].try_into().ok()
        } else {
            None
        }
    }

    /// Split a push-only script into its data items.
    ///
    /// Returns `None` if the script contains a non-push opcode or a push
    /// running past the end of the script.
    pub fn push_items(&self) -> Option<Vec<&[u8]>> {
        let b = &self.0;
        let mut items = Vec::new();
        let mut pos = 0;
        while pos < b.len() {
            let op = b[pos];
            pos += 1;
            let len = match op {
                0x00..=0x4b => op as usize,
                OP_PUSHDATA1 => {
                    let n = *b.get(pos)? as usize;
                    pos += 1;
                    n
                }
                OP_PUSHDATA2 => {
                    let n = u16::from_le_bytes(b.get(pos..pos + 2)?.try_into().ok()?) as usize;
                    pos += 2;
                    n
                }
                OP_PUSHDATA4 => {
                    let n = u32::from_le_bytes(b.get(pos..pos + 4)?.try_into().ok()?) as usize;
                    pos += 4;
                    n
                }
                _ => return None,
            };
            items.push(b.get(pos..pos.checked_add(len)?)?);
            pos += len;
        }
        Some(items)
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Script {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Script {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(Self).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn p2pkh_layout() {
        let script = Script::p2pkh(&[0x11; 20]);
        assert_eq!(script.len(), 25);
        assert_eq!(
            script.to_string(),
            format!("76a914{}88ac", "11".repeat(20))
        );
        assert_eq!(script.p2pkh_hash(), Some([0x11; 20]));
        assert_eq!(script.p2sh_hash(), None);
    }

    #[test]
    fn p2sh_layout() {
        let script = Script::p2sh(&[0x22; 20]);
        assert_eq!(script.len(), 23);
        assert_eq!(script.as_bytes()[0], OP_HASH160);
        assert_eq!(script.as_bytes()[22], OP_EQUAL);
        assert_eq!(script.p2sh_hash(), Some([0x22; 20]));
        assert_eq!(script.p2pkh_hash(), None);
    }

    #[test]
    fn unlocking_script_items() {
        let sig = vec![0x30; 71];
        let pubkey = vec![0x04; 65];
        let script = Script::unlocking(&sig, &pubkey);
        assert_eq!(script.len(), 1 + 71 + 1 + 65);
        let items = script.push_items().unwrap();
        assert_eq!(items, vec![sig.as_slice(), pubkey.as_slice()]);
    }

    #[test]
    fn pushdata1_for_long_items() {
        let mut script = Script::new();
        script.push_slice(&[0xAB; 100]);
        assert_eq!(script.as_bytes()[0], OP_PUSHDATA1);
        assert_eq!(script.as_bytes()[1], 100);
        assert_eq!(script.push_items().unwrap(), vec![&[0xAB; 100][..]]);
    }

    #[test]
    fn push_items_rejects_opcodes() {
        let script = Script::p2pkh(&[0u8; 20]);
        assert!(script.push_items().is_none());
    }

    #[test]
    fn push_items_rejects_truncated_push() {
        let script = Script::from_bytes(vec![10, 1, 2, 3]);
        assert!(script.push_items().is_none());
    }

    #[test]
    fn empty_script_has_no_items() {
        assert_eq!(Script::new().push_items().unwrap().len(), 0);
    }

    #[test]
    fn serde_as_hex() {
        let script = Script::p2sh(&[0x33; 20]);
        let json = serde_json::to_string(&script).unwrap();
        assert_eq!(json, format!("\"{script}\""));
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn push_items_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..300)) {
            let _ = Script::from_bytes(bytes).push_items();
        }

        #[test]
        fn pushes_parse_back(items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..600), 0..4)) {
            let mut script = Script::new();
            for item in &items {
                script.push_slice(item);
            }
            let parsed = script.push_items().unwrap();
            prop_assert_eq!(parsed.len(), items.len());
            for (got, want) in parsed.iter().zip(&items) {
                prop_assert_eq!(*got, want.as_slice());
            }
        }
    }
}
