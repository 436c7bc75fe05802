//! Funding-chain transaction types and their wire encoding.
//!
//! The encoding is the legacy (pre-witness) Bitcoin format. Decoding also
//! accepts witness-marked transactions so that third-party transactions
//! fetched from a block explorer can be inspected; their witnesses are
//! dropped.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::MAX_DECODE_LENGTH;
use crate::crypto::sha256d;
use crate::error::TransactionError;
use crate::script::Script;

/// A transaction id in internal byte order.
///
/// Displayed and parsed in the conventional byte-reversed hex form used by
/// block explorers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Txid(pub [u8; 32]);

impl Txid {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse the byte-reversed hex form.
    pub fn from_hex(s: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(s.trim()).map_err(|e| TransactionError::InvalidTxid(e.to_string()))?;
        let mut arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            TransactionError::InvalidTxid(format!("expected 32 bytes, got {}", v.len()))
        })?;
        arr.reverse();
        Ok(Self(arr))
    }

    /// Byte-reversed hex form.
    pub fn to_hex(&self) -> String {
        let mut rev = self.0;
        rev.reverse();
        hex::encode(rev)
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({})", self.to_hex())
    }
}

impl FromStr for Txid {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Txid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Txid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Reference to a specific output of a previous transaction.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub txid: Txid,
    pub index: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}

/// An unspent output owned by the funding address, as reported by a
/// block explorer.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Utxo {
    pub outpoint: OutPoint,
    /// Value in satoshis.
    pub value: u64,
}

impl Utxo {
    pub fn new(txid: Txid, index: u32, value: u64) -> Self {
        Self {
            outpoint: OutPoint { txid, index },
            value,
        }
    }
}

/// Sum of UTXO values, `None` on overflow.
pub fn total_value(utxos: &[Utxo]) -> Option<u64> {
    utxos.iter().try_fold(0u64, |acc, u| acc.checked_add(u.value))
}

/// A transaction input, spending a previous output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxInput {
    pub previous_output: OutPoint,
    /// Unlocking script. Empty until signed.
    pub script_sig: Script,
    pub sequence: u32,
}

/// A transaction output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    /// Value in satoshis.
    pub value: u64,
    pub script_pubkey: Script,
}

/// A funding-chain transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
}

impl Transaction {
    /// Legacy wire encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(10 + self.inputs.len() * 180 + self.outputs.len() * 34);
        out.extend_from_slice(&self.version.to_le_bytes());
        write_varint(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(input.previous_output.txid.as_bytes());
            out.extend_from_slice(&input.previous_output.index.to_le_bytes());
            write_varint(&mut out, input.script_sig.len() as u64);
            out.extend_from_slice(input.script_sig.as_bytes());
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }
        write_varint(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            out.extend_from_slice(&output.value.to_le_bytes());
            write_varint(&mut out, output.script_pubkey.len() as u64);
            out.extend_from_slice(output.script_pubkey.as_bytes());
        }
        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    /// Decode a transaction, rejecting trailing bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut r = Reader::new(bytes);
        let version = r.read_u32()?;

        // Witness marker (0x00) followed by flag (0x01).
        let segwit = r.peek(2) == Some(&[0x00, 0x01][..]);
        if segwit {
            r.skip(2)?;
        }

        let input_count = r.read_len()?;
        let mut inputs = Vec::with_capacity(input_count.min(1024));
        for _ in 0..input_count {
            let mut txid = [0u8; 32];
            txid.copy_from_slice(r.read_bytes(32)?);
            let index = r.read_u32()?;
            let script_len = r.read_len()?;
            let script_sig = Script::from_bytes(r.read_bytes(script_len)?.to_vec());
            let sequence = r.read_u32()?;
            inputs.push(TxInput {
                previous_output: OutPoint {
                    txid: Txid(txid),
                    index,
                },
                script_sig,
                sequence,
            });
        }

        let output_count = r.read_len()?;
        let mut outputs = Vec::with_capacity(output_count.min(1024));
        for _ in 0..output_count {
            let value = r.read_u64()?;
            let script_len = r.read_len()?;
            let script_pubkey = Script::from_bytes(r.read_bytes(script_len)?.to_vec());
            outputs.push(TxOutput {
                value,
                script_pubkey,
            });
        }

        if segwit {
            for _ in 0..inputs.len() {
                let items = r.read_len()?;
                for _ in 0..items {
                    let len = r.read_len()?;
                    r.skip(len)?;
                }
            }
        }

        let lock_time = r.read_u32()?;
        if r.remaining() != 0 {
            return Err(TransactionError::TrailingBytes(r.remaining()));
        }

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    /// Hex of the legacy wire encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.encode())
    }

    pub fn from_hex(s: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(s.trim()).map_err(|e| TransactionError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// Double-SHA256 of the legacy encoding.
    pub fn txid(&self) -> Txid {
        Txid(sha256d(&self.encode()))
    }

    /// Sum of all output values.
    pub fn total_output_value(&self) -> Result<u64, TransactionError> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.value))
            .ok_or(TransactionError::ValueOverflow)
    }
}

/// Append a Bitcoin compact-size integer.
pub fn write_varint(out: &mut Vec<u8>, n: u64) {
    if n < 0xfd {
        out.push(n as u8);
    } else if n <= 0xffff {
        out.push(0xfd);
        out.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xffff_ffff {
        out.push(0xfe);
        out.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        out.push(0xff);
        out.extend_from_slice(&n.to_le_bytes());
    }
}

/// Cursor over a byte slice with bounds-checked reads.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn peek(&self, n: usize) -> Option<&'a [u8]> {
        self.data.get(self.pos..self.pos + n)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], TransactionError> {
        if n > self.remaining() {
            return Err(TransactionError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> Result<(), TransactionError> {
        self.read_bytes(n).map(|_| ())
    }

    fn read_u8(&mut self) -> Result<u8, TransactionError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, TransactionError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, TransactionError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> Result<u64, TransactionError> {
        let b = self.read_bytes(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    fn read_varint(&mut self) -> Result<u64, TransactionError> {
        match self.read_u8()? {
            0xfd => Ok(self.read_u16()? as u64),
            0xfe => Ok(self.read_u32()? as u64),
            0xff => self.read_u64(),
            n => Ok(n as u64),
        }
    }

    /// A varint used as a count or byte length.
    fn read_len(&mut self) -> Result<usize, TransactionError> {
        let n = self.read_varint()?;
        if n > MAX_DECODE_LENGTH {
            return Err(TransactionError::OversizedLength(n));
        }
        Ok(n as usize)
    }
}
