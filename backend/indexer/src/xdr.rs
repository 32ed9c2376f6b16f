//! Minimal reader for base64 XDR `ScVal`s as returned by `getEvents`.
//!
//! Covers the value shapes the distribution contract publishes (symbols,
//! addresses, integers, booleans, strings, vectors and symbol-keyed maps).
//! Decoded values are rendered into the flat JSON shape the event decoder
//! already understands: maps become objects, addresses become strkeys and
//! 64/128-bit integers become decimal strings.

use base64::Engine;
use serde_json::{Map, Value};

const SCV_BOOL: u32 = 0;
const SCV_VOID: u32 = 1;
const SCV_U32: u32 = 3;
const SCV_I32: u32 = 4;
const SCV_U64: u32 = 5;
const SCV_I64: u32 = 6;
const SCV_TIMEPOINT: u32 = 7;
const SCV_DURATION: u32 = 8;
const SCV_U128: u32 = 9;
const SCV_I128: u32 = 10;
const SCV_BYTES: u32 = 13;
const SCV_STRING: u32 = 14;
const SCV_SYMBOL: u32 = 15;
const SCV_VEC: u32 = 16;
const SCV_MAP: u32 = 17;
const SCV_ADDRESS: u32 = 18;

const SC_ADDRESS_ACCOUNT: u32 = 0;
const SC_ADDRESS_CONTRACT: u32 = 1;
const PUBLIC_KEY_ED25519: u32 = 0;

const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScVal {
    Bool(bool),
    Void,
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    U128(u128),
    I128(i128),
    Bytes(Vec<u8>),
    String(String),
    Symbol(String),
    Vec(Vec<ScVal>),
    Map(Vec<(ScVal, ScVal)>),
    /// Strkey (`G…` account or `C…` contract).
    Address(String),
}

impl ScVal {
    /// Decode a base64 XDR `ScVal`. `None` unless the whole input is one value.
    pub fn from_base64(raw: &str) -> Option<ScVal> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(raw.trim())
            .ok()?;
        let mut reader = Reader { bytes: &bytes, pos: 0 };
        let val = reader.sc_val(0)?;
        (reader.pos == bytes.len()).then_some(val)
    }

    /// Render into the JSON shape used by the event decoder.
    pub fn to_json(&self) -> Value {
        match self {
            ScVal::Bool(b) => Value::Bool(*b),
            ScVal::Void => Value::Null,
            ScVal::U32(n) => Value::from(*n),
            ScVal::I32(n) => Value::from(*n),
            ScVal::U64(n) => Value::String(n.to_string()),
            ScVal::I64(n) => Value::String(n.to_string()),
            ScVal::U128(n) => Value::String(n.to_string()),
            ScVal::I128(n) => Value::String(n.to_string()),
            ScVal::Bytes(b) => Value::String(hex::encode(b)),
            ScVal::String(s) | ScVal::Symbol(s) | ScVal::Address(s) => Value::String(s.clone()),
            ScVal::Vec(items) => Value::Array(items.iter().map(ScVal::to_json).collect()),
            ScVal::Map(entries) => {
                let mut map = Map::new();
                for (k, v) in entries {
                    let key = match k {
                        ScVal::Symbol(s) | ScVal::String(s) => s.clone(),
                        other => other.to_json().to_string(),
                    };
                    map.insert(key, v.to_json());
                }
                Value::Object(map)
            }
        }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u32(&mut self) -> Option<u32> {
        Some(u32::from_be_bytes(self.take(4)?.try_into().ok()?))
    }

    fn u64(&mut self) -> Option<u64> {
        Some(u64::from_be_bytes(self.take(8)?.try_into().ok()?))
    }

    fn fixed32(&mut self) -> Option<[u8; 32]> {
        self.take(32)?.try_into().ok()
    }

    /// Variable-length opaque, padded to a multiple of four.
    fn opaque(&mut self) -> Option<Vec<u8>> {
        let len = self.u32()? as usize;
        let body = self.take(len)?.to_vec();
        let pad = (4 - len % 4) % 4;
        if self.take(pad)?.iter().any(|b| *b != 0) {
            return None;
        }
        Some(body)
    }

    fn text(&mut self) -> Option<String> {
        String::from_utf8(self.opaque()?).ok()
    }

    fn bool(&mut self) -> Option<bool> {
        match self.u32()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    fn address(&mut self) -> Option<String> {
        match self.u32()? {
            SC_ADDRESS_ACCOUNT => {
                if self.u32()? != PUBLIC_KEY_ED25519 {
                    return None;
                }
                Some(stellar_strkey::ed25519::PublicKey(self.fixed32()?).to_string())
            }
            SC_ADDRESS_CONTRACT => Some(stellar_strkey::Contract(self.fixed32()?).to_string()),
            _ => None,
        }
    }

    fn sc_val(&mut self, depth: usize) -> Option<ScVal> {
        if depth > MAX_DEPTH {
            return None;
        }
        let val = match self.u32()? {
            SCV_BOOL => ScVal::Bool(self.bool()?),
            SCV_VOID => ScVal::Void,
            SCV_U32 => ScVal::U32(self.u32()?),
            SCV_I32 => ScVal::I32(self.u32()? as i32),
            SCV_U64 | SCV_TIMEPOINT | SCV_DURATION => ScVal::U64(self.u64()?),
            SCV_I64 => ScVal::I64(self.u64()? as i64),
            SCV_U128 => {
                let hi = self.u64()? as u128;
                let lo = self.u64()? as u128;
                ScVal::U128((hi << 64) | lo)
            }
            SCV_I128 => {
                let hi = self.u64()? as i64 as i128;
                let lo = self.u64()? as i128;
                ScVal::I128((hi << 64) | lo)
            }
            SCV_BYTES => ScVal::Bytes(self.opaque()?),
            SCV_STRING => ScVal::String(self.text()?),
            SCV_SYMBOL => ScVal::Symbol(self.text()?),
            SCV_VEC => {
                let mut items = Vec::new();
                if self.bool()? {
                    for _ in 0..self.u32()? {
                        items.push(self.sc_val(depth + 1)?);
                    }
                }
                ScVal::Vec(items)
            }
            SCV_MAP => {
                let mut entries = Vec::new();
                if self.bool()? {
                    for _ in 0..self.u32()? {
                        let key = self.sc_val(depth + 1)?;
                        let val = self.sc_val(depth + 1)?;
                        entries.push((key, val));
                    }
                }
                ScVal::Map(entries)
            }
            SCV_ADDRESS => ScVal::Address(self.address()?),
            _ => return None,
        };
        Some(val)
    }
}

#[cfg(test)]
pub(crate) mod encode {
    //! Test-side XDR writers.

    use base64::Engine;

    pub fn tag(t: u32) -> Vec<u8> {
        t.to_be_bytes().to_vec()
    }

    fn padded(body: &[u8]) -> Vec<u8> {
        let mut out = (body.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(body);
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out
    }

    pub fn symbol(s: &str) -> Vec<u8> {
        let mut out = tag(super::SCV_SYMBOL);
        out.extend(padded(s.as_bytes()));
        out
    }

    pub fn account(key: [u8; 32]) -> Vec<u8> {
        let mut out = tag(super::SCV_ADDRESS);
        out.extend(tag(super::SC_ADDRESS_ACCOUNT));
        out.extend(tag(super::PUBLIC_KEY_ED25519));
        out.extend_from_slice(&key);
        out
    }

    pub fn contract(hash: [u8; 32]) -> Vec<u8> {
        let mut out = tag(super::SCV_ADDRESS);
        out.extend(tag(super::SC_ADDRESS_CONTRACT));
        out.extend_from_slice(&hash);
        out
    }

    pub fn int128(n: i128) -> Vec<u8> {
        let mut out = tag(super::SCV_I128);
        out.extend_from_slice(&((n >> 64) as i64).to_be_bytes());
        out.extend_from_slice(&(n as u64).to_be_bytes());
        out
    }

    pub fn boolean(b: bool) -> Vec<u8> {
        let mut out = tag(super::SCV_BOOL);
        out.extend(tag(b as u32));
        out
    }

    pub fn map(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut out = tag(super::SCV_MAP);
        out.extend(tag(1));
        out.extend(tag(entries.len() as u32));
        for (k, v) in entries {
            out.extend(symbol(k));
            out.extend_from_slice(v);
        }
        out
    }

    pub fn b64(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }
}
