//! Key representation shared by the generated key enums and the record container.

use bincode::{Decode, Encode};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay};

/// Literal value a key is written under.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize, Display, From,
)]
pub enum KeyLiteral {
    #[display("{_0:?}")]
    Str(String),
    #[display("{_0}")]
    Int(i64),
}

impl From<&str> for KeyLiteral {
    fn from(value: &str) -> Self {
        KeyLiteral::Str(value.to_string())
    }
}

/// Raw value type backing a key enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, AsRefStr, Serialize, Deserialize)]
pub enum RawKind {
    String,
    Integer,
}

/// Implemented by `#[derive(CodingKey)]` and by the key enums the model
/// compiler synthesizes.
pub trait CodingKey: Copy + Sized + 'static {
    /// Every case, in declaration order.
    const ALL: &'static [Self];
    const RAW: RawKind;

    fn literal(&self) -> KeyLiteral;

    /// Rust name of the case.
    fn name(&self) -> &'static str;

    fn literals() -> Vec<KeyLiteral> {
        Self::ALL.iter().map(CodingKey::literal).collect()
    }
}

/// Fingerprint of the key schema described by `K`.
pub fn key_fingerprint<K: CodingKey>() -> u64 {
    fingerprint_literals(K::RAW, K::ALL.iter().map(CodingKey::literal))
}

/// Hashes an ordered literal list together with its raw kind.
pub fn fingerprint_literals(kind: RawKind, literals: impl IntoIterator<Item = KeyLiteral>) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(kind.as_ref().as_bytes());
    for literal in literals {
        match literal {
            KeyLiteral::Str(s) => {
                hasher.update(&[0u8]);
                hasher.update(&(s.len() as u64).to_le_bytes());
                hasher.update(s.as_bytes());
            }
            KeyLiteral::Int(i) => {
                hasher.update(&[1u8]);
                hasher.update(&i.to_le_bytes());
            }
        }
    }
    let mut head = [0u8; 8];
    head.copy_from_slice(&hasher.finalize().as_bytes()[..8]);
    u64::from_le_bytes(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Keys {
        A,
        B,
    }

    impl CodingKey for Keys {
        const ALL: &'static [Self] = &[Keys::A, Keys::B];
        const RAW: RawKind = RawKind::String;

        fn literal(&self) -> KeyLiteral {
            match self {
                Keys::A => "a".into(),
                Keys::B => "b".into(),
            }
        }

        fn name(&self) -> &'static str {
            match self {
                Keys::A => "A",
                Keys::B => "B",
            }
        }
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        assert_eq!(key_fingerprint::<Keys>(), key_fingerprint::<Keys>());
        assert_eq!(
            key_fingerprint::<Keys>(),
            fingerprint_literals(RawKind::String, vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_fingerprint_depends_on_order_and_kind() {
        let ab = fingerprint_literals(RawKind::String, vec!["a".into(), "b".into()]);
        let ba = fingerprint_literals(RawKind::String, vec!["b".into(), "a".into()]);
        assert_ne!(ab, ba);

        let ints = fingerprint_literals(RawKind::Integer, vec![KeyLiteral::Int(0)]);
        let strs = fingerprint_literals(RawKind::String, vec![KeyLiteral::Int(0)]);
        assert_ne!(ints, strs);
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(KeyLiteral::from("txt").to_string(), "\"txt\"");
        assert_eq!(KeyLiteral::Int(7).to_string(), "7");
        assert_eq!(Keys::literals(), vec![KeyLiteral::from("a"), KeyLiteral::from("b")]);
    }
}
