use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Width in bytes of object and transaction identifiers.
pub const ID_LEN: usize = 8;

/// Prefix that marks the printable representation of an identifier.
pub const REPR_PREFIX: &str = "0x";

/// Opaque identifier naming one object in the store.
///
/// An `Oid` is eight raw bytes. Ordering and hashing follow the raw bytes,
/// which for this width is the same as ordering by the big-endian integer
/// value. The printable form (see [`Oid::repr`]) is `0x` followed by the
/// shortest even-length hex of that integer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Oid([u8; ID_LEN]);

impl Oid {
    /// Create an `Oid` from its raw bytes.
    pub const fn from_raw(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Create an `Oid` from an integer value.
    pub const fn from_u64(value: u64) -> Self {
        Self(value.to_be_bytes())
    }

    /// Create an `Oid` from a byte slice, which must be exactly eight bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        Ok(Self(fixed_bytes(bytes)?))
    }

    /// Parse the printable representation (`0x01`, `0x0a2f`, ...).
    ///
    /// The `0x` prefix is optional here; [`IntoOid`] relies on it to tell
    /// representations from raw bytes.
    pub fn from_repr(repr: &str) -> Result<Self, TypeError> {
        decode_repr(repr).map(Self)
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// The big-endian integer value.
    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Printable representation, e.g. `0x00` or `0x0a2f`.
    pub fn repr(&self) -> String {
        encode_repr(&self.0)
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.repr())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl FromStr for Oid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_repr(s)
    }
}

impl From<u64> for Oid {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<[u8; ID_LEN]> for Oid {
    fn from(bytes: [u8; ID_LEN]) -> Self {
        Self::from_raw(bytes)
    }
}

impl Serialize for Oid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.repr())
    }
}

impl<'de> Deserialize<'de> for Oid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = String::deserialize(deserializer)?;
        Self::from_repr(&repr).map_err(serde::de::Error::custom)
    }
}

/// Identifier of one committed transaction.
///
/// Shares the layout and printable form of [`Oid`]. Transaction ids grow
/// monotonically, so a newer store state always carries a larger `Tid`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Tid([u8; ID_LEN]);

impl Tid {
    /// The tid of a store that has never committed anything.
    pub const fn zero() -> Self {
        Self([0u8; ID_LEN])
    }

    pub const fn from_u64(value: u64) -> Self {
        Self(value.to_be_bytes())
    }

    pub fn from_repr(repr: &str) -> Result<Self, TypeError> {
        decode_repr(repr).map(Self)
    }

    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    pub fn repr(&self) -> String {
        encode_repr(&self.0)
    }
}

impl fmt::Debug for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tid({})", self.repr())
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl Serialize for Tid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.repr())
    }
}

impl<'de> Deserialize<'de> for Tid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = String::deserialize(deserializer)?;
        Self::from_repr(&repr).map_err(serde::de::Error::custom)
    }
}

/// Conversion of caller input (raw OID or printable representation) into an [`Oid`].
///
/// Text and byte inputs are auto-detected: anything starting with `0x` is
/// parsed as a representation, everything else must be the eight raw bytes.
pub trait IntoOid {
    fn into_oid(self) -> Result<Oid, TypeError>;
}

impl IntoOid for Oid {
    fn into_oid(self) -> Result<Oid, TypeError> {
        Ok(self)
    }
}

impl IntoOid for &Oid {
    fn into_oid(self) -> Result<Oid, TypeError> {
        Ok(*self)
    }
}

impl IntoOid for [u8; ID_LEN] {
    fn into_oid(self) -> Result<Oid, TypeError> {
        Ok(Oid(self))
    }
}

impl IntoOid for &[u8] {
    fn into_oid(self) -> Result<Oid, TypeError> {
        if self.starts_with(REPR_PREFIX.as_bytes()) {
            let repr = std::str::from_utf8(self)
                .map_err(|_| TypeError::InvalidRepr(String::from_utf8_lossy(self).into_owned()))?;
            Oid::from_repr(repr)
        } else {
            Oid::from_slice(self)
        }
    }
}

impl IntoOid for &str {
    fn into_oid(self) -> Result<Oid, TypeError> {
        self.as_bytes().into_oid()
    }
}

impl IntoOid for &String {
    fn into_oid(self) -> Result<Oid, TypeError> {
        self.as_str().into_oid()
    }
}

impl IntoOid for String {
    fn into_oid(self) -> Result<Oid, TypeError> {
        self.as_str().into_oid()
    }
}

fn fixed_bytes(bytes: &[u8]) -> Result<[u8; ID_LEN], TypeError> {
    if bytes.len() != ID_LEN {
        return Err(TypeError::InvalidLength {
            expected: ID_LEN,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; ID_LEN];
    arr.copy_from_slice(bytes);
    Ok(arr)
}

fn encode_repr(bytes: &[u8; ID_LEN]) -> String {
    let digits = format!("{:x}", u64::from_be_bytes(*bytes));
    if digits.len() % 2 == 1 {
        format!("{REPR_PREFIX}0{digits}")
    } else {
        format!("{REPR_PREFIX}{digits}")
    }
}

fn decode_repr(repr: &str) -> Result<[u8; ID_LEN], TypeError> {
    let digits = repr.strip_prefix(REPR_PREFIX).unwrap_or(repr);
    if digits.is_empty() || digits.len() > ID_LEN * 2 {
        return Err(TypeError::InvalidRepr(repr.to_string()));
    }
    let padded = format!("{digits:0>width$}", width = ID_LEN * 2);
    let bytes = hex::decode(&padded).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    fixed_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_is_minimal_even_length() {
        assert_eq!(Oid::from_u64(0).repr(), "0x00");
        assert_eq!(Oid::from_u64(1).repr(), "0x01");
        assert_eq!(Oid::from_u64(0xa2f).repr(), "0x0a2f");
        assert_eq!(Oid::from_u64(0xaabb).repr(), "0xaabb");
        assert_eq!(Oid::from_u64(u64::MAX).repr(), "0xffffffffffffffff");
    }

    #[test]
    fn parse_accepts_case_and_odd_lengths() {
        assert_eq!(Oid::from_repr("0xAA").unwrap(), Oid::from_u64(0xaa));
        assert_eq!(Oid::from_repr("0xa2f").unwrap(), Oid::from_u64(0xa2f));
        assert_eq!(Oid::from_repr("01").unwrap(), Oid::from_u64(1));
        assert_eq!("0x0a2f".parse::<Oid>().unwrap(), Oid::from_u64(0xa2f));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(Oid::from_repr("0x"), Err(TypeError::InvalidRepr(_))));
        assert!(matches!(
            Oid::from_repr("0x11223344556677889"),
            Err(TypeError::InvalidRepr(_))
        ));
        assert!(matches!(Oid::from_repr("0xzz"), Err(TypeError::InvalidHex(_))));
    }

    #[test]
    fn raw_bytes_must_be_eight_long() {
        let err = Oid::from_slice(&[1, 2, 3]).unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 8, actual: 3 });
        let oid = Oid::from_slice(&[0, 0, 0, 0, 0, 0, 0, 7]).unwrap();
        assert_eq!(oid.as_u64(), 7);
        assert_eq!(Oid::from_raw([0, 0, 0, 0, 0, 0, 0, 7]), oid);
        assert_eq!(Oid::from([0, 0, 0, 0, 0, 0, 0, 7]), oid);
    }

    #[test]
    fn into_oid_auto_detects_representation() {
        let expected = Oid::from_u64(0x2a);
        assert_eq!("0x2a".into_oid().unwrap(), expected);
        assert_eq!(String::from("0x2a").into_oid().unwrap(), expected);
        assert_eq!(b"0x2a".as_slice().into_oid().unwrap(), expected);
        assert_eq!(expected.as_bytes().as_slice().into_oid().unwrap(), expected);
        assert_eq!(expected.into_oid().unwrap(), expected);
    }

    #[test]
    fn ordering_follows_integer_value() {
        assert!(Oid::from_u64(0xff) < Oid::from_u64(0x100));
        assert!(Tid::from_u64(1) > Tid::zero());
    }

    #[test]
    fn serde_uses_repr() {
        let oid = Oid::from_u64(0x0a2f);
        let json = serde_json::to_string(&oid).unwrap();
        assert_eq!(json, "\"0x0a2f\"");
        let parsed: Oid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, oid);

        let tid: Tid = serde_json::from_str("\"0x03\"").unwrap();
        assert_eq!(tid, Tid::from_u64(3));
    }

    #[test]
    fn debug_is_compact() {
        assert_eq!(format!("{:?}", Oid::from_u64(1)), "Oid(0x01)");
        assert_eq!(format!("{}", Tid::from_u64(0x10)), "0x10");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn repr_parses_back(value in any::<u64>()) {
                let oid = Oid::from_u64(value);
                prop_assert_eq!(Oid::from_repr(&oid.repr()).unwrap(), oid);
                prop_assert!(oid.repr().starts_with(REPR_PREFIX));
                prop_assert_eq!(oid.repr().len() % 2, 0);
            }
        }
    }
}
