// crates/ballast-core/src/identity.rs
//
// Account identity for the Ballast Protocol.
//
// Accounts are 32-byte keys assigned by the host environment. The all-zero
// key is the burn/mint sentinel and is rejected as a party to any transfer
// or stake. Identities serialize as lowercase hex strings so they can key
// JSON maps in persisted vault snapshots.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A 32-byte account key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// The zero address: mint/burn sentinel, never a valid party.
    pub const ZERO: AccountId = AccountId([0u8; 32]);

    /// True if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(de::Error::custom)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| de::Error::custom("account id must be 32 bytes"))?;
        Ok(AccountId(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sentinel() {
        assert!(AccountId::ZERO.is_zero());
        assert!(!AccountId([1u8; 32]).is_zero());
    }

    #[test]
    fn test_display_is_hex() {
        let id = AccountId([0xab; 32]);
        assert_eq!(format!("{}", id), "ab".repeat(32));
    }

    #[test]
    fn test_serde_round_trip_as_map_key() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(AccountId([7u8; 32]), 42u64);
        let json = serde_json::to_string(&map).unwrap();
        let back: HashMap<AccountId, u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&AccountId([7u8; 32])), Some(&42));
    }

    #[test]
    fn test_deserialize_rejects_wrong_length() {
        let err: Result<AccountId, _> = serde_json::from_str("\"abcd\"");
        assert!(err.is_err());
    }
}
