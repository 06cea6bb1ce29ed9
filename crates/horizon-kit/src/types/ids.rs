//! Identifier validation for query arguments.
//!
//! Builders accept numbers or strings for numeric ids, the same way amounts
//! accept either a typed value or a string parsed at runtime.

use crate::error::ParseIdError;

/// Length of a `G...` account id.
pub const ACCOUNT_ID_LEN: usize = 56;

/// Length of a hex transaction hash.
pub const TRANSACTION_HASH_LEN: usize = 64;

/// Conversion into a positive integer id (ledger sequences, operation ids).
///
/// # Example
///
/// ```
/// use horizon_kit::IntoPositiveId;
///
/// assert_eq!(100u32.into_positive_id().unwrap(), 100);
/// assert_eq!("100".into_positive_id().unwrap(), 100);
/// assert!("-1".into_positive_id().is_err());
/// assert!(0i64.into_positive_id().is_err());
/// ```
pub trait IntoPositiveId {
    /// Convert into a positive id.
    fn into_positive_id(self) -> Result<u64, ParseIdError>;
}

fn positive(value: u64) -> Result<u64, ParseIdError> {
    if value == 0 {
        return Err(ParseIdError::new("expected a positive integer, got 0"));
    }
    Ok(value)
}

impl IntoPositiveId for u64 {
    fn into_positive_id(self) -> Result<u64, ParseIdError> {
        positive(self)
    }
}

impl IntoPositiveId for u32 {
    fn into_positive_id(self) -> Result<u64, ParseIdError> {
        positive(u64::from(self))
    }
}

impl IntoPositiveId for i64 {
    fn into_positive_id(self) -> Result<u64, ParseIdError> {
        u64::try_from(self)
            .map_err(|_| ParseIdError::new(format!("expected a positive integer, got {}", self)))
            .and_then(positive)
    }
}

impl IntoPositiveId for i32 {
    fn into_positive_id(self) -> Result<u64, ParseIdError> {
        i64::from(self).into_positive_id()
    }
}

impl IntoPositiveId for &str {
    fn into_positive_id(self) -> Result<u64, ParseIdError> {
        if self.is_empty() || !self.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseIdError::new(format!(
                "expected a positive integer, got {:?}",
                self
            )));
        }
        self.parse::<u64>()
            .map_err(|e| ParseIdError::new(format!("{:?}: {}", self, e)))
            .and_then(positive)
    }
}

impl IntoPositiveId for String {
    fn into_positive_id(self) -> Result<u64, ParseIdError> {
        self.as_str().into_positive_id()
    }
}

impl IntoPositiveId for &String {
    fn into_positive_id(self) -> Result<u64, ParseIdError> {
        self.as_str().into_positive_id()
    }
}

/// Check a `G...` account id: 56 characters of the base32 alphabet.
///
/// Only the shape is checked; the embedded checksum is left to the server.
pub fn validate_account_id(id: &str) -> Result<(), ParseIdError> {
    if id.len() != ACCOUNT_ID_LEN {
        return Err(ParseIdError::new(format!(
            "account id must be {} characters, got {}",
            ACCOUNT_ID_LEN,
            id.len()
        )));
    }
    if !id.starts_with('G') {
        return Err(ParseIdError::new("account id must start with 'G'"));
    }
    if !id
        .bytes()
        .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
    {
        return Err(ParseIdError::new("account id must be base32 (A-Z, 2-7)"));
    }
    Ok(())
}

/// Check a transaction hash: 32 bytes, hex encoded.
pub fn validate_transaction_hash(hash: &str) -> Result<(), ParseIdError> {
    if hash.len() != TRANSACTION_HASH_LEN {
        return Err(ParseIdError::new(format!(
            "transaction hash must be {} hex characters, got {}",
            TRANSACTION_HASH_LEN,
            hash.len()
        )));
    }
    hex::decode(hash)
        .map(|_| ())
        .map_err(|e| ParseIdError::new(format!("transaction hash is not hex: {}", e)))
}
