//! Operation records.
//!
//! Operations are the polymorphic family: the `type_i` field selects one of
//! a closed set of [`OperationKind`]s and each kind has its own shape. The
//! registry is the `match` in [`OperationRecord::decode`](crate::Record::decode),
//! which the compiler keeps exhaustive.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as, with_prefix};

use super::record::integer_discriminant;
use super::{Asset, Cursor, Discriminant, Links, Price, Record, TransactionRecord, decode_fields};
use crate::error::{DecodeError, Error};

with_prefix!(prefix_source "source_");
with_prefix!(prefix_buying "buying_");
with_prefix!(prefix_selling "selling_");

// ============================================================================
// Kinds
// ============================================================================

/// Every operation kind this client can decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    CreateAccount,
    Payment,
    PathPaymentStrictReceive,
    ManageSellOffer,
    CreatePassiveSellOffer,
    SetOptions,
    ChangeTrust,
    AllowTrust,
    AccountMerge,
    Inflation,
    ManageData,
    BumpSequence,
    ManageBuyOffer,
    PathPaymentStrictSend,
}

impl OperationKind {
    /// All kinds, ordered by type code.
    pub const ALL: [OperationKind; 14] = [
        OperationKind::CreateAccount,
        OperationKind::Payment,
        OperationKind::PathPaymentStrictReceive,
        OperationKind::ManageSellOffer,
        OperationKind::CreatePassiveSellOffer,
        OperationKind::SetOptions,
        OperationKind::ChangeTrust,
        OperationKind::AllowTrust,
        OperationKind::AccountMerge,
        OperationKind::Inflation,
        OperationKind::ManageData,
        OperationKind::BumpSequence,
        OperationKind::ManageBuyOffer,
        OperationKind::PathPaymentStrictSend,
    ];

    /// The `type_i` code.
    pub fn code(&self) -> i64 {
        match self {
            OperationKind::CreateAccount => 0,
            OperationKind::Payment => 1,
            OperationKind::PathPaymentStrictReceive => 2,
            OperationKind::ManageSellOffer => 3,
            OperationKind::CreatePassiveSellOffer => 4,
            OperationKind::SetOptions => 5,
            OperationKind::ChangeTrust => 6,
            OperationKind::AllowTrust => 7,
            OperationKind::AccountMerge => 8,
            OperationKind::Inflation => 9,
            OperationKind::ManageData => 10,
            OperationKind::BumpSequence => 11,
            OperationKind::ManageBuyOffer => 12,
            OperationKind::PathPaymentStrictSend => 13,
        }
    }

    /// Resolve a `type_i` code.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// The `type` name Horizon uses.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::CreateAccount => "create_account",
            OperationKind::Payment => "payment",
            OperationKind::PathPaymentStrictReceive => "path_payment_strict_receive",
            OperationKind::ManageSellOffer => "manage_sell_offer",
            OperationKind::CreatePassiveSellOffer => "create_passive_sell_offer",
            OperationKind::SetOptions => "set_options",
            OperationKind::ChangeTrust => "change_trust",
            OperationKind::AllowTrust => "allow_trust",
            OperationKind::AccountMerge => "account_merge",
            OperationKind::Inflation => "inflation",
            OperationKind::ManageData => "manage_data",
            OperationKind::BumpSequence => "bump_sequence",
            OperationKind::ManageBuyOffer => "manage_buy_offer",
            OperationKind::PathPaymentStrictSend => "path_payment_strict_send",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Shared fields
// ============================================================================

/// Fields every operation carries.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct OperationBase {
    pub id: String,
    pub paging_token: Cursor,
    /// Absent on servers that predate failed-transaction ingestion.
    #[serde(default)]
    pub transaction_successful: Option<bool>,
    pub source_account: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub type_i: i64,
    pub created_at: String,
    pub transaction_hash: String,
    /// Present when the request asked for `join=transactions`.
    #[serde(default)]
    pub transaction: Option<Box<TransactionRecord>>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

// ============================================================================
// Variants
// ============================================================================

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CreateAccountOperation {
    #[serde(flatten)]
    pub base: OperationBase,
    pub starting_balance: String,
    pub funder: String,
    pub account: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PaymentOperation {
    #[serde(flatten)]
    pub base: OperationBase,
    #[serde(flatten)]
    pub asset: Asset,
    pub from: String,
    pub to: String,
    pub amount: String,
}

/// Shape shared by both path payment kinds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PathPaymentOperation {
    #[serde(flatten)]
    pub base: OperationBase,
    /// Destination asset.
    #[serde(flatten)]
    pub asset: Asset,
    #[serde(flatten, with = "prefix_source")]
    pub source_asset: Asset,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub source_amount: String,
    /// Only on strict-receive payments.
    #[serde(default)]
    pub source_max: Option<String>,
    /// Only on strict-send payments.
    #[serde(default)]
    pub destination_min: Option<String>,
    #[serde(default)]
    pub path: Vec<Asset>,
}

/// Shape shared by sell, buy and passive sell offers.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ManageOfferOperation {
    #[serde(flatten)]
    pub base: OperationBase,
    /// Newer servers send the id as a string, older ones as a number.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub offer_id: Option<i64>,
    pub amount: String,
    pub price: String,
    pub price_r: Price,
    #[serde(flatten, with = "prefix_buying")]
    pub buying: Asset,
    #[serde(flatten, with = "prefix_selling")]
    pub selling: Asset,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SetOptionsOperation {
    #[serde(flatten)]
    pub base: OperationBase,
    #[serde(default)]
    pub signer_key: Option<String>,
    #[serde(default)]
    pub signer_weight: Option<u8>,
    #[serde(default)]
    pub master_key_weight: Option<u8>,
    #[serde(default)]
    pub low_threshold: Option<u8>,
    #[serde(default)]
    pub med_threshold: Option<u8>,
    #[serde(default)]
    pub high_threshold: Option<u8>,
    #[serde(default)]
    pub home_domain: Option<String>,
    #[serde(default)]
    pub inflation_dest: Option<String>,
    #[serde(default)]
    pub set_flags: Vec<u32>,
    #[serde(default)]
    pub set_flags_s: Vec<String>,
    #[serde(default)]
    pub clear_flags: Vec<u32>,
    #[serde(default)]
    pub clear_flags_s: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChangeTrustOperation {
    #[serde(flatten)]
    pub base: OperationBase,
    #[serde(flatten)]
    pub asset: Asset,
    pub limit: String,
    pub trustor: String,
    #[serde(default)]
    pub trustee: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AllowTrustOperation {
    #[serde(flatten)]
    pub base: OperationBase,
    #[serde(flatten)]
    pub asset: Asset,
    pub trustor: String,
    pub trustee: String,
    pub authorize: bool,
    #[serde(default)]
    pub authorize_to_maintain_liabilities: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AccountMergeOperation {
    #[serde(flatten)]
    pub base: OperationBase,
    pub account: String,
    pub into: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct InflationOperation {
    #[serde(flatten)]
    pub base: OperationBase,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ManageDataOperation {
    #[serde(flatten)]
    pub base: OperationBase,
    pub name: String,
    /// Base64 value; `None` when the entry is being deleted.
    #[serde(default)]
    pub value: Option<String>,
}

impl ManageDataOperation {
    /// The decoded value bytes.
    pub fn value_bytes(&self) -> Result<Option<Vec<u8>>, Error> {
        self.value
            .as_deref()
            .map(|value| STANDARD.decode(value))
            .transpose()
            .map_err(Error::from)
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BumpSequenceOperation {
    #[serde(flatten)]
    pub base: OperationBase,
    #[serde_as(as = "DisplayFromStr")]
    pub bump_to: i64,
}

// ============================================================================
// Sum type
// ============================================================================

/// A decoded operation of any known kind.
#[derive(Clone, Debug, PartialEq)]
pub enum OperationRecord {
    CreateAccount(CreateAccountOperation),
    Payment(PaymentOperation),
    PathPaymentStrictReceive(PathPaymentOperation),
    ManageSellOffer(ManageOfferOperation),
    CreatePassiveSellOffer(ManageOfferOperation),
    SetOptions(SetOptionsOperation),
    ChangeTrust(ChangeTrustOperation),
    AllowTrust(AllowTrustOperation),
    AccountMerge(AccountMergeOperation),
    Inflation(InflationOperation),
    ManageData(ManageDataOperation),
    BumpSequence(BumpSequenceOperation),
    ManageBuyOffer(ManageOfferOperation),
    PathPaymentStrictSend(PathPaymentOperation),
}

impl OperationRecord {
    /// The kind of this operation.
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRecord::CreateAccount(_) => OperationKind::CreateAccount,
            OperationRecord::Payment(_) => OperationKind::Payment,
            OperationRecord::PathPaymentStrictReceive(_) => OperationKind::PathPaymentStrictReceive,
            OperationRecord::ManageSellOffer(_) => OperationKind::ManageSellOffer,
            OperationRecord::CreatePassiveSellOffer(_) => OperationKind::CreatePassiveSellOffer,
            OperationRecord::SetOptions(_) => OperationKind::SetOptions,
            OperationRecord::ChangeTrust(_) => OperationKind::ChangeTrust,
            OperationRecord::AllowTrust(_) => OperationKind::AllowTrust,
            OperationRecord::AccountMerge(_) => OperationKind::AccountMerge,
            OperationRecord::Inflation(_) => OperationKind::Inflation,
            OperationRecord::ManageData(_) => OperationKind::ManageData,
            OperationRecord::BumpSequence(_) => OperationKind::BumpSequence,
            OperationRecord::ManageBuyOffer(_) => OperationKind::ManageBuyOffer,
            OperationRecord::PathPaymentStrictSend(_) => OperationKind::PathPaymentStrictSend,
        }
    }

    /// Fields common to every kind.
    pub fn base(&self) -> &OperationBase {
        match self {
            OperationRecord::CreateAccount(op) => &op.base,
            OperationRecord::Payment(op) => &op.base,
            OperationRecord::PathPaymentStrictReceive(op) => &op.base,
            OperationRecord::ManageSellOffer(op) => &op.base,
            OperationRecord::CreatePassiveSellOffer(op) => &op.base,
            OperationRecord::SetOptions(op) => &op.base,
            OperationRecord::ChangeTrust(op) => &op.base,
            OperationRecord::AllowTrust(op) => &op.base,
            OperationRecord::AccountMerge(op) => &op.base,
            OperationRecord::Inflation(op) => &op.base,
            OperationRecord::ManageData(op) => &op.base,
            OperationRecord::BumpSequence(op) => &op.base,
            OperationRecord::ManageBuyOffer(op) => &op.base,
            OperationRecord::PathPaymentStrictSend(op) => &op.base,
        }
    }

    /// Operation id.
    pub fn id(&self) -> &str {
        &self.base().id
    }

    /// Hash of the containing transaction.
    pub fn transaction_hash(&self) -> &str {
        &self.base().transaction_hash
    }
}

impl Record for OperationRecord {
    const KIND: &'static str = "operation";

    fn decode(raw: Value) -> Result<Self, DecodeError> {
        let code = integer_discriminant(Self::KIND, &raw, "type_i")?;
        let kind = OperationKind::from_code(code).ok_or(DecodeError::UnsupportedVariant {
            family: Self::KIND,
            field: "type_i",
            code: Discriminant::Int(code),
        })?;

        let name = kind.as_str();
        let record = match kind {
            OperationKind::CreateAccount => OperationRecord::CreateAccount(decode_fields(name, raw)?),
            OperationKind::Payment => OperationRecord::Payment(decode_fields(name, raw)?),
            OperationKind::PathPaymentStrictReceive => {
                OperationRecord::PathPaymentStrictReceive(decode_fields(name, raw)?)
            }
            OperationKind::ManageSellOffer => {
                OperationRecord::ManageSellOffer(decode_fields(name, raw)?)
            }
            OperationKind::CreatePassiveSellOffer => {
                OperationRecord::CreatePassiveSellOffer(decode_fields(name, raw)?)
            }
            OperationKind::SetOptions => OperationRecord::SetOptions(decode_fields(name, raw)?),
            OperationKind::ChangeTrust => OperationRecord::ChangeTrust(decode_fields(name, raw)?),
            OperationKind::AllowTrust => OperationRecord::AllowTrust(decode_fields(name, raw)?),
            OperationKind::AccountMerge => OperationRecord::AccountMerge(decode_fields(name, raw)?),
            OperationKind::Inflation => OperationRecord::Inflation(decode_fields(name, raw)?),
            OperationKind::ManageData => OperationRecord::ManageData(decode_fields(name, raw)?),
            OperationKind::BumpSequence => OperationRecord::BumpSequence(decode_fields(name, raw)?),
            OperationKind::ManageBuyOffer => {
                OperationRecord::ManageBuyOffer(decode_fields(name, raw)?)
            }
            OperationKind::PathPaymentStrictSend => {
                OperationRecord::PathPaymentStrictSend(decode_fields(name, raw)?)
            }
        };
        Ok(record)
    }

    fn paging_token(&self) -> &Cursor {
        &self.base().paging_token
    }
}
