use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use mpg_common::Rupees;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------      Gateway       ----------------------------------------------------------
/// The payment gateways the marketplace integrates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gateway {
    CcAvenue,
    PayU,
}

impl Display for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gateway::CcAvenue => write!(f, "CCAvenue"),
            Gateway::PayU => write!(f, "PayU"),
        }
    }
}

//--------------------------------------      OrderId       ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------       TxnId        ----------------------------------------------------------
/// The merchant-side identifier of a wallet top-up attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TxnId(pub String);

impl TxnId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TxnId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TxnId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for TxnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

//--------------------------------------   PaymentStatus    ----------------------------------------------------------
/// Lifecycle of an order payment. An order is created `Pending` before the buyer is redirected to the gateway, and
/// reaches exactly one of the terminal states when the callback is reconciled. It never re-enters `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Complete,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Complete => write!(f, "Complete"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Complete" => Ok(Self::Complete),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   WalletTxStatus   ----------------------------------------------------------
/// Lifecycle of a seller wallet top-up. Same terminal-state rules as [`PaymentStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum WalletTxStatus {
    Pending,
    Success,
    Failed,
}

impl WalletTxStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WalletTxStatus::Pending)
    }
}

impl Display for WalletTxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletTxStatus::Pending => write!(f, "Pending"),
            WalletTxStatus::Success => write!(f, "Success"),
            WalletTxStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for WalletTxStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid wallet transaction status: {s}"))),
        }
    }
}

//--------------------------------------    ProductKind     ----------------------------------------------------------
/// The four catalog shapes a line item can belong to.
///
/// Stock for an order line lives in exactly one of these, but the order item itself only carries the product
/// reference. The reconciliation engine resolves the owning entry by probing the kinds in [`ProductKind::FALLBACK_ORDER`],
/// which makes the lookup order an explicit policy rather than buried control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum ProductKind {
    Standard,
    Series,
    TmtSeries,
    SuperSeller,
}

impl ProductKind {
    pub const FALLBACK_ORDER: [ProductKind; 4] =
        [ProductKind::Standard, ProductKind::Series, ProductKind::TmtSeries, ProductKind::SuperSeller];
}

impl Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductKind::Standard => write!(f, "Standard"),
            ProductKind::Series => write!(f, "Series"),
            ProductKind::TmtSeries => write!(f, "TmtSeries"),
            ProductKind::SuperSeller => write!(f, "SuperSeller"),
        }
    }
}

impl FromStr for ProductKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Standard" => Ok(Self::Standard),
            "Series" => Ok(Self::Series),
            "TmtSeries" => Ok(Self::TmtSeries),
            "SuperSeller" => Ok(Self::SuperSeller),
            s => Err(ConversionError(format!("Invalid product kind: {s}"))),
        }
    }
}

//--------------------------------------       Order        ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    /// The buyer this order belongs to. Also keys the cart that is cleared on successful payment.
    pub customer_id: String,
    pub total_price: Rupees,
    pub payment_status: PaymentStatus,
    /// The gateway's status token, lowercased, verbatim ("success", "failure", "aborted", ...).
    pub online_payment_status: Option<String>,
    /// JSON-serialized [`GatewayRecord`] for audit. Written once, on the terminal transition.
    pub gateway_record: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     OrderItem      ----------------------------------------------------------
/// A single line of an order: which variant, from which fulfillment location, how many, at what price snapshot.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_ref: String,
    pub variant_id: String,
    pub location_id: String,
    pub quantity: i64,
    pub unit_price: Rupees,
}

//--------------------------------------  WalletTransaction ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: i64,
    pub txn_id: TxnId,
    pub seller_id: String,
    pub amount: Rupees,
    pub status: WalletTxStatus,
    pub tracking_id: Option<String>,
    pub payment_mode: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    SellerWallet    ----------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct SellerWallet {
    pub seller_id: String,
    pub balance: Rupees,
}

//--------------------------------------   GatewayRecord    ----------------------------------------------------------
/// The audit correlation blob stored against a transaction when its terminal transition is applied.
///
/// Only verified, extracted fields end up here; the raw wire payload is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayRecord {
    pub gateway: Gateway,
    pub status_message: String,
    pub tracking_id: Option<String>,
    pub amount: Option<Rupees>,
    pub payment_mode: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl GatewayRecord {
    pub fn as_json(&self) -> String {
        // Serialization of this struct cannot fail; fall back to an empty object rather than poisoning the
        // transition over an audit blob.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips() {
        for s in [PaymentStatus::Pending, PaymentStatus::Complete, PaymentStatus::Failed] {
            assert_eq!(s.to_string().parse::<PaymentStatus>().unwrap(), s);
        }
        for s in [WalletTxStatus::Pending, WalletTxStatus::Success, WalletTxStatus::Failed] {
            assert_eq!(s.to_string().parse::<WalletTxStatus>().unwrap(), s);
        }
        assert!("Paid".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Complete.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(!WalletTxStatus::Pending.is_terminal());
        assert!(WalletTxStatus::Success.is_terminal());
    }

    #[test]
    fn fallback_order_probes_standard_first() {
        assert_eq!(ProductKind::FALLBACK_ORDER[0], ProductKind::Standard);
        assert_eq!(ProductKind::FALLBACK_ORDER[1], ProductKind::Series);
        assert_eq!(ProductKind::FALLBACK_ORDER[2], ProductKind::TmtSeries);
        assert_eq!(ProductKind::FALLBACK_ORDER[3], ProductKind::SuperSeller);
    }

    #[test]
    fn gateway_record_serializes() {
        let record = GatewayRecord {
            gateway: Gateway::CcAvenue,
            status_message: "success".to_string(),
            tracking_id: Some("TRK1".to_string()),
            amount: Some(Rupees::from_rupees(999)),
            payment_mode: Some("Net Banking".to_string()),
            received_at: Utc::now(),
        };
        let json = record.as_json();
        let back: GatewayRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
