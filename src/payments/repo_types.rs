use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    #[serde(alias = "seña")]
    Deposit,
    #[serde(alias = "pago_completo")]
    FullPayment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[serde(alias = "efectivo")]
    Cash,
    #[serde(alias = "transferencia")]
    Transfer,
    #[serde(alias = "tarjeta_debito")]
    DebitCard,
    #[serde(alias = "tarjeta_credito")]
    CreditCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    #[serde(alias = "pendiente")]
    Pending,
    #[serde(alias = "pagado")]
    Paid,
    #[serde(alias = "reembolsado")]
    Refunded,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Deposit => "deposit",
            PaymentType::FullPayment => "full_payment",
        }
    }
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::CreditCard => "credit_card",
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl TryFrom<&str> for PaymentType {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "deposit" => Ok(PaymentType::Deposit),
            "full_payment" => Ok(PaymentType::FullPayment),
            other => anyhow::bail!("unknown payment type {:?}", other),
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "transfer" => Ok(PaymentMethod::Transfer),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "credit_card" => Ok(PaymentMethod::CreditCard),
            other => anyhow::bail!("unknown payment method {:?}", other),
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => anyhow::bail!("unknown payment status {:?}", other),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payment_type: String,
    pub amount: f64,
    pub method: String,
    pub status: String,
    pub receipt: Option<String>,
    pub note: Option<String>,
    pub paid_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payment_type: PaymentType,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub receipt: Option<String>,
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub paid_at: OffsetDateTime,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = anyhow::Error;

    fn try_from(r: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            payment_type: PaymentType::try_from(r.payment_type.as_str())?,
            method: PaymentMethod::try_from(r.method.as_str())?,
            status: PaymentStatus::try_from(r.status.as_str())?,
            id: r.id,
            booking_id: r.booking_id,
            amount: r.amount,
            receipt: r.receipt,
            note: r.note,
            paid_at: r.paid_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_storage_names() {
        for t in [PaymentType::Deposit, PaymentType::FullPayment] {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
            assert_eq!(PaymentType::try_from(t.as_str()).unwrap(), t);
        }
        for m in [
            PaymentMethod::Cash,
            PaymentMethod::Transfer,
            PaymentMethod::DebitCard,
            PaymentMethod::CreditCard,
        ] {
            let json = serde_json::to_string(&m).unwrap();
            assert_eq!(json, format!("\"{}\"", m.as_str()));
        }
    }

    #[test]
    fn accepts_spanish_aliases() {
        let t: PaymentType = serde_json::from_str("\"seña\"").unwrap();
        assert_eq!(t, PaymentType::Deposit);
        let m: PaymentMethod = serde_json::from_str("\"tarjeta_credito\"").unwrap();
        assert_eq!(m, PaymentMethod::CreditCard);
    }

    #[test]
    fn unknown_stored_value_is_an_error() {
        assert!(PaymentStatus::try_from("lost").is_err());
    }
}
