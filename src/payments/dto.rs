use serde::Deserialize;

use super::repo_types::{PaymentMethod, PaymentStatus, PaymentType};

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(alias = "tipo_pago")]
    pub payment_type: PaymentType,
    #[serde(alias = "monto", alias = "cantidad")]
    pub amount: f64,
    #[serde(alias = "metodo_pago")]
    pub method: PaymentMethod,
    #[serde(default, alias = "estado_pago")]
    pub status: PaymentStatus,
    #[serde(default, alias = "recibo", alias = "comprobante")]
    pub receipt: Option<String>,
    #[serde(default, alias = "nota")]
    pub note: Option<String>,
}
