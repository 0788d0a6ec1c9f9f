use crate::entities::{LineItem, OrderStatus, PaymentMethod, PaymentStatus, order_entity};
use crate::error::{AppError, AppResult};
use crate::utils::{validate_email, validate_phone};
use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Multipart checkouts send nested fields as JSON-encoded strings; JSON checkouts send them
/// inline. Both shapes land on the same type here.
fn json_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::String(raw) => serde_json::from_str(&raw).map_err(D::Error::custom),
        other => serde_json::from_value(other).map_err(D::Error::custom),
    }
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("totalAmount is out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("totalAmount is not a number: {s}"))),
        other => Err(D::Error::custom(format!(
            "totalAmount must be a number, got {other}"
        ))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(deserialize_with = "json_or_string")]
    pub items: Vec<LineItem>,
    #[serde(deserialize_with = "json_or_string")]
    pub delivery_address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    /// Stored as declared; the server does not recompute it.
    #[serde(deserialize_with = "number_or_string")]
    pub total_amount: f64,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// Kitchen the order is placed with; defaults to the platform admin kitchen.
    #[serde(default)]
    pub chef: Option<Uuid>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl CreateOrderRequest {
    pub fn validate(&self, is_guest: bool) -> AppResult<()> {
        if self.items.is_empty() {
            return Err(AppError::ValidationError(
                "Order must contain at least one item".to_string(),
            ));
        }
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(AppError::ValidationError("Item name is required".to_string()));
            }
            if item.quantity == 0 {
                return Err(AppError::ValidationError(format!(
                    "Quantity for {} must be at least 1",
                    item.name
                )));
            }
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(AppError::ValidationError(format!(
                    "Invalid price for {}",
                    item.name
                )));
            }
        }

        if self.delivery_address.street.trim().is_empty()
            || self.delivery_address.city.trim().is_empty()
        {
            return Err(AppError::ValidationError(
                "Delivery street and city are required".to_string(),
            ));
        }

        if !self.total_amount.is_finite() || self.total_amount < 0.0 {
            return Err(AppError::ValidationError(
                "totalAmount must be a non-negative number".to_string(),
            ));
        }

        if is_guest && (non_blank(&self.customer_name).is_none() || self.contact_phone().is_none())
        {
            return Err(AppError::ValidationError(
                "Guest orders require customerName and customerPhone".to_string(),
            ));
        }

        if let Some(email) = non_blank(&self.customer_email) {
            validate_email(email)?;
        }
        if let Some(phone) = self.contact_phone() {
            validate_phone(phone)?;
        }

        Ok(())
    }

    /// Customer phone, falling back to the delivery address phone.
    pub fn contact_phone(&self) -> Option<&str> {
        non_blank(&self.customer_phone).or_else(|| non_blank(&self.delivery_address.phone))
    }

    pub fn items_subtotal(&self) -> f64 {
        self.items.iter().map(LineItem::line_total).sum()
    }
}

/// Body of `PUT /api/order/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

impl UpdateOrderStatusRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.status.is_none() && self.payment_status.is_none() {
            return Err(AppError::ValidationError(
                "Nothing to update: provide status or paymentStatus".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body of `PUT /api/order/verify/{id}`. `paidAmount` may be a number or a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    #[schema(value_type = f64, example = 500)]
    pub paid_amount: Option<Value>,
}

impl VerifyPaymentRequest {
    pub fn parse_paid_amount(&self) -> AppResult<f64> {
        let invalid = || AppError::ValidationError("Valid paid amount is required".to_string());
        let amount = match &self.paid_amount {
            Some(Value::Number(n)) => n.as_f64().ok_or_else(invalid)?,
            Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };
        if !amount.is_finite() || amount <= 0.0 {
            return Err(invalid());
        }
        Ok(amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    /// Registered user reference; always absent for guest orders.
    pub user: Option<String>,
    pub is_guest: bool,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub chef: Option<Uuid>,
    pub items: Vec<LineItem>,
    pub delivery_address: DeliveryAddress,
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_screenshot: Option<String>,
    pub paid_amount: Option<f64>,
    pub payment_verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<order_entity::Model> for OrderResponse {
    fn from(m: order_entity::Model) -> Self {
        Self {
            id: m.id,
            user: if m.is_guest { None } else { m.user_id },
            is_guest: m.is_guest,
            customer_name: m.customer_name,
            customer_email: m.customer_email,
            customer_phone: m.customer_phone,
            chef: m.chef_id,
            items: m.items.0,
            delivery_address: DeliveryAddress {
                street: m.delivery_street,
                city: m.delivery_city,
                phone: m.delivery_phone,
            },
            total_amount: m.total_amount,
            payment_method: m.payment_method,
            payment_status: m.payment_status,
            payment_screenshot: m.payment_screenshot,
            paid_amount: m.paid_amount,
            payment_verified_at: m.payment_verified_at,
            verified_by: m.verified_by,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderApiResponse {
    pub success: bool,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListApiResponse {
    pub success: bool,
    pub orders: Vec<OrderResponse>,
}
