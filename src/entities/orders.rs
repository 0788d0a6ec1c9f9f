use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter, FromJsonQueryResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Delivery progress of an order.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Preparing")]
    Preparing,
    #[serde(rename = "Out for Delivery")]
    #[sea_orm(string_value = "Out for Delivery")]
    OutForDelivery,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Preparing => write!(f, "Preparing"),
            OrderStatus::OutForDelivery => write!(f, "Out for Delivery"),
            OrderStatus::Delivered => write!(f, "Delivered"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Financial reconciliation state, independent of [`OrderStatus`].
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[serde(rename = "Pending Online Verification")]
    #[sea_orm(string_value = "Pending Online Verification")]
    PendingOnlineVerification,
    #[serde(rename = "BILL PAID ONLINE")]
    #[sea_orm(string_value = "BILL PAID ONLINE")]
    BillPaidOnline,
    #[serde(rename = "PAYMENT REJECTED")]
    #[sea_orm(string_value = "PAYMENT REJECTED")]
    PaymentRejected,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::PendingOnlineVerification => write!(f, "Pending Online Verification"),
            PaymentStatus::BillPaidOnline => write!(f, "BILL PAID ONLINE"),
            PaymentStatus::PaymentRejected => write!(f, "PAYMENT REJECTED"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
pub enum PaymentMethod {
    /// Cash on delivery
    #[serde(rename = "COD")]
    #[sea_orm(string_value = "COD")]
    Cod,
    #[sea_orm(string_value = "Online")]
    Online,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cod => write!(f, "Cash on Delivery"),
            PaymentMethod::Online => write!(f, "Online"),
        }
    }
}

/// Snapshot of a menu item at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    /// Menu item reference
    pub food: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl LineItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct LineItems(pub Vec<LineItem>);

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<String>,
    pub is_guest: bool,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub chef_id: Option<Uuid>,
    #[sea_orm(column_type = "Json")]
    pub items: LineItems,
    pub delivery_street: String,
    pub delivery_city: String,
    pub delivery_phone: Option<String>,
    #[sea_orm(column_type = "Double")]
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_screenshot: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub paid_amount: Option<f64>,
    pub payment_verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chefs::Entity",
        from = "Column::ChefId",
        to = "super::chefs::Column::Id"
    )]
    Chef,
}

impl Related<super::chefs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chef.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::OutForDelivery).unwrap(),
            "\"Out for Delivery\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::BillPaidOnline).unwrap(),
            "\"BILL PAID ONLINE\""
        );
        assert_eq!(
            serde_json::from_str::<PaymentMethod>("\"COD\"").unwrap(),
            PaymentMethod::Cod
        );
        assert!(serde_json::from_str::<OrderStatus>("\"Shipped\"").is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::OutForDelivery.is_terminal());
    }

    #[test]
    fn test_line_total() {
        let item = LineItem {
            food: "f1".into(),
            name: "Biryani".into(),
            price: 350.0,
            quantity: 2,
            image: None,
        };
        assert_eq!(item.line_total(), 700.0);
    }
}
