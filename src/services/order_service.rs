use crate::entities::{LineItems, OrderStatus, PaymentMethod, PaymentStatus, order_entity as order};
use crate::error::{AppError, AppResult};
use crate::external::{EmailMessage, MailService};
use crate::middlewares::{Actor, customer_identity, verifier_identity};
use crate::models::*;
use crate::services::{ChefService, OrderEvent, OrderNotifier};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// Order lifecycle: checkout, lookups, fulfillment and payment transitions.
///
/// Mutations are single-row updates without a version check, so concurrent writers on the
/// same order resolve as last write wins.
#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
    chef_service: ChefService,
    notifier: OrderNotifier,
    mail_service: MailService,
    delivery_fee: f64,
}

impl OrderService {
    pub fn new(
        pool: DatabaseConnection,
        chef_service: ChefService,
        notifier: OrderNotifier,
        mail_service: MailService,
        delivery_fee: f64,
    ) -> Self {
        Self {
            pool,
            chef_service,
            notifier,
            mail_service,
            delivery_fee,
        }
    }

    /// Persists one checkout. Broadcast and confirmation email run after the write and
    /// never fail the call.
    pub async fn create_order(
        &self,
        actor: Option<&Actor>,
        req: CreateOrderRequest,
        payment_screenshot: Option<String>,
    ) -> AppResult<OrderResponse> {
        let user_id = customer_identity(actor).map(str::to_string);
        let is_guest = user_id.is_none();
        req.validate(is_guest)?;

        // Proof of payment only means something for online payments
        let payment_screenshot = match req.payment_method {
            PaymentMethod::Online => payment_screenshot,
            PaymentMethod::Cod => None,
        };
        let payment_status = initial_payment_status(req.payment_method, payment_screenshot.is_some());

        let chef_id = match req.chef {
            Some(id) => Some(
                self.chef_service
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Chef not found".to_string()))?
                    .id,
            ),
            None => self.chef_service.find_platform_admin().await?.map(|c| c.id),
        };

        let expected_total = req.items_subtotal() + self.delivery_fee;
        if (expected_total - req.total_amount).abs() > 0.005 {
            log::warn!(
                "Declared totalAmount {} differs from items + delivery fee {}",
                req.total_amount,
                expected_total
            );
        }

        let contact_phone = req.contact_phone().map(str::to_string);
        let now = Utc::now();
        let model = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            is_guest: Set(is_guest),
            customer_name: Set(req.customer_name),
            customer_email: Set(req.customer_email),
            customer_phone: Set(contact_phone),
            chef_id: Set(chef_id),
            items: Set(LineItems(req.items)),
            delivery_street: Set(req.delivery_address.street),
            delivery_city: Set(req.delivery_address.city),
            delivery_phone: Set(req.delivery_address.phone),
            total_amount: Set(req.total_amount),
            payment_method: Set(req.payment_method),
            payment_status: Set(payment_status),
            payment_screenshot: Set(payment_screenshot),
            paid_amount: Set(None),
            payment_verified_at: Set(None),
            verified_by: Set(None),
            status: Set(OrderStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await?;

        let created = OrderResponse::from(model);
        log::info!(
            "Order {} created (guest: {}, payment: {}, status: {})",
            created.id,
            created.is_guest,
            created.payment_method,
            created.payment_status
        );

        self.notifier
            .publish(OrderEvent::NewOrder(Arc::new(created.clone())));
        self.dispatch_confirmation_email(&created);

        Ok(created)
    }

    fn dispatch_confirmation_email(&self, created: &OrderResponse) {
        let Some(message) = confirmation_email(created) else {
            return;
        };
        let mail_service = self.mail_service.clone();
        let order_id = created.id;
        tokio::spawn(async move {
            match mail_service.send_email(&message).await {
                Ok(()) => log::info!("Order confirmation email sent for order {order_id}"),
                Err(e) => log::error!("Order confirmation email failed for order {order_id}: {e}"),
            }
        });
    }

    /// Orders of the calling customer, newest first. Guests and admin sessions get none.
    pub async fn get_my_orders(&self, actor: Option<&Actor>) -> AppResult<Vec<OrderResponse>> {
        let Some(user_id) = customer_identity(actor) else {
            return Ok(Vec::new());
        };

        let orders = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        Ok(orders.into_iter().map(OrderResponse::from).collect())
    }

    /// Orders of the caller's kitchen. Admins see the platform admin kitchen.
    pub async fn get_chef_orders(&self, actor: &Actor) -> AppResult<Vec<OrderResponse>> {
        let chef_id = if actor.is_admin() {
            match self.chef_service.find_platform_admin().await? {
                Some(kitchen) => kitchen.id,
                None => return Ok(Vec::new()),
            }
        } else {
            self.chef_service
                .find_by_user(&actor.id)
                .await?
                .ok_or_else(|| AppError::NotFound("Chef not found".to_string()))?
                .id
        };

        let orders = order::Entity::find()
            .filter(order::Column::ChefId.eq(chef_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        Ok(orders.into_iter().map(OrderResponse::from).collect())
    }

    pub async fn get_all_orders(&self) -> AppResult<Vec<OrderResponse>> {
        let orders = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        Ok(orders.into_iter().map(OrderResponse::from).collect())
    }

    pub async fn get_order(&self, raw_id: &str) -> AppResult<OrderResponse> {
        let id = parse_order_id(raw_id)?;
        order::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .map(OrderResponse::from)
            .ok_or_else(order_not_found)
    }

    /// Sets the requested fields as given. Any status may follow any other.
    pub async fn update_order_status(
        &self,
        raw_id: &str,
        req: UpdateOrderStatusRequest,
    ) -> AppResult<OrderResponse> {
        req.validate()?;
        let id = parse_order_id(raw_id)?;

        let mut am = order::ActiveModel {
            id: Set(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(status) = req.status {
            am.status = Set(status);
        }
        if let Some(payment_status) = req.payment_status {
            am.payment_status = Set(payment_status);
        }

        let updated = self.apply(am).await?;
        log::info!(
            "Order {} updated: status={}, paymentStatus={}",
            updated.id,
            updated.status,
            updated.payment_status
        );
        if updated.status.is_terminal() {
            log::info!("Order {} is closed ({})", updated.id, updated.status);
        }
        Ok(updated)
    }

    /// Marks the payment as received. Re-verifying overwrites the previous verification.
    pub async fn verify_payment(
        &self,
        raw_id: &str,
        req: VerifyPaymentRequest,
        actor: &Actor,
    ) -> AppResult<OrderResponse> {
        let paid_amount = req.parse_paid_amount()?;
        let id = parse_order_id(raw_id)?;
        let now = Utc::now();

        let am = order::ActiveModel {
            id: Set(id),
            payment_status: Set(PaymentStatus::BillPaidOnline),
            paid_amount: Set(Some(paid_amount)),
            payment_verified_at: Set(Some(now)),
            verified_by: Set(Some(verifier_identity(actor))),
            updated_at: Set(now),
            ..Default::default()
        };

        let updated = self.apply(am).await?;
        log::info!(
            "Payment for order {} verified by {} (paid {})",
            updated.id,
            actor.id,
            paid_amount
        );
        Ok(updated)
    }

    pub async fn reject_payment(&self, raw_id: &str) -> AppResult<OrderResponse> {
        let id = parse_order_id(raw_id)?;
        let am = order::ActiveModel {
            id: Set(id),
            payment_status: Set(PaymentStatus::PaymentRejected),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let updated = self.apply(am).await?;
        log::info!("Payment for order {} rejected", updated.id);
        Ok(updated)
    }

    async fn apply(&self, am: order::ActiveModel) -> AppResult<OrderResponse> {
        match am.update(&self.pool).await {
            Ok(model) => Ok(OrderResponse::from(model)),
            Err(DbErr::RecordNotUpdated) => Err(order_not_found()),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn initial_payment_status(method: PaymentMethod, has_proof: bool) -> PaymentStatus {
    match (method, has_proof) {
        (PaymentMethod::Online, true) => PaymentStatus::PendingOnlineVerification,
        _ => PaymentStatus::Pending,
    }
}

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_string())
}

// Unparsable ids cannot name an order
fn parse_order_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| order_not_found())
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Confirmation email for an order, when the customer left an address.
pub fn confirmation_email(order: &OrderResponse) -> Option<EmailMessage> {
    let to = order
        .customer_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())?;

    let items_list: String = order
        .items
        .iter()
        .map(|item| {
            format!(
                "<li><strong>{}</strong> (x{}) — Rs. {}</li>",
                escape_html(&item.name),
                item.quantity,
                item.line_total()
            )
        })
        .collect();

    let name = order.customer_name.as_deref().unwrap_or("Customer");
    let contact = order
        .customer_phone
        .as_deref()
        .or(order.delivery_address.phone.as_deref())
        .unwrap_or("-");

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
<h2 style="color:#16a34a;">Hi {name}</h2>
<p>Thank you for your order! You have successfully placed the following order with <strong>HOMEZaika</strong>.</p>
<h3 style="margin-top:20px;">Items You Ordered:</h3>
<ul>{items_list}</ul>
<p><strong>Total Amount:</strong> Rs. {total}</p>
<p><strong>Payment Method:</strong> {method}</p>
<h3 style="margin-top:20px;">Delivery Address</h3>
<p>{street}, {city}</p>
<p><strong>Contact:</strong> {contact}</p>
<p style="margin-top:25px;">Your homemade meal is now being prepared. We'll notify you once it's on the way!</p>
<p style="margin-top:30px;">Regards,<br/><strong>HOMEZaika Team</strong></p>
</div>"#,
        name = escape_html(name),
        total = order.total_amount,
        method = order.payment_method,
        street = escape_html(&order.delivery_address.street),
        city = escape_html(&order.delivery_address.city),
        contact = escape_html(contact),
    );

    Some(EmailMessage {
        to: to.to_string(),
        subject: "Your Order Has Been Placed Successfully | HOMEZaika".to_string(),
        html,
    })
}
