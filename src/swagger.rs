use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::entities::{LineItem, OrderStatus, PaymentMethod, PaymentStatus};
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::order::create_order,
        handlers::order::get_my_orders,
        handlers::order::get_chef_orders,
        handlers::order::get_all_orders,
        handlers::order::get_order,
        handlers::order::update_order_status,
        handlers::order::verify_payment,
        handlers::order::reject_payment,
        handlers::order::order_events,
    ),
    components(
        schemas(
            CreateOrderRequest,
            DeliveryAddress,
            UpdateOrderStatusRequest,
            VerifyPaymentRequest,
            OrderResponse,
            OrderApiResponse,
            OrderListApiResponse,
            ApiErrorResponse,
            ApiError,
            LineItem,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "order", description = "Checkout, order lookups and payment verification"),
    ),
    info(
        title = "HOMEZaika Backend API",
        version = "1.0.0",
        description = "HOMEZaika order REST API documentation"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
