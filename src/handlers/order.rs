use crate::entities::PaymentMethod;
use crate::error::{AppError, AppResult};
use crate::middlewares::{Role, customer_identity, get_actor_from_request, require_roles};
use crate::models::*;
use crate::services::{OrderNotifier, OrderService, UploadService, UploadedFile, next_event};
use actix_multipart::Multipart;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, guard, web};
use futures_util::{StreamExt, TryStreamExt, stream};
use serde_json::{Map, Value, json};

const SCREENSHOT_FIELD: &str = "paymentScreenshot";
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

fn is_multipart(ctx: &guard::GuardContext) -> bool {
    ctx.head()
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// Text fields become a JSON object handed to the same deserializer as JSON checkouts.
async fn read_checkout_form(
    mut payload: Multipart,
    upload_service: &UploadService,
) -> AppResult<(CreateOrderRequest, Option<UploadedFile>)> {
    let max_file_bytes = upload_service.max_bytes();
    let mut fields = Map::new();
    let mut screenshot = None;

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == SCREENSHOT_FIELD {
            let content_type = field
                .content_type()
                .map(|m| m.essence_str().to_string())
                .unwrap_or_default();
            upload_service.check_image(&content_type)?;
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);

            let mut data = Vec::new();
            while let Some(chunk) = field.try_next().await? {
                if data.len() + chunk.len() > max_file_bytes {
                    return Err(AppError::ValidationError(format!(
                        "Payment screenshot exceeds {max_file_bytes} bytes"
                    )));
                }
                data.extend_from_slice(&chunk);
            }
            screenshot = Some(UploadedFile {
                file_name,
                content_type,
                data,
            });
            continue;
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if data.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
                return Err(AppError::ValidationError(format!("Field {name} is too large")));
            }
            data.extend_from_slice(&chunk);
        }
        let text = String::from_utf8(data)
            .map_err(|_| AppError::ValidationError(format!("Field {name} is not valid UTF-8")))?;
        fields.insert(name, Value::String(text));
    }

    let request = serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::ValidationError(format!("Invalid order payload: {e}")))?;
    Ok((request, screenshot))
}

async fn place_order(
    order_service: &OrderService,
    upload_service: &UploadService,
    req: &HttpRequest,
    request: CreateOrderRequest,
    screenshot: Option<UploadedFile>,
) -> AppResult<OrderResponse> {
    let actor = get_actor_from_request(req);
    // Validate before touching the disk
    request.validate(customer_identity(actor.as_ref()).is_none())?;

    let screenshot_path = match (request.payment_method, screenshot) {
        (PaymentMethod::Online, Some(file)) => {
            Some(upload_service.save_payment_proof(file).await?)
        }
        _ => None,
    };

    let result = order_service
        .create_order(actor.as_ref(), request, screenshot_path.clone())
        .await;

    // Nothing references the proof when the order was not stored
    if let (Err(_), Some(path)) = (&result, &screenshot_path) {
        upload_service.remove_payment_proof(path).await;
    }
    result
}

fn created(order: OrderResponse) -> HttpResponse {
    HttpResponse::Created().json(json!({
        "success": true,
        "order": order
    }))
}

#[utoipa::path(
    post,
    path = "/order/new",
    tag = "order",
    request_body(
        content = CreateOrderRequest,
        description = "JSON body, or multipart/form-data with the same fields plus an optional paymentScreenshot image"
    ),
    responses(
        (status = 201, description = "Order placed", body = OrderApiResponse),
        (status = 400, description = "Invalid order payload", body = ApiErrorResponse),
        (status = 404, description = "Chef not found", body = ApiErrorResponse)
    )
)]
pub async fn create_order(
    order_service: web::Data<OrderService>,
    upload_service: web::Data<UploadService>,
    req: HttpRequest,
    request: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse> {
    match place_order(&order_service, &upload_service, &req, request.into_inner(), None).await {
        Ok(order) => Ok(created(order)),
        Err(e) => Ok(e.error_response()),
    }
}

pub async fn create_order_multipart(
    order_service: web::Data<OrderService>,
    upload_service: web::Data<UploadService>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<HttpResponse> {
    let result = async {
        let (request, screenshot) =
            read_checkout_form(payload, &upload_service).await?;
        place_order(&order_service, &upload_service, &req, request, screenshot).await
    }
    .await;

    match result {
        Ok(order) => Ok(created(order)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/order/me",
    tag = "order",
    security(
        (),
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Orders of the caller; empty for guests", body = OrderListApiResponse)
    )
)]
pub async fn get_my_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let actor = get_actor_from_request(&req);

    match order_service.get_my_orders(actor.as_ref()).await {
        Ok(orders) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "orders": orders
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/order/chef",
    tag = "order",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orders of the caller's kitchen", body = OrderListApiResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Chef or admin role required", body = ApiErrorResponse),
        (status = 404, description = "Chef not found", body = ApiErrorResponse)
    )
)]
pub async fn get_chef_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let actor = get_actor_from_request(&req);
    let actor = match require_roles(actor.as_ref(), &[Role::Chef, Role::Admin]) {
        Ok(actor) => actor,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service.get_chef_orders(actor).await {
        Ok(orders) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "orders": orders
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/order/admin/all",
    tag = "order",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All orders, newest first", body = OrderListApiResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Admin role required", body = ApiErrorResponse)
    )
)]
pub async fn get_all_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let actor = get_actor_from_request(&req);
    if let Err(e) = require_roles(actor.as_ref(), &[Role::Admin]) {
        return Ok(e.error_response());
    }

    match order_service.get_all_orders().await {
        Ok(orders) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "orders": orders
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/order/{id}",
    tag = "order",
    params(("id" = String, Path, description = "Order id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Order", body = OrderApiResponse),
        (status = 403, description = "Chef or admin role required", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse)
    )
)]
pub async fn get_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let actor = get_actor_from_request(&req);
    if let Err(e) = require_roles(actor.as_ref(), &[Role::Chef, Role::Admin]) {
        return Ok(e.error_response());
    }

    match order_service.get_order(&path).await {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "order": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/order/{id}",
    tag = "order",
    params(("id" = String, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Order updated", body = OrderApiResponse),
        (status = 400, description = "Unknown status value or empty body", body = ApiErrorResponse),
        (status = 403, description = "Chef or admin role required", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse)
    )
)]
pub async fn update_order_status(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse> {
    let actor = get_actor_from_request(&req);
    if let Err(e) = require_roles(actor.as_ref(), &[Role::Chef, Role::Admin]) {
        return Ok(e.error_response());
    }

    match order_service
        .update_order_status(&path, request.into_inner())
        .await
    {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "order": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/order/verify/{id}",
    tag = "order",
    params(("id" = String, Path, description = "Order id")),
    request_body = VerifyPaymentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment verified", body = OrderApiResponse),
        (status = 400, description = "Valid paid amount is required", body = ApiErrorResponse),
        (status = 403, description = "Admin role required", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse)
    )
)]
pub async fn verify_payment(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse> {
    let actor = get_actor_from_request(&req);
    let actor = match require_roles(actor.as_ref(), &[Role::Admin]) {
        Ok(actor) => actor,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service
        .verify_payment(&path, request.into_inner(), actor)
        .await
    {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "order": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/order/reject/{id}",
    tag = "order",
    params(("id" = String, Path, description = "Order id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment rejected", body = OrderApiResponse),
        (status = 403, description = "Admin role required", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse)
    )
)]
pub async fn reject_payment(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let actor = get_actor_from_request(&req);
    if let Err(e) = require_roles(actor.as_ref(), &[Role::Admin]) {
        return Ok(e.error_response());
    }

    match order_service.reject_payment(&path).await {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "order": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Server-Sent Events stream of `newOrder` events for dashboards.
#[utoipa::path(
    get,
    path = "/order/events",
    tag = "order",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Stream of newOrder events", body = String, content_type = "text/event-stream"),
        (status = 403, description = "Chef or admin role required", body = ApiErrorResponse)
    )
)]
pub async fn order_events(
    notifier: web::Data<OrderNotifier>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let actor = get_actor_from_request(&req);
    let actor = match require_roles(actor.as_ref(), &[Role::Chef, Role::Admin]) {
        Ok(actor) => actor.clone(),
        Err(e) => return Ok(e.error_response()),
    };
    log::info!("Order observer connected: {} ({})", actor.id, actor.role);

    let receiver = notifier.subscribe();
    let events = stream::unfold(receiver, |mut rx| async move {
        loop {
            let event = next_event(&mut rx).await?;
            match event.to_sse_frame() {
                Ok(frame) => {
                    return Some((Ok::<_, actix_web::Error>(web::Bytes::from(frame)), rx));
                }
                Err(e) => log::error!("Failed to encode order event: {e}"),
            }
        }
    });
    let hello = stream::once(async {
        Ok::<_, actix_web::Error>(web::Bytes::from_static(b": connected\n\n"))
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(hello.chain(events)))
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/order")
            .route(
                "/new",
                web::post()
                    .guard(guard::fn_guard(is_multipart))
                    .to(create_order_multipart),
            )
            .route("/new", web::post().to(create_order))
            .route("/me", web::get().to(get_my_orders))
            .route("/chef", web::get().to(get_chef_orders))
            .route("/admin/all", web::get().to(get_all_orders))
            .route("/events", web::get().to(order_events))
            .route("/verify/{id}", web::put().to(verify_payment))
            .route("/reject/{id}", web::put().to(reject_payment))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}", web::put().to(update_order_status)),
    );
}

/// Malformed JSON bodies surface as validation errors in the common error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid request body: {err}")).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;
    use crate::database::test_pool;
    use crate::entities::{OrderStatus, PaymentStatus};
    use crate::external::MailService;
    use crate::middlewares::AuthMiddleware;
    use crate::services::ChefService;
    use crate::utils::JwtService;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    const SECRET: &str = "handler-test-secret";

    struct TestState {
        order_service: OrderService,
        notifier: OrderNotifier,
        upload_service: UploadService,
        jwt: JwtService,
        upload_dir: std::path::PathBuf,
    }

    async fn state() -> TestState {
        let pool = test_pool().await;
        let notifier = OrderNotifier::new(16);
        let upload_dir =
            std::env::temp_dir().join(format!("zaika-handler-{}", uuid::Uuid::new_v4()));
        TestState {
            order_service: OrderService::new(
                pool.clone(),
                ChefService::new(pool, "Home Zaika Admin".to_string()),
                notifier.clone(),
                MailService::new(MailConfig::default()),
                150.0,
            ),
            notifier,
            upload_service: UploadService::new(&upload_dir, 5 * 1024 * 1024),
            jwt: JwtService::new(SECRET, 3600),
            upload_dir,
        }
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .wrap(AuthMiddleware::new($state.jwt.clone()))
                    .app_data(json_config())
                    .app_data(web::Data::new($state.order_service.clone()))
                    .app_data(web::Data::new($state.notifier.clone()))
                    .app_data(web::Data::new($state.upload_service.clone()))
                    .service(web::scope("/api").configure(order_config)),
            )
            .await
        };
    }

    fn bearer(state: &TestState, id: &str, role: Role) -> (&'static str, String) {
        let token = state.jwt.generate_access_token(id, role).unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    fn checkout_body() -> Value {
        json!({
            "items": [{"food": "f1", "name": "Daal Chawal", "price": 300, "quantity": 2}],
            "deliveryAddress": {"street": "7 Gulberg", "city": "Lahore"},
            "paymentMethod": "COD",
            "totalAmount": 750,
            "customerName": "Hamza",
            "customerPhone": "+923001112233"
        })
    }

    const FORM_BOUNDARY: &str = "zaikaBoundary";

    /// Online checkout as multipart form data with a small PNG attached.
    fn online_checkout_form(extra_fields: &[(&str, &str)]) -> test::TestRequest {
        let mut fields = vec![
            (
                "items",
                r#"[{"food":"f1","name":"Haleem","price":450,"quantity":2}]"#,
            ),
            ("deliveryAddress", r#"{"street":"5 Canal View","city":"Karachi"}"#),
            ("paymentMethod", "Online"),
            ("totalAmount", "1050"),
            ("customerName", "Bilal"),
            ("customerEmail", "bilal@example.com"),
            ("customerPhone", "03001234567"),
        ];
        fields.extend_from_slice(extra_fields);

        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{FORM_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{FORM_BOUNDARY}\r\nContent-Disposition: form-data; name=\"paymentScreenshot\"; filename=\"proof.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[0x89, b'P', b'N', b'G', 1, 2, 3]);
        body.extend_from_slice(format!("\r\n--{FORM_BOUNDARY}--\r\n").as_bytes());

        test::TestRequest::post()
            .uri("/api/order/new")
            .insert_header((
                "Content-Type",
                format!("multipart/form-data; boundary={FORM_BOUNDARY}"),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn test_guest_checkout_json() {
        let state = state().await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/order/new")
            .set_json(checkout_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: OrderApiResponse = test::read_body_json(resp).await;
        assert!(body.success);
        assert!(body.order.is_guest);
        assert_eq!(body.order.total_amount, 750.0);
        assert_eq!(body.order.payment_status, PaymentStatus::Pending);
    }

    #[actix_web::test]
    async fn test_checkout_multipart_with_screenshot() {
        let state = state().await;
        let app = app!(state);
        let mut dashboard = state.notifier.subscribe();

        let req = online_checkout_form(&[]).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: OrderApiResponse = test::read_body_json(resp).await;
        assert_eq!(
            body.order.payment_status,
            PaymentStatus::PendingOnlineVerification
        );
        assert_eq!(body.order.total_amount, 1050.0);
        let screenshot = body.order.payment_screenshot.clone().unwrap();
        assert!(screenshot.starts_with("/uploads/payments/"));
        let stored = state
            .upload_dir
            .join(screenshot.rsplit('/').next().unwrap());
        assert!(stored.exists());

        let crate::services::OrderEvent::NewOrder(event) = dashboard.recv().await.unwrap();
        assert_eq!(event.id, body.order.id);
        let _ = std::fs::remove_dir_all(&state.upload_dir);
    }

    #[actix_web::test]
    async fn test_failed_checkout_leaves_no_screenshot_behind() {
        let state = state().await;
        let app = app!(state);

        let unknown_chef = uuid::Uuid::new_v4().to_string();
        let req = online_checkout_form(&[("chef", unknown_chef.as_str())]).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "Chef not found");

        let leftovers = match std::fs::read_dir(&state.upload_dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        };
        assert_eq!(leftovers, 0);
        let _ = std::fs::remove_dir_all(&state.upload_dir);
    }

    #[actix_web::test]
    async fn test_malformed_body_is_validation_error() {
        let state = state().await;
        let app = app!(state);

        let mut body = checkout_body();
        body["paymentMethod"] = json!("Bitcoin");
        let req = test::TestRequest::post()
            .uri("/api/order/new")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[actix_web::test]
    async fn test_invalid_token_rejected() {
        let state = state().await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/order/me")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let resp = test::try_call_service(&app, req).await;
        let status = match resp {
            Ok(resp) => resp.status(),
            Err(e) => e.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_my_orders_guest_gets_empty_list() {
        let state = state().await;
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/order/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: OrderListApiResponse = test::read_body_json(resp).await;
        assert!(body.success);
        assert!(body.orders.is_empty());
    }

    #[actix_web::test]
    async fn test_my_orders_for_customer() {
        let state = state().await;
        let app = app!(state);
        let auth = bearer(&state, "user-5", Role::Customer);

        let req = test::TestRequest::post()
            .uri("/api/order/new")
            .insert_header(auth.clone())
            .set_json(checkout_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri("/api/order/me")
            .insert_header(auth)
            .to_request();
        let body: OrderListApiResponse =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body.orders.len(), 1);
        assert_eq!(body.orders[0].user.as_deref(), Some("user-5"));
    }

    #[actix_web::test]
    async fn test_role_gates() {
        let state = state().await;
        let app = app!(state);

        // No identity: authentication error
        let req = test::TestRequest::get().uri("/api/order/admin/all").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        // Wrong role: authorization error
        let req = test::TestRequest::get()
            .uri("/api/order/admin/all")
            .insert_header(bearer(&state, "chef-1", Role::Chef))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri(&format!("/api/order/{}", uuid::Uuid::new_v4()))
            .insert_header(bearer(&state, "user-1", Role::Customer))
            .set_json(json!({"status": "Delivered"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri(&format!("/api/order/verify/{}", uuid::Uuid::new_v4()))
            .insert_header(bearer(&state, "chef-1", Role::Chef))
            .set_json(json!({"paidAmount": 500}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/order/admin/all")
            .insert_header(bearer(&state, "admin-1", Role::Admin))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_chef_without_kitchen_not_found() {
        let state = state().await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/order/chef")
            .insert_header(bearer(&state, "chef-9", Role::Chef))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "Chef not found");
    }

    #[actix_web::test]
    async fn test_payment_workflow_over_http() {
        let state = state().await;
        let app = app!(state);
        let admin = bearer(&state, "admin-1", Role::Admin);

        let req = test::TestRequest::post()
            .uri("/api/order/new")
            .set_json(checkout_body())
            .to_request();
        let placed: OrderApiResponse =
            test::read_body_json(test::call_service(&app, req).await).await;
        let id = placed.order.id;

        let req = test::TestRequest::put()
            .uri(&format!("/api/order/verify/{id}"))
            .insert_header(admin.clone())
            .set_json(json!({"paidAmount": "abc"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri(&format!("/api/order/verify/{id}"))
            .insert_header(admin.clone())
            .set_json(json!({"paidAmount": 500}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let verified: OrderApiResponse = test::read_body_json(resp).await;
        assert_eq!(verified.order.payment_status, PaymentStatus::BillPaidOnline);
        assert_eq!(verified.order.paid_amount, Some(500.0));
        assert_eq!(verified.order.verified_by.as_deref(), Some("admin-1"));

        let req = test::TestRequest::put()
            .uri(&format!("/api/order/reject/{id}"))
            .insert_header(admin.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let rejected: OrderApiResponse = test::read_body_json(resp).await;
        assert_eq!(rejected.order.payment_status, PaymentStatus::PaymentRejected);

        let req = test::TestRequest::put()
            .uri(&format!("/api/order/{id}"))
            .insert_header(bearer(&state, "chef-1", Role::Chef))
            .set_json(json!({"status": "Out for Delivery"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: OrderApiResponse = test::read_body_json(resp).await;
        assert_eq!(updated.order.status, OrderStatus::OutForDelivery);
    }

    #[actix_web::test]
    async fn test_update_unknown_order_returns_not_found() {
        let state = state().await;
        let app = app!(state);

        let req = test::TestRequest::put()
            .uri(&format!("/api/order/{}", uuid::Uuid::new_v4()))
            .insert_header(bearer(&state, "admin-1", Role::Admin))
            .set_json(json!({"status": "Preparing"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/order/admin/all")
            .insert_header(bearer(&state, "admin-1", Role::Admin))
            .to_request();
        let body: OrderListApiResponse =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert!(body.orders.is_empty());
    }

    #[actix_web::test]
    async fn test_get_single_order() {
        let state = state().await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/order/new")
            .set_json(checkout_body())
            .to_request();
        let placed: OrderApiResponse =
            test::read_body_json(test::call_service(&app, req).await).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/order/{}", placed.order.id))
            .insert_header(bearer(&state, "chef-1", Role::Chef))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let fetched: OrderApiResponse = test::read_body_json(resp).await;
        assert_eq!(fetched.order.id, placed.order.id);
        assert_eq!(fetched.order.items.len(), 1);

        let req = test::TestRequest::get()
            .uri("/api/order/not-a-uuid")
            .insert_header(bearer(&state, "admin-1", Role::Admin))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_events_require_dashboard_role() {
        let state = state().await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/order/events")
            .insert_header(bearer(&state, "user-1", Role::Customer))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/order/events")
            .insert_header(bearer(&state, "admin-1", Role::Admin))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "text/event-stream"
        );
        assert_eq!(state.notifier.observer_count(), 1);
    }
}
