use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use zaika_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    error::set_expose_error_detail,
    external::MailService,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");
    set_expose_error_detail(config.server.expose_error_detail);

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    let mail_service = MailService::new(config.mail.clone());
    if !mail_service.is_enabled() {
        log::warn!("Mail API is not configured, order confirmations will not be sent");
    }

    // 创建服务
    let notifier = OrderNotifier::new(config.orders.event_channel_capacity);
    let chef_service = ChefService::new(
        pool.clone(),
        config.orders.platform_admin_chef_name.clone(),
    );
    let upload_service = UploadService::new(
        &config.orders.upload_dir,
        config.orders.max_upload_bytes,
    );
    let order_service = OrderService::new(
        pool.clone(),
        chef_service,
        notifier.clone(),
        mail_service,
        config.orders.delivery_fee,
    );

    let cors_origins = config.server.cors_allowed_origins.clone();

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors(&cors_origins))
            .app_data(handlers::json_config())
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(notifier.clone()))
            .app_data(web::Data::new(upload_service.clone()))
            .configure(swagger_config)
            .service(web::scope("/api").configure(handlers::order_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
