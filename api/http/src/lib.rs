use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Result;
use configure::configure;
use context::ApiHttpCtx;
use fw_template::TemplateEngine;
use fw_web::WebHandler;
use logger::logger_format;
use tokio_util::sync::CancellationToken;

mod configure;
pub mod context;
mod dispatch;
mod logger;

pub struct ApiHttpServer {
    address: String,
    workers: Option<usize>,
    context: web::Data<ApiHttpCtx>,
}

impl ApiHttpServer {
    pub fn new(
        host: &str,
        port: &u16,
        workers: &Option<usize>,
        app: Arc<dyn WebHandler>,
        templates: Arc<dyn TemplateEngine>,
    ) -> Self {
        fw_log::info(Some("⚡"), "[ApiHttpServer] Initializing component");

        let address = format!("{host}:{port}");
        let context = web::Data::new(ApiHttpCtx::new(app, templates));

        Self {
            address,
            workers: *workers,
            context,
        }
    }

    pub async fn run(self, cancel_token: CancellationToken) -> Result<()> {
        fw_log::info(Some("💫"), "[ApiHttpServer] Running component");

        let context = self.context;
        let mut server = HttpServer::new(move || {
            App::new()
                .wrap(Logger::new(logger_format()))
                .app_data(context.clone())
                .configure(configure)
        })
        .disable_signals();
        if let Some(workers) = self.workers {
            server = server.workers(workers);
        }
        let server = server.bind(&self.address)?.run();
        let handle = server.handle();

        fw_log::info(
            Some("🌐"),
            format!("[ApiHttpServer] Listening on {}", self.address),
        );

        tokio::select! {
            result = server => Ok(result?),
            _ = cancel_token.cancelled() => {
                handle.stop(true).await;
                Ok(())
            }
            _ = tokio::signal::ctrl_c() => {
                fw_log::info(None, "[ApiHttpServer] Received shutdown signal");
                handle.stop(true).await;
                cancel_token.cancel();
                Ok(())
            }
        }
    }
}
