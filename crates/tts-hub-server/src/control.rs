//! Control-plane listener wiring.
//!
//! Builds the admin API app: routes, CORS, request logging and OpenAPI docs.

use std::net::SocketAddr;
use std::task::{Context, Poll};

use actix_cors::Cors;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse};
use actix_web::{App, Error, HttpServer, web};
use anyhow::{Context as _, Result};
use futures_util::future::{LocalBoxFuture, Ready, ok};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::listener::BoundServer;
use crate::openapi;
use crate::state::AppState;

/// Bind the control plane and start serving in the background.
pub fn start(bind: SocketAddr, state: web::Data<AppState>) -> Result<BoundServer> {
    let http = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(FilteredLogger)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", openapi::ApiDoc::openapi()),
            )
            .configure(api::configure)
    })
    .workers(2)
    .disable_signals()
    .shutdown_timeout(5)
    .bind(bind)
    .with_context(|| format!("bind control plane {bind}"))?;
    let addrs = http.addrs();
    Ok(BoundServer::spawn("control", http.run(), addrs))
}

/// Return true when the request path should be logged.
fn should_log_path(path: &str) -> bool {
    !(path == "/health" || path == "/owner" || path.starts_with("/swagger-ui"))
}

/// Actix middleware that filters noisy paths from logging.
struct FilteredLogger;

impl<S, B> actix_web::dev::Transform<S, ServiceRequest> for FilteredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = FilteredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(FilteredLoggerMiddleware { service })
    }
}

/// Service wrapper that applies the logging filter.
struct FilteredLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for FilteredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();
        let should_log = should_log_path(&path);
        let method = req.method().clone();
        let peer = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("-")
            .to_string();
        let start = std::time::Instant::now();
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            if should_log {
                tracing::info!(
                    method = %method,
                    path = %path,
                    status = %res.status().as_u16(),
                    peer = %peer,
                    elapsed_ms = %start.elapsed().as_millis(),
                    "http request"
                );
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::should_log_path;

    #[test]
    fn polling_paths_are_not_logged() {
        assert!(!should_log_path("/health"));
        assert!(!should_log_path("/owner"));
        assert!(!should_log_path("/swagger-ui/index.html"));
        assert!(should_log_path("/own-files"));
        assert!(should_log_path("/own-files/delete"));
    }
}
