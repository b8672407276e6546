use actix_web::web;

use crate::dispatch::dispatch;

/// Every request goes to the handler chain; routing happens inside it.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.default_service(web::to(dispatch));
}
