use std::sync::Arc;

use fw_template::TemplateEngine;

use crate::{
    handler::{self, HandlerResult, WebHandler},
    request::Request,
};

/// Runs `app` against `request` without a server.
pub fn ask(
    app: &dyn WebHandler,
    request: Request,
    templates: Arc<dyn TemplateEngine>,
) -> HandlerResult {
    handler::run(app, request, templates)
}
