use std::sync::Arc;

use fw_template::TemplateEngine;
use fw_web::WebHandler;

pub struct ApiHttpCtx {
    app: Arc<dyn WebHandler>,
    templates: Arc<dyn TemplateEngine>,
}

impl ApiHttpCtx {
    pub fn new(app: Arc<dyn WebHandler>, templates: Arc<dyn TemplateEngine>) -> Self {
        Self { app, templates }
    }

    pub fn app(&self) -> &Arc<dyn WebHandler> {
        &self.app
    }

    pub fn templates(&self) -> &Arc<dyn TemplateEngine> {
        &self.templates
    }
}
