use std::sync::Arc;

use actix_web::{dev::Extensions, http::StatusCode};
use fw_error::{Error, Result};
use fw_template::TemplateEngine;
use serde::Serialize;

use crate::{request::Request, response::Response};

/// Per-request environment shared by every handler of a chain.
pub struct Env {
    request: Request,
    templates: Arc<dyn TemplateEngine>,
    extensions: Extensions,
}

impl Env {
    pub fn new(request: Request, templates: Arc<dyn TemplateEngine>) -> Self {
        Self {
            request,
            templates,
            extensions: Extensions::new(),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn templates(&self) -> &dyn TemplateEngine {
        self.templates.as_ref()
    }

    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.extensions.insert(value)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.extensions.remove::<T>()
    }

    pub fn render(&self, template: &str, data: &Data) -> Result<String> {
        self.templates.render(template, &data.to_json())
    }

    pub fn render_to_response(&self, template: &str, data: &Data) -> Result<Response> {
        Ok(Response::new(StatusCode::OK).with_body(self.render(template, data)?))
    }
}

/// Values collected along a chain, handed to templates as their context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    values: serde_json::Map<String, serde_json::Value>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|err| {
            Error::InternalServerError(format!("Failed to serialize data '{key}': {err}"))
        })?;
        self.values.insert(key.to_owned(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use fw_template::LiquidTemplates;

    use super::*;

    struct User(&'static str);

    fn env() -> Env {
        let templates = LiquidTemplates::new().unwrap();
        templates
            .register("hello", "Hello {{ name | escape }}")
            .unwrap();
        Env::new(Request::blank("/"), Arc::new(templates))
    }

    #[test]
    fn typed_extensions() {
        let mut env = env();
        assert!(env.get::<User>().is_none());
        env.insert(User("ann"));
        assert_eq!(env.get::<User>().map(|user| user.0), Some("ann"));
        assert!(env.remove::<User>().is_some());
        assert!(env.get::<User>().is_none());
    }

    #[test]
    fn renders_data() {
        let env = env();
        let mut data = Data::new();
        data.insert("name", "<ann>").unwrap();
        let response = env.render_to_response("hello", &data).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "Hello &lt;ann&gt;");

        assert!(matches!(
            env.render_to_response("missing", &data),
            Err(Error::Template(_))
        ));
    }
}
