use std::sync::RwLock;

use ahash::HashMap;
use fw_error::{Error, Result};

/// Renders a named template against a JSON context.
///
/// Widgets, forms and pages only ever talk to this trait, so any engine can
/// be plugged in as long as it knows the template names in use.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String>;

    fn has_template(&self, name: &str) -> bool;
}

/// Liquid sources registered by name, parsed once on registration.
pub struct LiquidTemplates {
    parser: liquid::Parser,
    templates: RwLock<HashMap<String, liquid::Template>>,
}

impl LiquidTemplates {
    pub fn new() -> Result<Self> {
        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(|err| Error::Template(err.to_string()))?;

        Ok(Self {
            parser,
            templates: RwLock::new(HashMap::default()),
        })
    }

    /// Registers (or replaces) `name`.
    pub fn register(&self, name: &str, source: &str) -> Result<()> {
        let template = self
            .parser
            .parse(source)
            .map_err(|err| Error::Template(format!("Failed to parse template '{name}': {err}")))?;

        let mut templates = self
            .templates
            .write()
            .map_err(|err| Error::Template(err.to_string()))?;
        if templates.insert(name.to_owned(), template).is_some() {
            fw_log::debug(None, format!("[LiquidTemplates] Replaced template '{name}'"));
        }
        Ok(())
    }

    pub fn register_all<'a, I>(&self, sources: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, source) in sources {
            self.register(name, source)?;
        }
        Ok(())
    }
}

impl TemplateEngine for LiquidTemplates {
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String> {
        let globals = match liquid::model::to_value(context)
            .map_err(|err| Error::Template(err.to_string()))?
        {
            liquid::model::Value::Object(object) => object,
            liquid::model::Value::Nil => liquid::Object::new(),
            _ => {
                return Err(Error::Template(format!(
                    "Context of template '{name}' must be an object"
                )))
            }
        };

        let templates = self
            .templates
            .read()
            .map_err(|err| Error::Template(err.to_string()))?;
        let template = templates
            .get(name)
            .ok_or_else(|| Error::Template(format!("Template '{name}' is not registered")))?;

        template
            .render(&globals)
            .map_err(|err| Error::Template(format!("Failed to render template '{name}': {err}")))
    }

    fn has_template(&self, name: &str) -> bool {
        self.templates
            .read()
            .is_ok_and(|templates| templates.contains_key(name))
    }
}
