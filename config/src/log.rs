use serde::Deserialize;

#[derive(Deserialize)]
#[serde(default)]
pub struct LogConfig {
    display_level: bool,
    level_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            display_level: true,
            level_filter: "info".to_owned(),
        }
    }
}

impl LogConfig {
    pub fn display_level(&self) -> &bool {
        &self.display_level
    }

    pub fn level_filter(&self) -> &str {
        &self.level_filter
    }
}
