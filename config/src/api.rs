use serde::Deserialize;

#[derive(Deserialize)]
pub struct ApiConfig {
    http: ApiHttpConfig,
}

impl ApiConfig {
    pub fn http(&self) -> &ApiHttpConfig {
        &self.http
    }
}

/// Address of the form server. `workers` falls back to actix's per-core default.
#[derive(Deserialize)]
pub struct ApiHttpConfig {
    host: String,
    port: u16,
    #[serde(default)]
    workers: Option<usize>,
}

impl ApiHttpConfig {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &u16 {
        &self.port
    }

    pub fn workers(&self) -> &Option<usize> {
        &self.workers
    }
}
