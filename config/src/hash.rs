use serde::Deserialize;

#[derive(Deserialize)]
pub struct HashConfig {
    argon2: Argon2HashConfig,
}

impl HashConfig {
    pub fn argon2(&self) -> &Argon2HashConfig {
        &self.argon2
    }
}

/// Salts are generated per password, so only the variant is configured.
#[derive(Deserialize)]
pub struct Argon2HashConfig {
    algorithm: String,
    version: String,
}

impl Argon2HashConfig {
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
