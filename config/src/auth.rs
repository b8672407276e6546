use serde::Deserialize;

#[derive(Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    cookie_name: String,
    cookie_path: String,
    login_path: String,
    logout_path: String,
    logout_redirect: String,
    users: Vec<AuthUserConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "auth".to_owned(),
            cookie_path: "/".to_owned(),
            login_path: "/login".to_owned(),
            logout_path: "/logout".to_owned(),
            logout_redirect: "/".to_owned(),
            users: Vec::new(),
        }
    }
}

impl AuthConfig {
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn cookie_path(&self) -> &str {
        &self.cookie_path
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn logout_path(&self) -> &str {
        &self.logout_path
    }

    pub fn logout_redirect(&self) -> &str {
        &self.logout_redirect
    }

    pub fn users(&self) -> &[AuthUserConfig] {
        &self.users
    }
}

/// Account seeded into the in-memory user repository at startup.
#[derive(Deserialize)]
pub struct AuthUserConfig {
    login: String,
    password: String,
}

impl AuthUserConfig {
    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}
