use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// Interrupts handling with a bare status, optionally redirecting.
    #[error("HTTP {status}")]
    Http {
        status: u16,
        location: Option<String>,
    },
    #[error("Template error: {0}")]
    Template(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl Error {
    pub fn redirect(status: u16, location: &str) -> Self {
        Self::Http {
            status,
            location: Some(location.to_owned()),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Http { status, .. } => *status,
            Self::Template(_) | Self::InternalServerError(_) => 500,
        }
    }
}
