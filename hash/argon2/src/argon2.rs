use argon2::{
    password_hash::{self, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use rand::RngCore;

const SALT_LEN: usize = 16;

/// Password digests in PHC string form (`$argon2id$v=19$...`), each with its
/// own random salt.
pub struct Argon2Hash {
    argon2: Argon2<'static>,
}

impl Argon2Hash {
    pub fn new(algorithm: &str, version: &str) -> Result<Self, argon2::Error> {
        fw_log::info(Some("⚡"), "[Argon2Hash] Initializing component");

        let algorithm = match algorithm {
            "Argon2d" => Algorithm::Argon2d,
            "Argon2i" => Algorithm::Argon2i,
            "Argon2id" => Algorithm::Argon2id,
            _ => return Err(argon2::Error::AlgorithmInvalid),
        };

        let version = match version {
            "V0x10" => Version::V0x10,
            "V0x13" => Version::V0x13,
            _ => return Err(argon2::Error::VersionInvalid),
        };

        Ok(Self {
            argon2: Argon2::new(algorithm, version, Params::DEFAULT),
        })
    }

    pub fn hash_password(&self, password: &str) -> Result<String, password_hash::Error> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt)?;
        Ok(self
            .argon2
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }

    /// The algorithm and version embedded in `hash` win over the configured
    /// ones, so hashes survive a configuration change.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<(), password_hash::Error> {
        let hash = PasswordHash::new(hash)?;
        self.argon2.verify_password(password.as_bytes(), &hash)
    }
}

impl Default for Argon2Hash {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}
