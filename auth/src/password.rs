use std::sync::{Arc, RwLock};

use fw_error::{Error, Result};
use fw_hash_argon2::argon2::Argon2Hash;
use fw_web::Env;
use serde::Serialize;

use crate::cookie::Identify;

pub fn encrypt_password(hash: &Argon2Hash, raw_password: &str) -> Result<String> {
    hash.hash_password(raw_password)
        .map_err(|err| Error::InternalServerError(format!("Failed to hash password: {err}")))
}

/// Malformed digests never match.
pub fn check_password(hash: &Argon2Hash, raw_password: &str, enc_password: &str) -> bool {
    hash.verify_password(raw_password, enc_password).is_ok()
}

/// A stored account that can log in with a password.
pub trait AuthUser {
    fn id(&self) -> String;

    fn password_hash(&self) -> &str;
}

pub trait UserRepository: Send + Sync {
    type User: AuthUser + Clone + Send + Sync + 'static;

    fn find_by_login(&self, login: &str) -> Option<Self::User>;

    fn find_by_id(&self, id: &str) -> Option<Self::User>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: String,
    login: String,
    #[serde(skip)]
    password_hash: String,
}

impl User {
    pub fn login(&self) -> &str {
        &self.login
    }
}

impl AuthUser for User {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    users: RwLock<Vec<User>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account with an already hashed password. Ids are assigned
    /// sequentially from 1.
    pub fn add(&self, login: &str, password_hash: &str) -> Result<User> {
        let mut users = self
            .users
            .write()
            .map_err(|err| Error::InternalServerError(err.to_string()))?;
        if users.iter().any(|user| user.login == login) {
            return Err(Error::BadRequest(format!("User '{login}' already exists")));
        }
        let user = User {
            id: (users.len() + 1).to_string(),
            login: login.to_owned(),
            password_hash: password_hash.to_owned(),
        };
        users.push(user.clone());
        Ok(user)
    }

    fn find<P: Fn(&User) -> bool>(&self, predicate: P) -> Option<User> {
        self.users
            .read()
            .ok()
            .and_then(|users| users.iter().find(|&user| predicate(user)).cloned())
    }
}

impl UserRepository for InMemoryUsers {
    type User = User;

    fn find_by_login(&self, login: &str) -> Option<User> {
        self.find(|user| user.login == login)
    }

    fn find_by_id(&self, id: &str) -> Option<User> {
        self.find(|user| user.id == id)
    }
}

/// Identifies users of a repository by login and argon2 password hash.
pub struct PasswordAuth<R> {
    users: R,
    hash: Arc<Argon2Hash>,
}

impl<R: UserRepository> PasswordAuth<R> {
    pub fn new(users: R, hash: Arc<Argon2Hash>) -> Self {
        Self { users, hash }
    }

    pub fn users(&self) -> &R {
        &self.users
    }
}

impl<R: UserRepository> Identify for PasswordAuth<R> {
    type User = R::User;

    fn get_user_identity(&self, _env: &Env, login: &str, password: &str) -> Option<String> {
        let user = self.users.find_by_login(login)?;
        match check_password(&self.hash, password, user.password_hash()) {
            true => Some(user.id()),
            false => None,
        }
    }

    fn identify_user(&self, _env: &Env, identity: &str) -> Option<Self::User> {
        self.users.find_by_id(identity)
    }
}
