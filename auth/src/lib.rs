pub mod cookie;
pub mod password;
pub mod storage;
pub mod templates;

pub use cookie::{auth_required, current_user, login_form, Authenticated, CookieAuth, Identify};
pub use password::{check_password, encrypt_password, InMemoryUsers, PasswordAuth, User, UserRepository};
pub use storage::{LocalMemStorage, SessionStorage};
