//! Access control for gated screens.
//!
//! The reports screen can be locked behind a password. Only its Argon2id
//! hash is ever stored.

mod password;

pub use password::{PasswordError, hash_password, verify_password};
