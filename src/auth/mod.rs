//! Accounts and sessions.
//!
//! Passwords are stored as argon2 PHC strings. Clients authenticate with
//! the session token returned at login, sent either as
//! `Authorization: Bearer <token>` or in the [`SESSION_COOKIE`] cookie.

mod password;
mod session;

pub use password::{hash_password, verify_password};
pub use session::{CurrentUser, SESSION_COOKIE, expired_session_cookie, session_cookie};
