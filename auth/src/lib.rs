//! Authentication primitives library
//!
//! Provides the building blocks for stateless session authentication:
//! - Password hashing (Argon2id)
//! - Signed session token issuance and validation
//!
//! The service crate composes these into its login and registration flows;
//! this crate has no knowledge of users, storage, or HTTP.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("wrong_password", &hash));
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::SessionTokenCodec;
//! use chrono::Duration;
//!
//! let codec = SessionTokenCodec::new(b"secret_key_at_least_32_bytes_long!", Duration::hours(24));
//! let token = codec.issue("user123").unwrap();
//! let user_id = codec.validate(&token).unwrap();
//! assert_eq!(user_id, "user123");
//! ```

pub mod password;
pub mod session;

// Re-export commonly used items
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use session::SessionClaims;
pub use session::SessionTokenCodec;
pub use session::SessionTokenError;
