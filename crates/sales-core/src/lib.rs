//! # Sales Core
//!
//! Foundational types shared by every layer of the sales API:
//!
//! - [`errors`]: the closed error taxonomy every handler reports failures through
//! - [`validate`]: payload validation that produces field-level errors
//! - [`password`]: bcrypt hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use sales_core::{AppError, hash_password, verify_password};
//!
//! let hash = hash_password("gophers")?;
//! if !verify_password("gophers", &hash)? {
//!     return Err(AppError::unauthorized("authentication failed"));
//! }
//! ```

pub mod errors;
pub mod password;
pub mod validate;

// Re-export commonly used types at crate root
pub use errors::{AppError, ErrorResponse, FieldError, FieldErrors};
pub use password::{hash_password, hash_password_with_cost, verify_password};
