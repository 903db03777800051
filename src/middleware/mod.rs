//! Middleware for the API's handler chain.
//!
//! App-wide, outermost first:
//!
//! - [`logger`]: request start/completion logging with the final status
//! - [`errors`]: turns every [`AppError`](sales_core::AppError) into exactly one response
//! - [`metrics`]: request, error and in-flight counts
//! - [`panics`]: turns a panicking handler into an internal error
//!
//! Per route, inside the above:
//!
//! - [`auth`]: bearer token authentication
//! - [`role`]: role based authorization over the authenticated claims
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::{auth::authenticate, role::authorize};
//!
//! app.handle(Method::GET, "v1", "/testauth", check::test, &[
//!     authenticate(&auth),
//!     authorize(&[ROLE_ADMIN]).into_middleware(),
//! ]);
//! ```

pub mod auth;
pub mod errors;
pub mod logger;
pub mod metrics;
pub mod panics;
pub mod role;
