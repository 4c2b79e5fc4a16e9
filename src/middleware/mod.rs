//! Pre-route hook: the single extension point between matching and binding.

mod auth;
mod core;

pub use auth::{BearerAuthorization, TOKEN_EXTENSION};
pub use core::PreRouteHook;
