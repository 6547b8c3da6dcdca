//! Client-side session guard and authenticated gateway for the tradex
//! prediction service.
//!
//! Provides a credential store, a gateway client that attaches the bearer
//! token to every request, an asynchronous access guard for protected
//! areas, the login/registration form controller, and refresh controllers
//! for the prediction, history, and pending-user views.

pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod models;
pub mod refresh;
pub mod tls;
pub mod workflow;

pub use error::{Result, TradexError};
