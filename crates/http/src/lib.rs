//! mu-http: reqwest adapter for mediaup
//!
//! Provides [`HttpTransport`], the production implementation of the
//! `Transport` trait, and session stores that supply the `sessionid`
//! cookie.

pub mod client;
pub mod session;

pub use client::HttpTransport;
pub use session::{EnvSession, SESSION_ID_ENV, StaticSession};
