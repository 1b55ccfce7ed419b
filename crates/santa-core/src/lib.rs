//! Core types and the assignment engine for a Secret Santa event.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::SantaStore`]; the boundary layers drive a
//! [`event::SecretSanta`] built on top of one.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod event;
pub mod memory;
pub mod notify;
pub mod pairing;
pub mod participant;
pub mod policy;
pub mod store;

pub use error::{Error, Result};
pub use event::SecretSanta;
