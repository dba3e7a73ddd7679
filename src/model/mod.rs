//! Data model.
//!
//! * [`db`]: records as stored.
//! * [`api`]: payloads and views exchanged with clients, plus authentication.
//! * [`store`]: persistence behind repository traits.
//! * [`mongodb`]: MongoDB collection plumbing for the production store.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
pub mod store;
