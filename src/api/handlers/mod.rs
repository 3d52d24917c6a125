//! HTTP handlers
//!
//! Handlers are thin: extract, call the service, shape the JSON body.

pub mod admin;
pub mod auth;
pub mod doctor;
pub mod index;
pub mod nurse;
pub mod user;
