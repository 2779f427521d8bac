//! Movie catalog web application.
mod admin;
mod auth;
mod catalog;
mod client_ip;
mod config;
mod db;
mod endpoints;
pub mod error;
mod metrics;
mod models;
mod rating;
mod review;
mod serve;

pub use error::Error;
pub use serve::run;
pub(crate) use serve::{AppState, Db, Result};
