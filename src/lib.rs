//! Reports and bulk maintenance jobs for an Odoo instance, spoken over JSON-RPC.
//!
//! [`odoo::Odoo`] is the connection; everything else is generic over
//! [`odoo::ObjectRpc`] so it can run against any implementation of the object service.

pub mod api;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod models;
pub mod odoo;
pub mod pricelist;
pub mod putaway;
pub mod reports;

pub use error::{Error, Result};
