//! # beveiligd
//!
//! Staff web application: quotes for managers, employee records for
//! warehouse and helpdesk staff, everything else for any logged-in user.
//!
//! - [`settings`] - figment-based configuration
//! - [`security`] - access policy and middleware wiring
//! - [`handlers`] - routes

pub mod handlers;
pub mod security;
pub mod settings;
