//! SQLite persistence for site swap records

pub mod site_store;

pub use site_store::{GroupColumn, SiteStore};
