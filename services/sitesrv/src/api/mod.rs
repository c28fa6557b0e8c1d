//! HTTP API handlers for Site Service

pub mod health_handlers;
pub mod site_handlers;
pub mod upload_handlers;
