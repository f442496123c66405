//! Request-handling core: media delivery and listing aggregation.

pub mod delivery_service;
pub mod listing_service;
