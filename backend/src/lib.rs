//! In-memory todo service: domain store plus the HTTP layer around it.

pub mod domain;
pub mod rest;
