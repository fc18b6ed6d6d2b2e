//! Domain core for property listings ("biens").
//!
//! This crate owns the listing aggregate and nothing else: building a
//! canonical record from a creation payload, merging partial updates into
//! it field by field, and projecting it back out for persistence or for
//! API consumers. Routing, persistence and auth live in the surrounding
//! services and talk to this crate through the DTOs in [`dtos`].

pub mod dtos;
pub mod error;
pub mod models;
pub mod utils;

pub use error::BienError;
pub use models::propertymodel::Bien;

pub type Result<T> = std::result::Result<T, BienError>;
