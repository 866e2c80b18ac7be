//! Core domain: resource vocabulary, records, ports, and the pure
//! validation and reconciliation services.

pub mod entities;
pub mod error;
pub mod ports;
pub mod services;
pub mod value_objects;
