//! Module for reading ISP instances
pub mod json;
