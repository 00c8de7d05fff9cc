//! Domain entities for the settings form.
//!
//! Everything in here is a plain value: no I/O, no clocks, no globals.  A
//! request handler builds these, passes them around by reference, and drops
//! them when the request is finished.

pub mod field_errors;
pub mod field_map;
pub mod identity;
