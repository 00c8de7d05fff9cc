//! # hookcfg-core
//!
//! Shared library for the repository hook settings form.  It holds the value
//! types that flow through a settings request and the contract every
//! validator implements.
//!
//! This crate has zero dependencies on sockets, files, or templating.
//!
//! # Architecture overview (for beginners)
//!
//! An administrator opens the hook's settings page, edits a handful of text
//! fields, and presses *Save*.  The submission is checked by a validator; if
//! every field is acceptable the new settings replace the stored ones,
//! otherwise the form comes back with a message next to each bad field.
//!
//! This crate (`hookcfg-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – The data that travels through one request: the
//!   [`FieldMap`] of submitted or stored values, the [`FieldErrors`] produced
//!   for it, and the [`UserIdentity`] of the person asking.
//!
//! - **`validation`** – The [`Validator`] contract, the structured
//!   [`FieldCheck`] outcome of a single field rule, and a ready-made
//!   [`RuleSetValidator`] built from small reusable rules.

pub mod domain;
pub mod validation;

// Re-export the most-used types at the crate root so callers can write
// `hookcfg_core::FieldMap` instead of `hookcfg_core::domain::field_map::FieldMap`.
pub use domain::field_errors::FieldErrors;
pub use domain::field_map::{FieldMap, RESERVED_SUBMIT_FIELD};
pub use domain::identity::UserIdentity;
pub use validation::rules::{
    BooleanRule, MaxLengthRule, PatternRule, RuleSetValidator, INVALID_BOOLEAN_MESSAGE,
    INVALID_PATTERN_MESSAGE,
};
pub use validation::{
    validate_fields, FieldCheck, FieldRule, Finding, SuppressedFault, ValidationReport, Validator,
};
