//! Application layer: the settings workflow and the ports it depends on.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (plain data) and the infrastructure (files, sockets, templates).  Code here
//! orchestrates a user goal ("save these hook settings") while depending only
//! on traits, so the tests can swap every collaborator for a mock.
//!
//! # Sub-modules
//!
//! - **`ports`** – The traits the workflow consumes: who is asking
//!   (`AuthGate`), where settings live (`SettingsStore`), how the form is drawn
//!   (`Renderer`), and where to go after saving (`NavBuilder`).
//!
//! - **`config_controller`** – The GET and POST handlers: load, validate,
//!   and either persist-and-redirect or redisplay with field errors.

pub mod config_controller;
pub mod ports;

pub use config_controller::{ConfigController, ControllerError, ControllerResponse, FormView};
pub use ports::{AuthGate, NavBuilder, RenderError, Renderer, SettingsStore, StoreError};
