//! ConfigController: the validate-then-persist settings workflow.
//!
//! # Request lifecycle (for beginners)
//!
//! Every GET or POST walks through the same small state machine:
//!
//! ```text
//! Unauthenticated ──► Authorized ──► Validating ──┬──► Persisted ──► Redirected
//!        │                                        │
//!        └──► Unauthorized                        └──► Redisplayed
//! ```
//!
//! - `Unauthorized`: no signed-in user, or the user is not an administrator.
//!   Nothing is loaded, saved, or rendered.
//! - `Validating`: the [`Validator`] runs against a [`FieldMap`] that belongs
//!   to this request alone.
//! - `Persisted`/`Redirected`: a POST with zero field errors replaces the
//!   stored snapshot and sends the browser to the add-ons page.
//! - `Redisplayed`: the form is drawn again with the values and errors of
//!   this request.
//!
//! # No per-request fields on the controller
//!
//! The field map and the field errors are local values threaded through the
//! handler calls.  A single `ConfigController` can therefore be shared by all
//! connection tasks without any locking.

use std::io::{self, Write};
use std::sync::Arc;

use hookcfg_core::{validate_fields, FieldErrors, FieldMap, UserIdentity, Validator};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::application::ports::{
    AuthGate, NavBuilder, RenderError, Renderer, SettingsStore, StoreError,
};
use crate::domain::request::RequestContext;

/// Template that draws the settings form.
pub const FORM_TEMPLATE_ID: &str = "hookcfg.config-serverside";

/// Rendering context the form template is drawn in.
pub const FORM_CONTEXT_ID: &str = "repository.hook.ref.config";

/// Data handed to the [`Renderer`]: a field map and the errors computed
/// against it.  The two always travel together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub config: FieldMap,
    pub errors: FieldErrors,
}

/// Terminal outcome of a handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerResponse {
    /// The caller is not an administrator; nothing was processed.
    Unauthorized,
    /// The form was written to the output.
    Rendered,
    /// The settings were saved; continue at this location.
    Redirect(String),
}

/// Failures that end a request with a server error.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Rendering or writing the form hit an I/O failure.
    #[error("I/O failure while rendering settings form: {0}")]
    Io(#[from] io::Error),

    /// Any other rendering failure.
    #[error("failed to render settings form: {0}")]
    Processing(String),

    /// The settings snapshot could not be read or written.
    #[error("settings store failure: {0}")]
    Store(#[from] StoreError),
}

impl From<RenderError> for ControllerError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Io(io) => Self::Io(io),
            RenderError::Template(msg) => Self::Processing(msg),
        }
    }
}

/// Handles the settings page's GET and POST requests.
pub struct ConfigController {
    auth: Arc<dyn AuthGate>,
    store: Arc<dyn SettingsStore>,
    validator: Arc<dyn Validator>,
    renderer: Arc<dyn Renderer>,
    nav: Arc<dyn NavBuilder>,
    settings_key: String,
}

impl ConfigController {
    pub fn new(
        auth: Arc<dyn AuthGate>,
        store: Arc<dyn SettingsStore>,
        validator: Arc<dyn Validator>,
        renderer: Arc<dyn Renderer>,
        nav: Arc<dyn NavBuilder>,
        settings_key: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            store,
            validator,
            renderer,
            nav,
            settings_key: settings_key.into(),
        }
    }

    /// GET: shows the stored settings together with their current errors.
    ///
    /// A key that was never saved displays as an empty form.  The stored
    /// snapshot is re-validated without an actor, so stale settings that no
    /// longer pass the rules are flagged on display.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Store`] if the snapshot cannot be read, and
    /// [`ControllerError::Io`]/[`ControllerError::Processing`] if the form
    /// cannot be rendered or written to `out`.
    pub fn handle_load(
        &self,
        ctx: &RequestContext,
        out: &mut dyn Write,
    ) -> Result<ControllerResponse, ControllerError> {
        debug!(request = %ctx.id, "handle_load");

        if self.authorize(ctx).is_none() {
            return Ok(ControllerResponse::Unauthorized);
        }

        let fields = match self.store.load(&self.settings_key)? {
            Some(blob) => FieldMap::from_stored(&blob),
            None => FieldMap::new(),
        };

        let report = validate_fields(self.validator.as_ref(), &fields, None);
        self.display(
            FormView {
                config: fields,
                errors: report.field_errors,
            },
            out,
        )?;
        Ok(ControllerResponse::Rendered)
    }

    /// POST: validates the submitted form and saves it when every field passes.
    ///
    /// `form` holds the decoded `(name, value)` pairs in arrival order.  The
    /// submit button and empty values are dropped before validation.  On any
    /// field error the submitted values are redisplayed and the stored
    /// snapshot is left as it was.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Store`] if the snapshot cannot be written, and
    /// [`ControllerError::Io`]/[`ControllerError::Processing`] if the
    /// redisplayed form cannot be rendered.
    pub fn handle_submit(
        &self,
        ctx: &RequestContext,
        form: &[(String, String)],
        out: &mut dyn Write,
    ) -> Result<ControllerResponse, ControllerError> {
        debug!(request = %ctx.id, "handle_submit");

        let Some(user) = self.authorize(ctx) else {
            return Ok(ControllerResponse::Unauthorized);
        };

        let fields = FieldMap::from_form(form.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let report = validate_fields(self.validator.as_ref(), &fields, Some(&user));

        if !report.is_valid() {
            debug!(
                request = %ctx.id,
                "submission rejected with {} field error(s)",
                report.field_errors.len()
            );
            self.display(
                FormView {
                    config: fields,
                    errors: report.field_errors,
                },
                out,
            )?;
            return Ok(ControllerResponse::Rendered);
        }

        for (name, value) in fields.iter() {
            debug!("save plugin config {name}={value}");
        }
        self.store.save(&self.settings_key, &fields)?;

        let redirect = self.nav.addons();
        debug!("redirect: {redirect}");
        Ok(ControllerResponse::Redirect(redirect))
    }

    /// `true` when the caller is a signed-in administrator.
    ///
    /// Lets the listener decide whether a request it rejects on its own
    /// (wrong method or media type) should instead be answered as
    /// unauthorized.
    pub fn is_authorized(&self, ctx: &RequestContext) -> bool {
        self.authorize(ctx).is_some()
    }

    /// Returns the caller when they are a signed-in administrator.
    fn authorize(&self, ctx: &RequestContext) -> Option<UserIdentity> {
        let Some(user) = self.auth.current_user(ctx) else {
            debug!(request = %ctx.id, "no remote user");
            return None;
        };
        if !self.auth.is_administrator(&user) {
            debug!(request = %ctx.id, "user {user} is not an administrator");
            return None;
        }
        Some(user)
    }

    fn display(&self, view: FormView, out: &mut dyn Write) -> Result<(), ControllerError> {
        debug!("config fields: {:?}", view.config);
        debug!("field errors: {:?}", view.errors);

        let html = self
            .renderer
            .render(FORM_TEMPLATE_ID, FORM_CONTEXT_ID, &view)?;
        out.write_all(html.as_bytes())?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
