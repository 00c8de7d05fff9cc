//! Handlebars renderer for the settings form.
//!
//! The form shows one text input per field.  Fields come from three places,
//! in this order, without duplicates:
//!
//! 1. the form layout (the fields the hook knows about),
//! 2. any other field present in the displayed [`FieldMap`],
//! 3. any other field that has error messages.
//!
//! Values and messages are HTML-escaped by handlebars.

use handlebars::Handlebars;
use serde::Serialize;

use crate::application::config_controller::{FormView, FORM_CONTEXT_ID, FORM_TEMPLATE_ID};
use crate::application::ports::{RenderError, Renderer};

const FORM_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Commit checker settings</title>
</head>
<body>
<form method="post" action="" class="aui" data-context="{{contextId}}">
{{#each fields}}
  <div class="field-group{{#if errors}} has-error{{/if}}">
    <label for="{{name}}">{{name}}</label>
    <input class="text" type="text" id="{{name}}" name="{{name}}" value="{{value}}">
    {{#each errors}}
    <div class="error">{{this}}</div>
    {{/each}}
  </div>
{{/each}}
  <div class="buttons">
    <input class="button submit" type="submit" name="submit" value="Save">
  </div>
</form>
</body>
</html>
"#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateData<'a> {
    context_id: &'a str,
    fields: Vec<FieldRow<'a>>,
}

#[derive(Serialize)]
struct FieldRow<'a> {
    name: &'a str,
    value: &'a str,
    errors: &'a [String],
}

/// [`Renderer`] backed by a handlebars registry.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
    layout: Vec<String>,
}

impl HandlebarsRenderer {
    /// Creates a renderer with the built-in form template.
    ///
    /// `layout` lists the fields that are always shown, in display order.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Template`] if the built-in template fails to
    /// compile.
    pub fn new(layout: Vec<String>) -> Result<Self, RenderError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(FORM_TEMPLATE_ID, FORM_TEMPLATE)
            .map_err(|e| RenderError::Template(e.to_string()))?;
        Ok(Self { registry, layout })
    }

    fn rows<'a>(&'a self, view: &'a FormView) -> Vec<FieldRow<'a>> {
        let mut names: Vec<&str> = Vec::new();
        let layout = self.layout.iter().map(String::as_str);
        let configured = view.config.iter().map(|(name, _)| name);
        let errored = view.errors.iter().map(|(name, _)| name);
        for name in layout.chain(configured).chain(errored) {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        names
            .into_iter()
            .map(|name| FieldRow {
                name,
                value: view.config.get(name).unwrap_or(""),
                errors: view.errors.get(name).unwrap_or(&[]),
            })
            .collect()
    }
}

impl Renderer for HandlebarsRenderer {
    fn render(
        &self,
        template_id: &str,
        context_id: &str,
        view: &FormView,
    ) -> Result<String, RenderError> {
        if !self.registry.has_template(template_id) {
            return Err(RenderError::Template(format!(
                "unknown template {template_id}"
            )));
        }
        if context_id != FORM_CONTEXT_ID {
            return Err(RenderError::Template(format!(
                "template {template_id} cannot render in context {context_id}"
            )));
        }

        let data = TemplateData {
            context_id,
            fields: self.rows(view),
        };
        self.registry
            .render(template_id, &data)
            .map_err(|e| RenderError::Template(e.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
