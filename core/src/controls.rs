//! Stock controls: a basic form and an image tag.

use crate::{ActionError, Control, ControlParams, Request};
use std::fmt::Write;

/// Lower-case the first character, ASCII-style.
fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// A string entry from a parameter bag.
fn str_param<'a>(params: &'a ControlParams, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|value| value.as_str())
}

/// A very basic form control.
///
/// The form action defaults to `<context-prefix><controller>/<action>` with
/// lower-cased first letters, overridable through the `controller`,
/// `action` or `formAction` bag entries. `fields` and `buttons` are arrays
/// of objects; each needs at least a `name`.
#[derive(Debug, Default)]
pub struct Form;

impl Control for Form {
    fn render(&self, request: &Request, params: &ControlParams) -> Result<String, ActionError> {
        let prefix = request.context_prefix().unwrap_or("/");

        let controller = str_param(params, "controller")
            .map(str::to_string)
            .unwrap_or_else(|| lcfirst(request.controller()));
        let action = str_param(params, "action")
            .map(str::to_string)
            .unwrap_or_else(|| lcfirst(request.action()));

        let form_action = match str_param(params, "formAction") {
            Some(explicit) => explicit.to_string(),
            None => format!("{prefix}{controller}/{action}"),
        };
        let method = str_param(params, "formMethod").unwrap_or("POST");
        let class_attr = str_param(params, "formClass")
            .map(|class| format!(" class=\"{class}\""))
            .unwrap_or_default();

        let mut rendered = format!("<form action=\"{form_action}\" method=\"{method}\"{class_attr}>");

        for field in params
            .get("fields")
            .and_then(|value| value.as_array())
            .into_iter()
            .flatten()
        {
            let name = field
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or("form field must have at least a name")?;
            let field_type = field.get("type").and_then(|v| v.as_str()).unwrap_or("text");
            let id = field.get("id").and_then(|v| v.as_str()).unwrap_or(name);
            let class = field.get("class").and_then(|v| v.as_str()).unwrap_or(name);
            write!(
                rendered,
                "<input type=\"{field_type}\" id=\"{id}\" class=\"{class}\" name=\"{name}\"/>"
            )?;
        }

        for button in params
            .get("buttons")
            .and_then(|value| value.as_array())
            .into_iter()
            .flatten()
        {
            let name = button
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or("form button must have at least a name")?;
            let button_type = button
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("submit");
            let id = button.get("id").and_then(|v| v.as_str()).unwrap_or(name);
            let class = button.get("class").and_then(|v| v.as_str()).unwrap_or(name);
            let label = button.get("label").and_then(|v| v.as_str()).unwrap_or(name);
            write!(
                rendered,
                "<button type=\"{button_type}\" id=\"{id}\" class=\"{class}\" name=\"{name}\">{label}</button>"
            )?;
        }

        rendered.push_str("</form>");
        Ok(rendered)
    }
}

/// An image tag control, usually stored as a pre-built instance.
#[derive(Debug, Default)]
pub struct Image {
    image_url: String,
    alternate_text: String,
}

impl Image {
    /// Create an image control for the given URL and alternative text.
    pub fn new(image_url: impl Into<String>, alternate_text: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            alternate_text: alternate_text.into(),
        }
    }
}

impl Control for Image {
    fn render(&self, _request: &Request, _params: &ControlParams) -> Result<String, ActionError> {
        Ok(format!(
            "<img src=\"{}\" alt=\"{}\"/>",
            self.image_url, self.alternate_text
        ))
    }
}
