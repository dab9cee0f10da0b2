//! Config types for declarative dispatcher settings.
//!
//! These mirror the runtime configuration surface of [`Dispatcher`] but are
//! serde-deserializable, so a bootstrap can load defaults, headers and
//! assets from JSON/YAML instead of calling the builder methods one by one.
//! Controllers, views and controls stay code-registered: they are
//! constructed instances, not data.

use crate::Dispatcher;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Declarative dispatcher settings.
///
/// Every field is optional; [`DispatcherConfig::apply`] only touches what
/// the config names.
///
/// ```
/// use turnstile::{Dispatcher, DispatcherConfig};
///
/// let config: DispatcherConfig = serde_json::from_str(
///     r#"{
///         "default_controller": "Site",
///         "default_headers": { "X-Powered-By": "turnstile" }
///     }"#,
/// )?;
///
/// let mut dispatcher = Dispatcher::new();
/// dispatcher.configure(&config);
/// assert_eq!(dispatcher.default_controller(), "Site");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DispatcherConfig {
    /// Default controller name for requests whose path names none.
    #[serde(default)]
    pub default_controller: Option<String>,

    /// Default action name for requests whose path names none.
    #[serde(default)]
    pub default_action: Option<String>,

    /// Headers sent with every transmitted response.
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,

    /// Parameter values forced onto every request before routing.
    #[serde(default)]
    pub client_header_overrides: BTreeMap<String, String>,

    /// Stylesheet URIs handed to views.
    #[serde(default)]
    pub css_files: Vec<String>,

    /// Script URIs handed to views.
    #[serde(default)]
    pub js_files: Vec<String>,
}

impl DispatcherConfig {
    /// Apply these settings onto a dispatcher.
    pub fn apply(&self, dispatcher: &mut Dispatcher) {
        let controller = self
            .default_controller
            .clone()
            .unwrap_or_else(|| dispatcher.default_controller().to_string());
        let action = self
            .default_action
            .clone()
            .unwrap_or_else(|| dispatcher.default_action().to_string());
        dispatcher.set_defaults(controller, action);

        for (name, value) in &self.default_headers {
            dispatcher.add_header(name.clone(), value.clone());
        }
        for (name, value) in &self.client_header_overrides {
            dispatcher.add_client_header_override(name.clone(), value.clone());
        }
        for file in &self.css_files {
            dispatcher.add_css_file(file.clone());
        }
        for file in &self.js_files {
            dispatcher.add_js_file(file.clone());
        }
    }
}

impl Dispatcher {
    /// Apply declarative settings; see [`DispatcherConfig`].
    pub fn configure(&mut self, config: &DispatcherConfig) -> &mut Self {
        config.apply(self);
        self
    }
}
