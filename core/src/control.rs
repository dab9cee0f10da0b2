//! Control — reusable render units injected via textual placeholders
//!
//! A rendered body may contain tokens of the literal shape
//! `{identifier=name}`. During an action, parameter bags (or pre-built
//! control instances) are stored in [`ViewParams`] under
//! `(identifier, name)`; after the view has rendered, the expansion pass
//! replaces each token with the control's output — or removes it silently
//! when nothing was registered or stored for it.

use crate::{ActionError, Request};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Parameter bag handed to a control's render operation.
pub type ControlParams = serde_json::Map<String, serde_json::Value>;

/// A small reusable render unit invoked via a placeholder inside a
/// controller's output.
pub trait Control: Send + Sync {
    /// Render the control for the given request and parameter bag.
    ///
    /// # Errors
    ///
    /// A failure is recovered once per dispatch cycle by rerouting to the
    /// error controller's `exception` action.
    fn render(&self, request: &Request, params: &ControlParams) -> Result<String, ActionError>;
}

/// What an action stored for one `(identifier, name)` placeholder slot.
pub enum ControlSlot {
    /// A parameter bag; the control is resolved from the registry.
    Params(ControlParams),
    /// A pre-built control instance, rendered directly with an empty bag.
    Instance(Box<dyn Control>),
}

impl std::fmt::Debug for ControlSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Params(params) => f.debug_tuple("Params").field(&params.len()).finish(),
            Self::Instance(_) => f.debug_tuple("Instance").finish(),
        }
    }
}

/// Per-dispatch store of placeholder slots, filled by the running action.
#[derive(Debug, Default)]
pub struct ViewParams {
    slots: HashMap<(String, String), ControlSlot>,
}

impl ViewParams {
    /// Store a parameter bag for the `{identifier=name}` placeholder.
    pub fn insert_params(
        &mut self,
        identifier: impl Into<String>,
        name: impl Into<String>,
        params: ControlParams,
    ) {
        self.slots
            .insert((identifier.into(), name.into()), ControlSlot::Params(params));
    }

    /// Store a pre-built control for the `{identifier=name}` placeholder.
    pub fn insert_control(
        &mut self,
        identifier: impl Into<String>,
        name: impl Into<String>,
        control: Box<dyn Control>,
    ) {
        self.slots.insert(
            (identifier.into(), name.into()),
            ControlSlot::Instance(control),
        );
    }

    /// The slot stored under `(identifier, name)`, if any.
    pub fn get(&self, identifier: &str, name: &str) -> Option<&ControlSlot> {
        self.slots
            .get(&(identifier.to_string(), name.to_string()))
    }

    /// Whether no slots were stored.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Factory producing a fresh control instance per expansion.
type ControlFactory = Box<dyn Fn() -> Box<dyn Control> + Send + Sync>;

/// Named control implementations, registered at startup and shared
/// read-only during dispatch.
#[derive(Default)]
pub struct ControlRegistry {
    factories: HashMap<String, ControlFactory>,
}

impl ControlRegistry {
    /// Register a control factory under an identifier. An existing
    /// registration is replaced.
    pub fn register<F>(&mut self, identifier: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Control> + Send + Sync + 'static,
    {
        self.factories.insert(identifier.into(), Box::new(factory));
    }

    /// Whether an identifier is registered.
    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// Build a fresh instance of the identified control.
    pub fn create(&self, identifier: &str) -> Option<Box<dyn Control>> {
        self.factories.get(identifier).map(|factory| factory())
    }
}

impl std::fmt::Debug for ControlRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlRegistry")
            .field("identifiers", &self.factories.len())
            .finish()
    }
}

/// Expand every `{identifier=name}` token in `body`.
///
/// One forward scan: each token is consumed exactly once and rendered
/// output is never rescanned, so a body with N tokens takes exactly N
/// replacement/removal iterations and expansion always terminates.
/// Malformed nested braces are out of scope. A body without tokens is
/// returned unchanged.
///
/// # Errors
///
/// Propagates the first control render failure.
pub(crate) fn expand_placeholders(
    body: &str,
    request: &Request,
    params: &ViewParams,
    controls: &ControlRegistry,
) -> Result<String, ActionError> {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    let token = TOKEN.get_or_init(|| {
        Regex::new(r"\{([A-Za-z0-9_-]+)=([A-Za-z0-9_-]+)\}").expect("token pattern is valid")
    });

    let mut expanded = String::with_capacity(body.len());
    let mut last_end = 0;
    for caps in token.captures_iter(body) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        expanded.push_str(&body[last_end..whole.start()]);
        last_end = whole.end();

        let identifier = &caps[1];
        let name = &caps[2];

        // Unregistered identifier or missing slot: drop the token silently.
        if !controls.contains(identifier) {
            continue;
        }
        match params.get(identifier, name) {
            None => continue,
            Some(ControlSlot::Instance(control)) => {
                expanded.push_str(&control.render(request, &ControlParams::new())?);
            }
            Some(ControlSlot::Params(bag)) => {
                if let Some(control) = controls.create(identifier) {
                    expanded.push_str(&control.render(request, bag)?);
                }
            }
        }
    }
    expanded.push_str(&body[last_end..]);
    Ok(expanded)
}
