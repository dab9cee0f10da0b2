//! Controller — self-describing unit of web-reachable actions
//!
//! A controller exposes its metadata once, at registration time, through
//! [`Controller::spec`]: which actions are reachable and what response
//! type/title each one carries. The dispatcher caches the result in a
//! [`ControllerDescriptor`] and never introspects the type again.

use crate::control::ViewParams;
use crate::request::ucfirst;
use crate::{ActionError, DispatchError, Request, Response};

/// Metadata for one web-reachable action.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    name: String,
    response_type: Option<String>,
    title: Option<String>,
}

impl ActionSpec {
    /// Declare an action reachable under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response_type: None,
            title: None,
        }
    }

    /// Set the response MIME type applied before the action runs.
    #[must_use]
    pub fn with_response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    /// Set the page title applied before the action runs.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The action name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The response MIME type, if declared.
    pub fn response_type(&self) -> Option<&str> {
        self.response_type.as_deref()
    }

    /// The page title, if declared.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// Self-description of a controller: its simple name and eligible actions.
#[derive(Debug, Clone)]
pub struct ControllerSpec {
    name: String,
    actions: Vec<ActionSpec>,
}

impl ControllerSpec {
    /// Describe a controller under an explicit simple name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// Describe a controller named after the implementing type: the type's
    /// simple name with a trailing `Controller` token stripped and the
    /// first letter upper-cased (see [`simple_name`]).
    #[must_use]
    pub fn for_type<T: ?Sized>() -> Self {
        Self::new(simple_name(std::any::type_name::<T>()))
    }

    /// Add an eligible action.
    #[must_use]
    pub fn action(mut self, action: ActionSpec) -> Self {
        self.actions.push(action);
        self
    }

    /// The controller simple name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The eligible actions.
    pub fn actions(&self) -> &[ActionSpec] {
        &self.actions
    }
}

/// Derive a controller simple name from a (possibly fully qualified) type
/// name: path and generics stripped, a trailing `Controller` token removed,
/// first letter upper-cased.
///
/// ```
/// assert_eq!(turnstile::simple_name("app::web::loginController"), "Login");
/// assert_eq!(turnstile::simple_name("ErrorController"), "Error");
/// ```
#[must_use]
pub fn simple_name(type_name: &str) -> String {
    let short = type_name.rsplit("::").next().unwrap_or(type_name);
    let short = short.split('<').next().unwrap_or(short);
    let stripped = short.strip_suffix("Controller").unwrap_or(short);
    ucfirst(stripped)
}

/// Everything an action may touch while it runs.
///
/// Text written to `out` is buffered for the duration of the call and
/// appended to the response body afterwards; `response` is available for
/// status/title/header changes, and `view_params` stores the parameter bags
/// consumed by placeholder expansion.
pub struct ActionContext<'a> {
    /// The request being dispatched.
    pub request: &'a Request,
    /// The response under construction.
    pub response: &'a mut Response,
    /// Buffered action output; appended to the body after the call.
    pub out: &'a mut String,
    /// Parameter bags for controls referenced by placeholders.
    pub view_params: &'a mut ViewParams,
}

/// A unit grouping related actions, resolved by name from the request's
/// first path segment.
///
/// Implementations are registered as constructed instances; the capability
/// check happens at compile time through this trait, and the action set is
/// whatever [`Controller::spec`] declares.
pub trait Controller: Send + Sync {
    /// Self-description, computed once at registration time.
    fn spec(&self) -> ControllerSpec;

    /// Run the named action.
    ///
    /// Called only with action names the spec declared; a defensive
    /// implementation may still return an error for anything else.
    ///
    /// # Errors
    ///
    /// Any failure is recovered once per dispatch cycle by rerouting to the
    /// error controller's `exception` action.
    fn invoke(&self, action: &str, ctx: &mut ActionContext<'_>) -> Result<(), ActionError>;
}

/// Registry entry for one controller: the cached spec plus the instance.
pub struct ControllerDescriptor {
    spec: ControllerSpec,
    instance: Box<dyn Controller>,
}

impl ControllerDescriptor {
    /// Cache a controller's self-description for registration.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ControllerResolution`] when the derived name is
    /// empty or the action list declares a name twice.
    pub fn describe(instance: Box<dyn Controller>) -> Result<Self, DispatchError> {
        let spec = instance.spec();
        if spec.name().is_empty() {
            return Err(DispatchError::ControllerResolution {
                name: String::new(),
                reason: "derived controller name is empty".to_string(),
            });
        }
        for (i, action) in spec.actions().iter().enumerate() {
            if spec.actions()[..i].iter().any(|a| a.name() == action.name()) {
                return Err(DispatchError::ControllerResolution {
                    name: spec.name().to_string(),
                    reason: format!("action \"{}\" is declared twice", action.name()),
                });
            }
        }
        Ok(Self { spec, instance })
    }

    /// The controller simple name.
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Whether the named action is eligible.
    pub fn has_action(&self, action: &str) -> bool {
        self.spec.actions().iter().any(|a| a.name() == action)
    }

    /// Metadata for the named action, if eligible.
    pub fn action_spec(&self, action: &str) -> Option<&ActionSpec> {
        self.spec.actions().iter().find(|a| a.name() == action)
    }

    /// Run the named action on the registered instance.
    pub(crate) fn invoke(
        &self,
        action: &str,
        ctx: &mut ActionContext<'_>,
    ) -> Result<(), ActionError> {
        self.instance.invoke(action, ctx)
    }
}

impl std::fmt::Debug for ControllerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerDescriptor")
            .field("name", &self.spec.name())
            .field("actions", &self.spec.actions().len())
            .finish()
    }
}
