//! turnstile - request-dispatch engine for server-rendered web applications
//!
//! Maps an incoming HTTP-like request to a registered controller/action pair,
//! selects the best-matching view renderer for that pair, executes the action,
//! and produces a structured response.
//!
//! # Architecture
//!
//! - [`Request`] — parsed from a raw URI plus a map of server variables
//! - [`Response`] — status/title/body accumulator, handed to the boundary
//! - [`Controller`] — self-describing unit of actions, invoked by name
//! - [`View`] — body renderer selected by an ordered best-match filter
//! - [`Control`] — reusable render unit injected via `{identifier=name}`
//!   placeholders in the rendered body
//! - [`Dispatcher`] — the orchestrator owning the registries
//!
//! # Key Design Insights
//!
//! 1. **Self-description instead of reflection**: controllers and views
//!    return their own metadata ([`ControllerSpec`], [`ViewSpec`]) once at
//!    registration time. There is no runtime type introspection.
//!
//! 2. **Explicit dispatcher, no global state**: a [`Dispatcher`] is a plain
//!    value owned by the composition root. Tests construct a fresh one each.
//!
//! 3. **Buffered action output**: actions write into an explicit buffer on
//!    [`ActionContext`]; the dispatcher appends it to the response body.
//!
//! # Example
//!
//! ```
//! use turnstile::prelude::*;
//! use std::fmt::Write;
//!
//! struct HelloController;
//!
//! impl Controller for HelloController {
//!     fn spec(&self) -> ControllerSpec {
//!         ControllerSpec::for_type::<Self>().action(ActionSpec::new("index"))
//!     }
//!
//!     fn invoke(&self, action: &str, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
//!         match action {
//!             "index" => write!(ctx.out, "hello from {}", ctx.request.controller())?,
//!             other => return Err(format!("no such action {other}").into()),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .register_controller(HelloController)?
//!     .set_defaults("Hello", "index");
//!
//! let request = Request::parse("/hello/index", &ServerVars::new());
//! let response = dispatcher.serve(DEFAULT_APPLICATION, &ServerVars::new(), Some(request))?;
//!
//! assert_eq!(response.code(), 200);
//! assert!(response.body().contains("hello from Hello"));
//! # Ok::<(), turnstile::DispatchError>(())
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod config;
mod control;
mod controller;
mod controls;
mod default_view;
mod dispatcher;
mod error_controller;
mod request;
mod response;
mod view;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use config::DispatcherConfig;
pub use control::{Control, ControlParams, ControlRegistry, ControlSlot, ViewParams};
pub use controller::{
    simple_name, ActionContext, ActionSpec, Controller, ControllerDescriptor, ControllerSpec,
};
pub use dispatcher::Dispatcher;
pub use request::{ParamSources, Request, ServerVars};
pub use response::Response;
pub use view::{AppliesTo, PageAssets, View, ViewDescriptor, ViewSpec};

// Built-in collaborators
pub use controls::{Form, Image};
pub use default_view::DefaultView;
pub use error_controller::ErrorController;

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use turnstile::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ActionContext,
        ActionError,
        ActionSpec,
        // Traits
        Control,
        ControlParams,
        Controller,
        ControllerSpec,
        DefaultView,
        // Orchestration
        Dispatcher,
        // Errors
        DispatchError,
        PageAssets,
        ParamSources,
        // Core types
        Request,
        Response,
        ServerVars,
        View,
        ViewParams,
        ViewSpec,
        // Constants
        DEFAULT_APPLICATION,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// The application scope used when none is named explicitly.
pub const DEFAULT_APPLICATION: &str = "default";

/// Controller name used when a request path names none and no other default
/// was configured via [`Dispatcher::set_defaults`].
pub const DEFAULT_CONTROLLER: &str = "Index";

/// Action name used when a request path names none and no other default was
/// configured via [`Dispatcher::set_defaults`].
pub const DEFAULT_ACTION: &str = "index";

/// Simple name of the built-in error controller.
pub const ERROR_CONTROLLER: &str = "Error";

/// Action invoked on a controller or action miss (HTTP 404 semantics).
pub const ERROR_ACTION: &str = "error";

/// Action invoked when a dispatched action fails (HTTP 500 semantics).
pub const EXCEPTION_ACTION: &str = "exception";

/// Protocol tag used when formatting the outbound status line.
pub const HTTP_PROTOCOL: &str = "HTTP/1.1";

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Failure raised by user code during a dispatch cycle: an action body, a
/// view render, or a control render.
///
/// The first such failure per cycle is recovered by rerouting to the error
/// controller's `exception` action with the failure attached to the request.
/// A second failure is not recovered and surfaces as
/// [`DispatchError::ActionFailed`].
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from registration and dispatch.
///
/// Registration-time variants (`ControllerResolution`, `ViewResolution`) are
/// caught while wiring the application and prevent startup. Dispatch-time
/// variants terminate the current serve call only.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No request URI could be derived from the transport variables
    /// (e.g. a non-HTTP invocation context).
    #[error("no request uri provided by the transport")]
    InvalidRequest,

    /// Attempt to override a parameter key that request parsing never
    /// populated. Parameters are overridable, not freely extensible.
    #[error("parameter \"{name}\" was not populated by parsing and cannot be overridden")]
    UnknownParameter {
        /// The offending parameter name.
        name: String,
    },

    /// A controller could not be registered.
    #[error("cannot register controller \"{name}\": {reason}")]
    ControllerResolution {
        /// Simple name of the controller, as far as it could be derived.
        name: String,
        /// What the self-description check rejected.
        reason: String,
    },

    /// A view could not be registered.
    #[error("cannot register view \"{name}\": {reason}")]
    ViewResolution {
        /// Simple name of the view, as far as it could be derived.
        name: String,
        /// What the self-description check rejected.
        reason: String,
    },

    /// No registered view admits the resolved controller/action pair.
    ///
    /// The built-in default view admits everything at order 0, so this only
    /// occurs when that registration was removed or the application scope
    /// never received a view — a configuration error either way.
    #[error("no view found for request {controller}:{action}")]
    NoMatchingView {
        /// The resolved controller name.
        controller: String,
        /// The resolved action name.
        action: String,
    },

    /// The error controller's exception action itself failed while handling
    /// an earlier failure. Only the first failure per cycle is recovered.
    #[error("action {controller}:{action} failed while handling an earlier failure")]
    ActionFailed {
        /// Controller whose action failed (the error controller).
        controller: String,
        /// The action that failed.
        action: String,
        /// The underlying failure.
        #[source]
        source: ActionError,
    },

    /// Writing the response to the transport boundary failed.
    #[error("failed to transmit response")]
    Transmit(#[from] std::io::Error),
}
