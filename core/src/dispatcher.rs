//! Dispatcher — resolves, invokes and renders one request at a time
//!
//! The dispatcher owns the controller/view/control registries, partitioned
//! by application name. It is an explicitly constructed value: the
//! composition root builds one, registers everything during startup, then
//! serves. Registration takes `&mut self` and serving `&self`, so the
//! borrow checker enforces the register-before-serve discipline; the
//! registries are read-mostly afterwards and concurrent mutation while
//! serving must be serialized externally.
//!
//! One request is processed synchronously start to finish; there is no
//! intra-request parallelism and no suspension point. Each serve call owns
//! its request/response pair exclusively.

use crate::control::{expand_placeholders, ControlRegistry};
use crate::controller::{ActionContext, ControllerDescriptor};
use crate::view::{PageAssets, ViewDescriptor, ViewRegistry};
use crate::{
    ActionError, Control, Controller, DefaultView, DispatchError, ErrorController, ParamSources,
    Request, Response, ServerVars, View, ViewParams, DEFAULT_ACTION, DEFAULT_APPLICATION,
    DEFAULT_CONTROLLER, ERROR_ACTION, ERROR_CONTROLLER, EXCEPTION_ACTION,
};
use std::collections::HashMap;
use std::io;

/// The application core: registries plus the serve operation.
#[derive(Debug)]
pub struct Dispatcher {
    /// Controllers by application name, then by simple name.
    controllers: HashMap<String, HashMap<String, ControllerDescriptor>>,
    /// Views by application name.
    views: HashMap<String, ViewRegistry>,
    /// Controls by identifier, shared across applications.
    controls: ControlRegistry,
    /// Built-in error controller, used when an application scope has no
    /// controller registered under the `Error` name.
    fallback_error: ControllerDescriptor,
    default_controller: String,
    default_action: String,
    /// Headers sent with every transmitted response, in insertion order.
    default_headers: Vec<(String, String)>,
    /// Parameter overrides forced onto every request before routing.
    client_header_overrides: Vec<(String, String)>,
    /// Css/js files handed to views.
    assets: PageAssets,
}

impl Dispatcher {
    /// Create a dispatcher with the built-in error controller and default
    /// view registered under the `default` application.
    #[must_use]
    pub fn new() -> Self {
        let mut dispatcher = Self {
            controllers: HashMap::new(),
            views: HashMap::new(),
            controls: ControlRegistry::default(),
            fallback_error: ControllerDescriptor::describe(Box::new(ErrorController))
                .expect("built-in error controller is well-formed"),
            default_controller: DEFAULT_CONTROLLER.to_string(),
            default_action: DEFAULT_ACTION.to_string(),
            default_headers: Vec::new(),
            client_header_overrides: Vec::new(),
            assets: PageAssets::default(),
        };
        dispatcher
            .register_controller(ErrorController)
            .and_then(|d| d.register_view(DefaultView))
            .expect("built-in registrations are well-formed");
        dispatcher
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Registration surface
    // ═══════════════════════════════════════════════════════════════════════

    /// Register a controller under the `default` application.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ControllerResolution`] when the self-description is
    /// rejected.
    pub fn register_controller<C: Controller + 'static>(
        &mut self,
        controller: C,
    ) -> Result<&mut Self, DispatchError> {
        self.register_controller_in(DEFAULT_APPLICATION, controller)
    }

    /// Register a controller under a named application.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ControllerResolution`] when the self-description is
    /// rejected.
    pub fn register_controller_in<C: Controller + 'static>(
        &mut self,
        application: &str,
        controller: C,
    ) -> Result<&mut Self, DispatchError> {
        let descriptor = ControllerDescriptor::describe(Box::new(controller))?;
        tracing::debug!(
            application,
            controller = descriptor.name(),
            "registering controller"
        );
        self.controllers
            .entry(application.to_string())
            .or_default()
            .insert(descriptor.name().to_string(), descriptor);
        Ok(self)
    }

    /// Register a view under the `default` application with its intrinsic
    /// order.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ViewResolution`] when the self-description is
    /// rejected.
    pub fn register_view<V: View + 'static>(
        &mut self,
        view: V,
    ) -> Result<&mut Self, DispatchError> {
        self.register_view_in(DEFAULT_APPLICATION, view, None)
    }

    /// Register a view under a named application. An explicit `order`
    /// overrides the view's intrinsic default.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ViewResolution`] when the self-description is
    /// rejected.
    pub fn register_view_in<V: View + 'static>(
        &mut self,
        application: &str,
        view: V,
        order: Option<i32>,
    ) -> Result<&mut Self, DispatchError> {
        let descriptor = ViewDescriptor::describe(Box::new(view), order)?;
        tracing::debug!(
            application,
            view = descriptor.name(),
            order = descriptor.order(),
            "registering view"
        );
        self.views
            .entry(application.to_string())
            .or_default()
            .add(descriptor);
        Ok(self)
    }

    /// Unregister a view from the `default` application. Idempotent.
    pub fn unregister_view(&mut self, name: &str, order: i32) -> &mut Self {
        self.unregister_view_in(DEFAULT_APPLICATION, name, order)
    }

    /// Unregister a view from a named application. Idempotent; absence is
    /// not an error.
    pub fn unregister_view_in(&mut self, application: &str, name: &str, order: i32) -> &mut Self {
        if let Some(registry) = self.views.get_mut(application) {
            registry.remove(name, order);
        }
        self
    }

    /// Register a control factory under an identifier.
    pub fn register_view_control<F>(&mut self, identifier: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Control> + Send + Sync + 'static,
    {
        self.controls.register(identifier, factory);
        self
    }

    /// Set the controller/action names used when a request path names none.
    pub fn set_defaults(
        &mut self,
        default_controller: impl Into<String>,
        default_action: impl Into<String>,
    ) -> &mut Self {
        self.default_controller = default_controller.into();
        self.default_action = default_action.into();
        self
    }

    /// Add a header sent with every transmitted response. An existing
    /// header of the same name is overwritten in place.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        upsert(&mut self.default_headers, name.into(), value.into());
        self
    }

    /// Force a parameter value onto every request before routing,
    /// regardless of client input.
    ///
    /// The [`Request::set_param`] contract applies: a request that never
    /// populated the key makes the serve call fail with
    /// [`DispatchError::UnknownParameter`].
    pub fn add_client_header_override(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        upsert(&mut self.client_header_overrides, name.into(), value.into());
        self
    }

    /// Add a stylesheet URI handed to views.
    pub fn add_css_file(&mut self, file: impl Into<String>) -> &mut Self {
        self.assets.css_files.push(file.into());
        self
    }

    /// Add a script URI handed to views.
    pub fn add_js_file(&mut self, file: impl Into<String>) -> &mut Self {
        self.assets.js_files.push(file.into());
        self
    }

    /// The configured default controller name.
    pub fn default_controller(&self) -> &str {
        &self.default_controller
    }

    /// The configured default action name.
    pub fn default_action(&self) -> &str {
        &self.default_action
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Dispatch
    // ═══════════════════════════════════════════════════════════════════════

    /// Serve one request.
    ///
    /// When `request` is `None` it is derived from `server_vars` via
    /// [`Request::parse_from_transport_with`]. Routing then resolves the
    /// controller/action pair, substituting the error controller's `error`
    /// action on a miss (HTTP 404 semantics — a routing decision, not a
    /// fault), selects the best-matching view, invokes the action with a
    /// buffered writer, lets the view render, and expands placeholders.
    ///
    /// The first failure raised by the action, the view or a control is
    /// recovered: it is attached to the request and the error controller's
    /// `exception` action runs through the same pipeline. A failure inside
    /// that fallback is not recovered.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidRequest`] when no request could be derived,
    /// [`DispatchError::UnknownParameter`] when a configured override names
    /// a parameter the request never populated,
    /// [`DispatchError::NoMatchingView`] when no registered view admits the
    /// resolved pair, and [`DispatchError::ActionFailed`] when the
    /// exception fallback itself failed.
    pub fn serve(
        &self,
        application: &str,
        server_vars: &ServerVars,
        request: Option<Request>,
    ) -> Result<Response, DispatchError> {
        let mut request = match request {
            Some(request) => request,
            None => Request::parse_from_transport_with(
                server_vars,
                &ParamSources::default(),
                &self.default_controller,
                &self.default_action,
            )?,
        };

        for (name, value) in &self.client_header_overrides {
            request.set_param(name, value.clone())?;
        }

        let remote = request.remote_host().unwrap_or("-").to_string();
        tracing::debug!(
            remote = remote.as_str(),
            controller = request.controller(),
            action = request.action(),
            "resolving request"
        );

        let registry = self.controllers.get(application);
        let (mut descriptor, mut action) = match registry.and_then(|m| m.get(request.controller()))
        {
            Some(descriptor) => (descriptor, request.action().to_string()),
            None => {
                tracing::error!(
                    remote = remote.as_str(),
                    controller = request.controller(),
                    "no such controller"
                );
                (
                    self.error_descriptor(application),
                    ERROR_ACTION.to_string(),
                )
            }
        };
        if !descriptor.has_action(&action) {
            tracing::error!(remote = remote.as_str(), action = action.as_str(), "no such action");
            descriptor = self.error_descriptor(application);
            action = ERROR_ACTION.to_string();
        }

        tracing::debug!(
            remote = remote.as_str(),
            controller = descriptor.name(),
            action = action.as_str(),
            "routing request"
        );

        let view = self
            .views
            .get(application)
            .and_then(|registry| registry.select_best(descriptor.name(), &action))
            .ok_or_else(|| DispatchError::NoMatchingView {
                controller: descriptor.name().to_string(),
                action: action.clone(),
            })?;

        let response = match self.call(descriptor, &action, &request, view) {
            Ok(response) => response,
            Err(failure) => {
                tracing::error!(
                    remote = remote.as_str(),
                    controller = descriptor.name(),
                    action = action.as_str(),
                    error = %failure,
                    "action failed, rerouting to exception handler"
                );
                request.attach_failure(failure);
                let error_descriptor = self.error_descriptor(application);
                self.call(error_descriptor, EXCEPTION_ACTION, &request, view)
                    .map_err(|source| DispatchError::ActionFailed {
                        controller: error_descriptor.name().to_string(),
                        action: EXCEPTION_ACTION.to_string(),
                        source,
                    })?
            }
        };

        tracing::debug!(
            remote = remote.as_str(),
            code = response.code(),
            content_type = response.content_type_header().as_str(),
            length = response.body().len(),
            "dispatch complete"
        );

        Ok(response)
    }

    /// Serve one request and transmit the response to `writer`.
    ///
    /// # Errors
    ///
    /// As [`Dispatcher::serve`], plus [`DispatchError::Transmit`] when
    /// writing fails.
    pub fn serve_into(
        &self,
        application: &str,
        server_vars: &ServerVars,
        request: Option<Request>,
        writer: &mut dyn io::Write,
    ) -> Result<Response, DispatchError> {
        let response = self.serve(application, server_vars, request)?;
        self.transmit(&response, writer)?;
        Ok(response)
    }

    /// Emit a response over the transport boundary: status line,
    /// `Content-Length`, `Content-Type`, the configured default headers in
    /// insertion order, the response-specific headers, a blank line, then
    /// the body bytes. Header order is kept stable for reproducibility.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Transmit`] when writing fails.
    pub fn transmit(
        &self,
        response: &Response,
        writer: &mut dyn io::Write,
    ) -> Result<(), DispatchError> {
        write!(writer, "{}\r\n", response.status_line())?;
        write!(writer, "Content-Length: {}\r\n", response.body().len())?;
        write!(writer, "Content-Type: {}\r\n", response.content_type_header())?;
        for (name, value) in &self.default_headers {
            write!(writer, "{name}: {value}\r\n")?;
        }
        for (name, value) in response.additional_headers() {
            write!(writer, "{name}: {value}\r\n")?;
        }
        write!(writer, "\r\n")?;
        writer.write_all(response.body().as_bytes())?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Internals
    // ═══════════════════════════════════════════════════════════════════════

    /// The error controller for an application scope: a registered `Error`
    /// controller shadows the built-in fallback.
    fn error_descriptor(&self, application: &str) -> &ControllerDescriptor {
        self.controllers
            .get(application)
            .and_then(|m| m.get(ERROR_CONTROLLER))
            .unwrap_or(&self.fallback_error)
    }

    /// One invocation cycle: fresh response titled with the controller
    /// name, action metadata applied, action invoked with a buffered
    /// writer, buffer appended, view rendered, placeholders expanded.
    fn call(
        &self,
        descriptor: &ControllerDescriptor,
        action: &str,
        request: &Request,
        view: &ViewDescriptor,
    ) -> Result<Response, ActionError> {
        let mut response = Response::new();
        response.set_title(descriptor.name());
        if let Some(spec) = descriptor.action_spec(action) {
            if let Some(response_type) = spec.response_type() {
                response.set_content_type(response_type);
            }
            if let Some(title) = spec.title() {
                response.set_title(title);
            }
        }

        let mut out = String::new();
        let mut view_params = ViewParams::default();
        descriptor.invoke(
            action,
            &mut ActionContext {
                request,
                response: &mut response,
                out: &mut out,
                view_params: &mut view_params,
            },
        )?;
        response.append_body(&out);

        view.render(&mut response, request, &view_params, &self.assets)?;

        let expanded = expand_placeholders(response.body(), request, &view_params, &self.controls)?;
        response.set_body(expanded);
        Ok(response)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Overwrite a named entry in place, or append it.
fn upsert(entries: &mut Vec<(String, String)>, name: String, value: String) {
    match entries.iter_mut().find(|(n, _)| *n == name) {
        Some((_, slot)) => *slot = value,
        None => entries.push((name, value)),
    }
}
