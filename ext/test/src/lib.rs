//! turnstile-test: fixture domain for conformance testing
//!
//! Provides small controllers and views with predictable output, used by
//! the conformance suites under `tests/`. This is also the reference for
//! how an application wires its own controllers and views.
//!
//! # Example
//!
//! ```
//! use turnstile_test::prelude::*;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .register_controller(FeatureTestController)?
//!     .set_defaults("FeatureTest", "index");
//!
//! let request = Request::parse("/featureTest/index", &ServerVars::new());
//! let response = dispatcher.serve(DEFAULT_APPLICATION, &ServerVars::new(), Some(request))?;
//! assert!(response.body().contains("Test succeeded"));
//! # Ok::<(), turnstile::DispatchError>(())
//! ```

use serde_json::json;
use std::collections::BTreeMap;
use std::fmt::Write;
use turnstile::prelude::*;
use turnstile::{ActionSpec, ControlParams, ControllerSpec, Image};

/// Controller exercising the plain dispatch paths: a simple page, a
/// parameter dump, and an action that always fails.
#[derive(Debug, Default)]
pub struct FeatureTestController;

impl Controller for FeatureTestController {
    fn spec(&self) -> ControllerSpec {
        ControllerSpec::for_type::<Self>()
            .action(ActionSpec::new("index"))
            .action(ActionSpec::new("params").with_response_type("text/plain"))
            .action(ActionSpec::new("exception"))
    }

    fn invoke(&self, action: &str, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        match action {
            "index" => write!(ctx.out, "Test succeeded")?,
            "params" => {
                // Sorted for a stable dump; parameter storage itself is
                // order-insensitive.
                let sorted: BTreeMap<_, _> = ctx.request.params().iter().collect();
                for (name, value) in sorted {
                    writeln!(ctx.out, "{name} = {value}")?;
                }
            }
            "exception" => return Err("feature test failure".into()),
            other => return Err(format!("no such action {other}").into()),
        }
        Ok(())
    }
}

/// Controller exercising placeholder expansion: a form bag, a titled empty
/// page, a dangling placeholder and a pre-built control instance.
#[derive(Debug, Default)]
pub struct ControlsController;

impl Controller for ControlsController {
    fn spec(&self) -> ControllerSpec {
        ControllerSpec::for_type::<Self>()
            .action(ActionSpec::new("index"))
            .action(ActionSpec::new("login").with_title("Login"))
            .action(ActionSpec::new("emptyPlaceholder").with_title("Empty placeholder"))
            .action(ActionSpec::new("controlsObject").with_title("Image control"))
    }

    fn invoke(&self, action: &str, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        match action {
            "index" => {
                let bag = match json!({
                    "fields": [
                        {"name": "username"},
                        {"name": "password", "type": "password"}
                    ],
                    "buttons": [
                        {"name": "Login"}
                    ]
                }) {
                    serde_json::Value::Object(map) => map,
                    _ => ControlParams::new(),
                };
                ctx.view_params.insert_params("form", "login", bag);
                write!(ctx.out, "{{form=login}}")?;
            }
            "login" => {}
            "emptyPlaceholder" => write!(ctx.out, "{{form=nothing}}")?,
            "controlsObject" => {
                ctx.view_params.insert_control(
                    "image",
                    "abstract",
                    Box::new(Image::new(
                        "http://pictures.example.org/free-abstractions-6.jpg",
                        "Free image for test",
                    )),
                );
                write!(ctx.out, "{{image=abstract}}")?;
            }
            other => return Err(format!("no such action {other}").into()),
        }
        Ok(())
    }
}

/// A view that leaves the response untouched; registered at a high order
/// it overrides the default document wrapper.
#[derive(Debug, Default)]
pub struct DoNothingView;

impl View for DoNothingView {
    fn spec(&self) -> ViewSpec {
        ViewSpec::for_type::<Self>().with_order(10)
    }

    fn render(
        &self,
        _response: &mut Response,
        _request: &Request,
        _params: &ViewParams,
        _assets: &PageAssets,
    ) -> Result<(), ActionError> {
        Ok(())
    }
}

/// A view whose applicability filter does not parse; registering it must
/// fail.
#[derive(Debug, Default)]
pub struct InvalidFilterView;

impl View for InvalidFilterView {
    fn spec(&self) -> ViewSpec {
        ViewSpec::for_type::<Self>().applying_to("layout=wide")
    }

    fn render(
        &self,
        _response: &mut Response,
        _request: &Request,
        _params: &ViewParams,
        _assets: &PageAssets,
    ) -> Result<(), ActionError> {
        Ok(())
    }
}

/// A controller whose self-description is rejected at registration time.
#[derive(Debug, Default)]
pub struct InvalidController;

impl Controller for InvalidController {
    fn spec(&self) -> ControllerSpec {
        ControllerSpec::new("")
    }

    fn invoke(&self, _action: &str, _ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        Ok(())
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        ControlsController, DoNothingView, FeatureTestController, InvalidController,
        InvalidFilterView,
    };
    pub use turnstile::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_controller_spec() {
        let spec = FeatureTestController.spec();
        assert_eq!(spec.name(), "FeatureTest");
        assert!(spec.actions().iter().any(|a| a.name() == "params"));
    }

    #[test]
    fn test_controls_controller_spec() {
        let spec = ControlsController.spec();
        assert_eq!(spec.name(), "Controls");
        assert_eq!(
            spec.actions()
                .iter()
                .find(|a| a.name() == "login")
                .and_then(|a| a.title()),
            Some("Login")
        );
    }

    #[test]
    fn test_do_nothing_view_spec() {
        let spec = DoNothingView.spec();
        assert_eq!(spec.name(), "DoNothing");
        assert_eq!(spec.order(), 10);
    }
}
