//! Built-in fallback controller for unroutable or failing requests.

use crate::{ActionContext, ActionError, ActionSpec, Controller, ControllerSpec};
use std::fmt::Write;

/// Renders the fallback pages when a request cannot be routed (`error`,
/// HTTP 404) or a dispatched action failed (`exception`, HTTP 500).
///
/// Registered automatically by [`Dispatcher::new`](crate::Dispatcher::new);
/// an application may shadow it by registering its own controller under the
/// `Error` name.
#[derive(Debug, Default)]
pub struct ErrorController;

impl Controller for ErrorController {
    fn spec(&self) -> ControllerSpec {
        ControllerSpec::for_type::<Self>()
            .action(ActionSpec::new("error"))
            .action(ActionSpec::new("exception"))
    }

    fn invoke(&self, action: &str, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        match action {
            "error" => {
                ctx.response.set_code(404);
                write!(ctx.out, "<h2>Not Found</h2>")?;
                write!(
                    ctx.out,
                    "Requested document {} on {} could not be found!",
                    ctx.request.action(),
                    ctx.request.controller()
                )?;
            }
            "exception" => {
                ctx.response.set_code(500);
                write!(ctx.out, "<h2>Internal Server Error</h2>")?;
                if let Some(failure) = ctx.request.failure() {
                    write!(ctx.out, "<p>{failure}</p>")?;
                    let mut source = failure.source();
                    while let Some(cause) = source {
                        write!(ctx.out, "<p>caused by: {cause}</p>")?;
                        source = cause.source();
                    }
                }
            }
            other => return Err(format!("no such error action {other}").into()),
        }
        Ok(())
    }
}
