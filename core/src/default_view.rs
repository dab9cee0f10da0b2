//! Built-in lowest-order view wrapping HTML bodies in a document shell.

use crate::view::{PageAssets, View, ViewSpec};
use crate::{ActionError, Request, Response, ViewParams};
use std::fmt::Write;

/// The default view, registered at order 0 admitting every request.
///
/// `text/html` responses are wrapped in a minimal document with the page
/// title and the configured css/js assets; any other content type is left
/// untouched. Register a view at a higher order to override it for
/// specific controllers or actions.
#[derive(Debug, Default)]
pub struct DefaultView;

impl View for DefaultView {
    fn spec(&self) -> ViewSpec {
        ViewSpec::for_type::<Self>().applying_to("controller=any,action=any")
    }

    fn render(
        &self,
        response: &mut Response,
        _request: &Request,
        _params: &ViewParams,
        assets: &PageAssets,
    ) -> Result<(), ActionError> {
        if response.content_type() != "text/html" {
            return Ok(());
        }

        let mut head = String::new();
        for css in &assets.css_files {
            writeln!(head, "<link rel=\"stylesheet\" type=\"text/css\" href=\"{css}\"/>")?;
        }
        for js in &assets.js_files {
            writeln!(head, "<script type=\"text/javascript\" src=\"{js}\"></script>")?;
        }

        let html = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<title>{}</title>\n{}</head>\n\n<body>\n{}\n</body>\n\n</html>",
            response.title(),
            head,
            response.body()
        );
        response.set_body(html);
        Ok(())
    }
}
