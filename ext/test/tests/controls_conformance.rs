//! Placeholder expansion conformance: stock controls end to end.

use turnstile::{Control, Form};
use turnstile_test::prelude::*;

fn dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_controller(ControlsController)
        .expect("fixture controller registers")
        .register_view_control("form", || Box::new(Form) as Box<dyn Control>)
        .register_view_control("image", || Box::new(Form) as Box<dyn Control>)
        .set_defaults("Login", "index");
    dispatcher
}

fn serve(dispatcher: &Dispatcher, uri: &str) -> Response {
    let request = Request::parse(uri, &ServerVars::new());
    dispatcher
        .serve(DEFAULT_APPLICATION, &ServerVars::new(), Some(request))
        .expect("serve succeeds")
}

#[test]
fn test_controls() {
    let response = serve(&dispatcher(), "/controls/index");
    assert!(response.body().contains("<form action=\"/controls/index\""));
    assert!(response
        .body()
        .contains("<input type=\"password\" id=\"password\" class=\"password\" name=\"password\"/>"));
    assert!(!response.body().contains("{form=login}"));
}

#[test]
fn test_login_request() {
    let response = serve(&dispatcher(), "/controls/login");
    assert!(response.body().contains("<title>Login</title>"));
}

#[test]
fn test_invalid_placeholder() {
    let response = serve(&dispatcher(), "/controls/emptyPlaceholder");
    assert!(!response.body().contains("{form=nothing}"));
    assert_eq!(response.title(), "Empty placeholder");
}

#[test]
fn test_control_object() {
    // The stored instance wins over the registered factory (which renders
    // a form, not an image).
    let response = serve(&dispatcher(), "/controls/controlsObject");
    assert_eq!(response.title(), "Image control");
    assert!(response.body().contains(
        "<img src=\"http://pictures.example.org/free-abstractions-6.jpg\" alt=\"Free image for test\"/>"
    ));
}

#[test]
fn test_unregistered_identifier_token_dropped() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_controller(ControlsController)
        .expect("fixture controller registers");

    // No control factories at all: every token is removed silently.
    let response = serve(&dispatcher, "/controls/index");
    assert!(!response.body().contains("{form=login}"));
    assert!(!response.body().contains("<form"));
}

#[test]
fn test_expansion_idempotent_without_tokens() {
    let dispatcher = dispatcher();
    let response = serve(&dispatcher, "/controls/login");
    let body = response.body().to_string();

    // Serving the same token-free page again yields the identical body.
    let again = serve(&dispatcher, "/controls/login");
    assert_eq!(again.body(), body);
}
