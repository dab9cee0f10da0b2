//! End-to-end conformance: routing, defaults, fallbacks, parameters.
//!
//! Each test builds a fresh dispatcher; nothing is shared.

use turnstile_test::prelude::*;

fn dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_controller(FeatureTestController)
        .expect("fixture controller registers")
        .set_defaults("FeatureTest", "index");
    dispatcher
}

fn serve(dispatcher: &Dispatcher, request: Request) -> Response {
    dispatcher
        .serve(DEFAULT_APPLICATION, &ServerVars::new(), Some(request))
        .expect("serve succeeds")
}

fn vars(entries: &[(&str, &str)]) -> ServerVars {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_feature() {
    let request = Request::parse("/featureTest/index", &ServerVars::new());
    assert_eq!(request.params().len(), 0);
    assert_eq!(request.origin(), "/featureTest/index");

    let response = serve(&dispatcher(), request);
    assert_eq!(response.code(), 200);
    assert_eq!(response.content_type(), "text/html");
    assert_eq!(response.title(), "FeatureTest");
    assert_eq!(response.status_line(), "HTTP/1.1 200 OK");
    assert!(response.body().contains("Test succeeded"));
}

#[test]
fn test_no_action() {
    let request = Request::parse("/featureTest/noAction", &ServerVars::new());
    let response = serve(&dispatcher(), request);

    assert_eq!(response.code(), 404);
    assert_eq!(response.content_type(), "text/html");
    assert_eq!(response.title(), "Error");
    assert_eq!(response.status_line(), "HTTP/1.1 404 Not Found");
    assert!(response.body().contains("<h2>Not Found</h2>"));
}

#[test]
fn test_no_controller() {
    let request = Request::parse("/zest/index", &ServerVars::new());
    let response = serve(&dispatcher(), request);

    assert_eq!(response.code(), 404);
    assert_eq!(response.title(), "Error");
    assert!(response.body().contains("index on Zest"));
}

#[test]
fn test_defaults() {
    let request = Request::parse("/", &ServerVars::new());
    assert_eq!(request.controller(), "Index");
    assert_eq!(request.action(), "index");

    // No Index controller is registered, so routing falls back to 404.
    let response = serve(&dispatcher(), request);
    assert_eq!(response.code(), 404);
    assert_eq!(response.content_type(), "text/html");
}

#[test]
fn test_exception() {
    let request = Request::parse("/featureTest/exception", &ServerVars::new());
    let response = serve(&dispatcher(), request);

    assert_eq!(response.code(), 500);
    assert_eq!(response.content_type(), "text/html");
    assert_eq!(response.title(), "Error");
    assert_eq!(response.status_line(), "HTTP/1.1 500 Internal Server Error");
    assert!(response.body().contains("<h2>Internal Server Error</h2>"));
    assert!(response.body().contains("feature test failure"));
}

#[test]
fn test_feature_params() {
    let request = Request::parse("/featureTest/params/id/24/perform/save", &ServerVars::new());
    let response = serve(&dispatcher(), request);

    assert_eq!(response.code(), 200);
    assert_eq!(response.content_type(), "text/plain");
    assert_eq!(response.body(), "id = 24\nperform = save\n");
}

#[test]
fn test_feature_params_query_string() {
    let request = Request::parse("/featureTest/params/?id=24&perform=save", &ServerVars::new());
    let response = serve(&dispatcher(), request);

    assert_eq!(response.code(), 200);
    assert_eq!(response.content_type(), "text/plain");
    assert_eq!(response.body(), "id = 24\nperform = save\n");
}

#[test]
fn test_path_pairs_and_query_string_are_equivalent() {
    let dispatcher = dispatcher();
    let from_path = serve(
        &dispatcher,
        Request::parse("/featureTest/params/id/24/perform/save", &ServerVars::new()),
    );
    let from_query = serve(
        &dispatcher,
        Request::parse("/featureTest/params/?id=24&perform=save", &ServerVars::new()),
    );
    assert_eq!(from_path.body(), from_query.body());
}

#[test]
fn test_remote_address() {
    let request = Request::parse("/featureTest/index", &vars(&[("REMOTE_ADDR", "127.0.0.1")]));
    assert_eq!(request.remote_host(), Some("127.0.0.1"));
}

#[test]
fn test_proxy() {
    let request = Request::parse(
        "/featureTest/index",
        &vars(&[
            ("REMOTE_ADDR", "127.0.0.2"),
            ("HTTP_X_FORWARDED_FOR", "127.0.0.1"),
        ]),
    );
    assert_eq!(request.remote_host(), Some("127.0.0.1"));
}

#[test]
fn test_simulate_http_server() {
    let server_vars = vars(&[
        ("REMOTE_ADDR", "::1"),
        ("SERVER_ADDR", "::1"),
        ("DOCUMENT_ROOT", "/var/www/html"),
        ("REDIRECT_BASE", "/app/tests/"),
        ("REDIRECT_URL", "/app/tests/featureTest/"),
        ("SCRIPT_NAME", "/app/tests/index.php"),
    ]);
    let request = Request::parse("/featureTest/index", &server_vars);
    assert_eq!(request.controller(), "FeatureTest");
    assert_eq!(request.action(), "index");
    assert_eq!(request.context_prefix(), Some("/app/tests/"));
    assert_eq!(request.remote_host(), Some("::1"));

    let response = serve(&dispatcher(), request);
    assert_eq!(response.code(), 200);
    assert_eq!(response.content_type(), "text/html");
}

#[test]
fn test_simulate_http_server_implicit_request() {
    let server_vars = vars(&[
        ("REMOTE_ADDR", "::1"),
        ("REDIRECT_BASE", "/app/tests/"),
        ("REQUEST_URI", "/featureTest/index"),
    ]);
    let response = dispatcher()
        .serve(DEFAULT_APPLICATION, &server_vars, None)
        .expect("request derived from transport");
    assert_eq!(response.code(), 200);
    assert_eq!(response.content_type(), "text/html");
}

#[test]
fn test_simulate_http_server_context_prefix() {
    let server_vars = vars(&[
        ("REMOTE_ADDR", "::1"),
        ("HTTP_HOST", "::1"),
        ("REDIRECT_BASE", "/ignored/"),
        ("CONTEXT_PREFIX", "/app-test"),
        ("SCRIPT_NAME", "/app/tests/index.php"),
    ]);
    let request = Request::parse("/app-test/featureTest/index", &server_vars);
    assert_eq!(request.controller(), "FeatureTest");
    assert_eq!(request.action(), "index");
    assert_eq!(request.context_prefix(), Some("/app-test/"));
    assert_eq!(request.remote_host(), Some("::1"));

    let response = serve(&dispatcher(), request);
    assert_eq!(response.code(), 200);
}

#[test]
fn test_request_uri_missing() {
    let result = Request::parse_from_transport(&ServerVars::new());
    assert!(matches!(result, Err(DispatchError::InvalidRequest)));
}

#[test]
fn test_register_invalid_controller() {
    let mut dispatcher = Dispatcher::new();
    let result = dispatcher.register_controller(InvalidController);
    assert!(matches!(
        result,
        Err(DispatchError::ControllerResolution { .. })
    ));
}

#[test]
fn test_transmitted_wire_format() {
    let dispatcher = dispatcher();
    let request = Request::parse("/featureTest/params/id/24/perform/save", &ServerVars::new());
    let mut wire = Vec::new();
    let response = dispatcher
        .serve_into(DEFAULT_APPLICATION, &ServerVars::new(), Some(request), &mut wire)
        .expect("serve and transmit");

    let text = String::from_utf8(wire).expect("wire output is utf-8");
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains(&format!("Content-Length: {}\r\n", response.body().len())));
    assert!(text.contains("Content-Type: text/plain;utf-8\r\n"));
    assert!(text.ends_with("id = 24\nperform = save\n"));
}
