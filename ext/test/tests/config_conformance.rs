//! Declarative configuration conformance.

use turnstile::DispatcherConfig;
use turnstile_test::prelude::*;

const CONFIG_YAML: &str = r#"
default_controller: FeatureTest
default_action: index
default_headers:
  X-Powered-By: turnstile
css_files:
  - /static/site.css
"#;

fn configured_dispatcher() -> Dispatcher {
    let config: DispatcherConfig =
        serde_yaml::from_str(CONFIG_YAML).expect("fixture config parses");
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_controller(FeatureTestController)
        .expect("fixture controller registers")
        .configure(&config);
    dispatcher
}

#[test]
fn test_configured_defaults_route_the_bare_path() {
    let dispatcher = configured_dispatcher();
    let server_vars: ServerVars = [("REQUEST_URI".to_string(), "/".to_string())]
        .into_iter()
        .collect();

    // The request is derived from the transport, so the dispatcher's
    // configured defaults apply.
    let response = dispatcher
        .serve(DEFAULT_APPLICATION, &server_vars, None)
        .expect("serve succeeds");
    assert_eq!(response.code(), 200);
    assert!(response.body().contains("Test succeeded"));
}

#[test]
fn test_configured_header_and_assets_reach_the_wire() {
    let dispatcher = configured_dispatcher();
    let request = Request::parse("/featureTest/index", &ServerVars::new());

    let mut wire = Vec::new();
    let response = dispatcher
        .serve_into(DEFAULT_APPLICATION, &ServerVars::new(), Some(request), &mut wire)
        .expect("serve and transmit");

    let text = String::from_utf8(wire).expect("wire output is utf-8");
    assert!(text.contains("X-Powered-By: turnstile\r\n"));
    assert!(response
        .body()
        .contains("<link rel=\"stylesheet\" type=\"text/css\" href=\"/static/site.css\"/>"));
}
