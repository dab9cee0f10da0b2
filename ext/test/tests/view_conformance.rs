//! View registration and best-match selection conformance.

use turnstile_test::prelude::*;

fn dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_controller(FeatureTestController)
        .expect("fixture controller registers")
        .set_defaults("FeatureTest", "index");
    dispatcher
}

fn serve(dispatcher: &Dispatcher, uri: &str) -> Result<Response, DispatchError> {
    let request = Request::parse(uri, &ServerVars::new());
    dispatcher.serve(DEFAULT_APPLICATION, &ServerVars::new(), Some(request))
}

#[test]
fn test_invalid_view_filter_rejected() {
    let mut dispatcher = dispatcher();
    let result = dispatcher.register_view(InvalidFilterView);
    assert!(matches!(result, Err(DispatchError::ViewResolution { .. })));
}

#[test]
fn test_register_do_nothing_view_overrides_wrapper() {
    let mut dispatcher = dispatcher();
    dispatcher
        .register_view(DoNothingView)
        .expect("fixture view registers");

    let response = serve(&dispatcher, "/featureTest/index").expect("serve succeeds");
    assert_eq!(response.code(), 200);
    assert_eq!(response.content_type(), "text/html");
    assert_eq!(response.title(), "FeatureTest");
    assert_eq!(response.status_line(), "HTTP/1.1 200 OK");
    assert!(response.body().contains("Test succeeded"));
    assert!(!response.body().contains("<!DOCTYPE"));
}

#[test]
fn test_explicit_order_beats_intrinsic() {
    let mut dispatcher = dispatcher();
    // Forced below the default wrapper, the do-nothing view loses.
    dispatcher
        .register_view_in(DEFAULT_APPLICATION, DoNothingView, Some(-5))
        .expect("fixture view registers");

    let response = serve(&dispatcher, "/featureTest/index").expect("serve succeeds");
    assert!(response.body().contains("<!DOCTYPE"));
}

#[test]
fn test_selection_is_deterministic() {
    // Orders [0, 10] both admitting the pair: order 10 always wins, no
    // matter which got registered first.
    for override_first in [false, true] {
        let mut dispatcher = dispatcher();
        dispatcher.unregister_view("Default", 0);
        if override_first {
            dispatcher
                .register_view(DoNothingView)
                .and_then(|d| d.register_view(DefaultView))
                .expect("fixture views register");
        } else {
            dispatcher
                .register_view(DefaultView)
                .and_then(|d| d.register_view(DoNothingView))
                .expect("fixture views register");
        }
        let response = serve(&dispatcher, "/featureTest/index").expect("serve succeeds");
        assert!(!response.body().contains("<!DOCTYPE"));
    }
}

#[test]
fn test_unregister_only_admitting_view_fails_serve() {
    let mut dispatcher = dispatcher();
    dispatcher.unregister_view("Default", 0);

    let result = serve(&dispatcher, "/featureTest/index");
    assert!(matches!(result, Err(DispatchError::NoMatchingView { .. })));
}

#[test]
fn test_unregister_is_idempotent() {
    let mut dispatcher = dispatcher();
    dispatcher.unregister_view("Default", 0);
    dispatcher.unregister_view("Default", 0);
    dispatcher.unregister_view("NeverRegistered", 42);

    let result = serve(&dispatcher, "/featureTest/index");
    assert!(matches!(result, Err(DispatchError::NoMatchingView { .. })));
}

#[test]
fn test_reregistering_restores_serving() {
    let mut dispatcher = dispatcher();
    dispatcher.unregister_view("Default", 0);
    dispatcher
        .register_view(DefaultView)
        .expect("default view registers again");

    let response = serve(&dispatcher, "/featureTest/index").expect("serve succeeds");
    assert_eq!(response.code(), 200);
}
