use hyper::Method;
use restglue::cors::CorsSetting;
use restglue::handler::{HandlerResult, Request, ResourceHandler};
use restglue::http::Response;
use restglue::{AppConfig, Application};

fn factorial(req: &Request) -> HandlerResult {
    let value = req.var_int("value").unwrap_or_default();
    if !(0..=20).contains(&value) {
        return Err(Response::error(format!("Value out of range: {value}.")).into());
    }
    let result: i64 = (1..=value).product();
    Ok(Response::ok(format!("{value}! = {result}")))
}

struct Counter;

impl ResourceHandler for Counter {
    fn get(&self, req: &Request) -> HandlerResult {
        let id = req.resource().and_then(|v| v.as_int()).unwrap_or_default();
        Ok(Response::json(&serde_json::json!({"id": id, "count": id * 2}))?)
    }
}

fn application(config: &AppConfig) -> Application {
    let mut app = Application::new(config);
    app.route("GET", "/factorial/<int:value>", factorial)
        .unwrap()
        .resource("/counters/<int:id>", Counter)
        .unwrap();
    app
}

fn get(app: &Application, target: &str) -> Response {
    app.dispatch(Request::new(Method::GET, target))
}

#[test]
fn test_factorial_success() {
    let app = application(&AppConfig::default());
    let response = get(&app, "/factorial/12");
    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), "12! = 479001600");
    assert_eq!(response.content_type(), "text/plain; charset=utf-8");
}

#[test]
fn test_factorial_out_of_range() {
    let app = application(&AppConfig::default());
    let response = get(&app, "/factorial/150");
    assert!((400..500).contains(&response.status()));
    assert!(response.text().contains("150"));
}

#[test]
fn test_placeholder_type_mismatch_is_not_found() {
    let app = application(&AppConfig::default());
    assert_eq!(get(&app, "/factorial/twelve").status(), 404);
}

#[test]
fn test_resource_handler() {
    let app = application(&AppConfig::default());
    let response = get(&app, "/counters/21");
    assert_eq!(response.status(), 200);
    let value: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(value, serde_json::json!({"id": 21, "count": 42}));

    let response = app.dispatch(Request::new(Method::PUT, "/counters/21"));
    assert_eq!(response.status(), 405);
    assert_eq!(response.header("allow"), Some("GET, HEAD"));

    let response = app.dispatch(Request::new(Method::HEAD, "/counters/21"));
    assert_eq!(response.status(), 200);
}

#[test]
fn test_resource_preflight_with_cors() {
    let app = application(&AppConfig {
        cors: CorsSetting::Enabled(true),
        ..AppConfig::default()
    });
    let response = app.dispatch(
        Request::new(Method::OPTIONS, "/counters/1").with_header("Origin", "https://a.example"),
    );
    assert_eq!(response.status(), 204);
    assert_eq!(response.header("access-control-max-age"), Some("86400"));
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));

    let without_cors = application(&AppConfig::default());
    let response = without_cors.dispatch(Request::new(Method::OPTIONS, "/counters/1"));
    assert_eq!(response.status(), 405);
    assert_eq!(response.header("allow"), Some("GET, HEAD"));
}

#[test]
fn test_cors_restricted_origins() {
    let config: restglue::Config = restglue::Config::from_toml_str(
        r#"
        [app.cors]
        origins = ["https://allowed.example"]
        "#,
    )
    .unwrap();
    assert!(matches!(config.app.cors, CorsSetting::Custom(_)));
    let app = application(&config.app);

    let allowed = app.dispatch(
        Request::new(Method::GET, "/factorial/3").with_header("Origin", "https://allowed.example"),
    );
    assert_eq!(
        allowed.header("access-control-allow-origin"),
        Some("https://allowed.example")
    );
    assert_eq!(allowed.header("vary"), Some("Origin"));

    let denied = app.dispatch(
        Request::new(Method::GET, "/factorial/3").with_header("Origin", "https://evil.example"),
    );
    assert_eq!(denied.status(), 200);
    assert_eq!(denied.header("access-control-allow-origin"), None);
}
