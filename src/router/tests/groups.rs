//! Security policy per route group, as seen through the whole router.

use super::*;
use axum::http::StatusCode;
use tower::ServiceExt;

const OPEN_PATHS: [&str; 2] = ["/healthz", "/metrics"];
const ENFORCED_PATHS: [&str; 7] = [
    "/",
    "/auth/login",
    "/auth/me",
    "/auth/unknown",
    "/admin",
    "/admin/",
    "/admin/users",
];

#[tokio::test]
async fn test_open_group_never_redirects_or_sends_sts() {
    let app = create_test_router(create_production_config());

    for path in OPEN_PATHS {
        for request in [
            get_request(path),
            secure_request("GET", path, Body::empty()),
        ] {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{path}");
            assert!(
                response.headers().get("strict-transport-security").is_none(),
                "{path} must not send STS"
            );
            assert!(response.headers().get("location").is_none());
            assert_eq!(response.headers()["x-frame-options"], "DENY");
            assert_eq!(response.headers()["x-content-type-options"], "nosniff");
            assert_eq!(response.headers()["x-xss-protection"], "1; mode=block");
        }
    }
}

#[tokio::test]
async fn test_enforced_group_redirects_plain_requests_in_production() {
    let app = create_test_router(create_production_config());

    for path in ENFORCED_PATHS {
        let request = Request::builder()
            .uri(format!("{path}?tab=1"))
            .header("host", "api.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY, "{path}");
        assert_eq!(
            response.headers()["location"],
            format!("https://api.example.com{path}?tab=1").as_str()
        );
    }
}

#[tokio::test]
async fn test_graphql_post_is_redirected_in_production() {
    let app = create_test_router(create_production_config());

    let mut request = graphql_request("{ hello }");
    request
        .headers_mut()
        .insert("host", "api.example.com".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()["location"], "https://api.example.com/graphql");
}

#[tokio::test]
async fn test_forwarded_proto_without_forwarded_host_is_redirected() {
    let app = create_test_router(create_production_config());

    let request = Request::builder()
        .uri("/")
        .header("host", "internal:8080")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()["location"], "https://internal:8080/");
}

#[tokio::test]
async fn test_enforced_group_serves_secure_requests_with_sts() {
    let app = create_test_router(create_production_config());

    let response = app
        .oneshot(secure_request("GET", "/", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["strict-transport-security"],
        "max-age=86400"
    );
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-xss-protection"], "1; mode=block");
}

#[tokio::test]
async fn test_configured_ssl_host_wins() {
    let config = create_config_with_toml(
        r#"
[security]
ssl_host = "secure.example.com"
"#,
    )
    .with_mode(crate::DeploymentMode::Production);
    let app = create_test_router(config);

    let request = Request::builder()
        .uri("/auth/login")
        .header("host", "api.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()["location"],
        "https://secure.example.com/auth/login"
    );
}

#[tokio::test]
async fn test_development_mode_relaxes_transport_only() {
    let app = create_test_router(create_base_config());

    for path in ENFORCED_PATHS {
        let response = app.clone().oneshot(get_request(path)).await.unwrap();
        assert_ne!(response.status(), StatusCode::MOVED_PERMANENTLY, "{path}");
        assert!(response.headers().get("strict-transport-security").is_none());
        assert_eq!(response.headers()["x-frame-options"], "DENY", "{path}");
    }
}

#[tokio::test]
async fn test_unknown_sub_paths_stay_in_their_group() {
    let app = create_test_router(create_base_config());

    for path in ["/auth", "/auth/unknown", "/admin/users"] {
        let response = app.clone().oneshot(get_request(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        assert_eq!(response.headers()["x-frame-options"], "DENY", "{path}");
    }

    let response = app.oneshot(get_request("/admin/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(get_body_string(response).await.contains("Signed in as anonymous."));
}

#[tokio::test]
async fn test_admin_sub_paths_are_behind_the_gate() {
    let app = create_test_router(create_production_config());

    for path in ["/admin/", "/admin/users"] {
        let response = app
            .clone()
            .oneshot(secure_request("GET", path, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{path}");
    }
}

#[tokio::test]
async fn test_late_route_takes_its_group_policy() {
    let config = create_production_config();
    let context = create_test_context(&config, Arc::new(TestSchema::default()));
    let app = AppRouter::new(config, context)
        .unwrap()
        .setup_routes()
        .unwrap()
        .route(RouteGroup::Open, "/ready", axum::routing::get(|| async { "ready" }))
        .unwrap()
        .route(RouteGroup::Enforced, "/reports", axum::routing::get(|| async { "reports" }))
        .unwrap()
        .setup_middleware()
        .unwrap()
        .into_inner();

    let ready = app.clone().oneshot(get_request("/ready")).await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
    assert!(ready.headers().get("strict-transport-security").is_none());
    assert_eq!(ready.headers()["x-frame-options"], "DENY");

    let request = Request::builder()
        .uri("/reports")
        .header("host", "api.example.com")
        .body(Body::empty())
        .unwrap();
    let reports = app.clone().oneshot(request).await.unwrap();
    assert_eq!(reports.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(reports.headers()["location"], "https://api.example.com/reports");

    let reports = app
        .oneshot(secure_request("GET", "/reports", Body::empty()))
        .await
        .unwrap();
    assert_eq!(reports.status(), StatusCode::OK);
    assert_eq!(reports.headers()["strict-transport-security"], "max-age=86400");
}
