//! End-to-end CORS behaviour of the router.
//!
//! Requests go through the full middleware stack with the default policy:
//! `/banque/**` open to `http://localhost:3000` for GET, POST, PUT and
//! DELETE, any header, with credentials.

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use banque::config::CorsConfig;
use banque::cors::register_cors_mappings;
use banque::memory::MemoryStore;
use banque::routes::{create_router, AppState};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

const FRONTEND: &str = "http://localhost:3000";

fn app_with(cors: CorsConfig) -> Router {
    let registry = Arc::new(register_cors_mappings(&cors).unwrap());
    let state = Arc::new(AppState {
        store: Arc::new(MemoryStore::new()),
    });
    create_router(state, registry)
}

fn app() -> Router {
    app_with(CorsConfig::default())
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn get(path: &str, origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(path);
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    builder.body(Body::empty()).unwrap()
}

fn preflight(path: &str, origin: &str, method: &str, headers: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::OPTIONS)
        .uri(path)
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, method);
    if let Some(headers) = headers {
        builder = builder.header(header::ACCESS_CONTROL_REQUEST_HEADERS, headers);
    }
    builder.body(Body::empty()).unwrap()
}

fn header_of<'a>(response: &'a Response<Body>, name: header::HeaderName) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

fn listed(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn has_cors_headers(response: &Response<Body>) -> bool {
    [
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::ACCESS_CONTROL_ALLOW_METHODS,
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        header::ACCESS_CONTROL_MAX_AGE,
    ]
    .into_iter()
    .any(|name| response.headers().contains_key(name))
}

mod allowed_origin {
    use super::*;

    #[tokio::test]
    async fn test_actual_request_gets_allow_origin() {
        for path in ["/banque/comptes", "/banque/comptes/1", "/banque/anything"] {
            let response = send(app(), get(path, Some(FRONTEND))).await;
            assert_eq!(
                header_of(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN),
                Some(FRONTEND),
                "path {}",
                path
            );
            assert_eq!(
                header_of(&response, header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
                Some("true")
            );
        }
    }

    #[tokio::test]
    async fn test_actual_request_reaches_handler() {
        let response = send(app(), get("/banque/comptes", Some(FRONTEND))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let comptes: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(comptes, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_preflight_post_succeeds() {
        let response = send(
            app(),
            preflight("/banque/accounts", FRONTEND, "POST", None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_of(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(FRONTEND)
        );
        let methods = listed(header_of(&response, header::ACCESS_CONTROL_ALLOW_METHODS));
        assert_eq!(methods, vec!["GET", "POST", "PUT", "DELETE"]);
        assert!(methods.iter().any(|m| m == "POST"));
        assert_eq!(
            header_of(&response, header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some("true")
        );
        assert_eq!(header_of(&response, header::ACCESS_CONTROL_MAX_AGE), Some("1800"));
    }

    #[tokio::test]
    async fn test_preflight_on_route_without_options_handler() {
        // PUT-only style route: the preflight must not fall through to 405
        let response = send(
            app(),
            preflight("/banque/comptes/12", FRONTEND, "PUT", Some("content-type, accept")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_of(&response, header::ACCESS_CONTROL_ALLOW_HEADERS),
            Some("content-type, accept")
        );
    }

    #[tokio::test]
    async fn test_requested_headers_are_echoed_never_wildcard() {
        let response = send(
            app(),
            preflight(
                "/banque/comptes",
                FRONTEND,
                "DELETE",
                Some("Authorization, X-Custom-Header"),
            ),
        )
        .await;

        let allowed = header_of(&response, header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap();
        assert_eq!(allowed, "Authorization, X-Custom-Header");
        assert_ne!(allowed, "*");
        assert_eq!(
            header_of(&response, header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_credentials_present_regardless_of_requested_headers() {
        for requested in [None, Some("content-type"), Some("x-a, x-b, x-c")] {
            let response = send(
                app(),
                preflight("/banque/comptes", FRONTEND, "GET", requested),
            )
            .await;
            assert_eq!(
                header_of(&response, header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
                Some("true"),
                "requested headers {:?}",
                requested
            );
        }
    }

    #[tokio::test]
    async fn test_vary_is_set() {
        let response = send(app(), get("/banque/comptes", Some(FRONTEND))).await;
        let vary = listed(header_of(&response, header::VARY));
        assert!(vary.iter().any(|v| v.eq_ignore_ascii_case("origin")));
    }
}

mod refused {
    use super::*;

    #[tokio::test]
    async fn test_other_origin_is_not_granted() {
        for origin in ["http://localhost:3001", "https://localhost:3000", "http://evil.example"] {
            let response = send(app(), get("/banque/comptes", Some(origin))).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "origin {}", origin);
            assert!(header_of(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
            assert!(header_of(&response, header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
        }
    }

    #[tokio::test]
    async fn test_other_origin_preflight_is_rejected() {
        let response = send(
            app(),
            preflight("/banque/comptes", "http://evil.example", "GET", None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!has_cors_headers(&response));
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Invalid CORS request");
    }

    #[tokio::test]
    async fn test_patch_preflight_does_not_list_patch() {
        let response = send(
            app(),
            preflight("/banque/comptes/1", FRONTEND, "PATCH", None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let methods = header_of(&response, header::ACCESS_CONTROL_ALLOW_METHODS).unwrap_or("");
        assert!(!methods.contains("PATCH"));
    }

    #[tokio::test]
    async fn test_rejected_request_does_not_reach_handler() {
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState {
            store: store.clone(),
        });
        let registry = Arc::new(register_cors_mappings(&CorsConfig::default()).unwrap());
        let app = create_router(state, registry);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/banque/comptes")
            .header(header::ORIGIN, "http://evil.example")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"solde": 10.0, "type": "Courant"}"#))
            .unwrap();

        let response = send(app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(store.is_empty());
    }
}

mod outside_mapping {
    use super::*;

    #[tokio::test]
    async fn test_health_gets_no_cors_headers() {
        let response = send(app(), get("/health", Some(FRONTEND))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!has_cors_headers(&response));
        assert!(header_of(&response, header::VARY).is_none());
    }

    #[tokio::test]
    async fn test_health_preflight_is_not_answered_by_the_policy() {
        let response = send(app(), preflight("/health", FRONTEND, "GET", None)).await;
        assert!(!has_cors_headers(&response));
        assert_ne!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_similar_prefix_is_not_covered() {
        let response = send(app(), get("/banquet", Some(FRONTEND))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!has_cors_headers(&response));
    }
}

mod non_cors {
    use super::*;

    #[tokio::test]
    async fn test_request_without_origin_passes() {
        let response = send(app(), get("/banque/comptes", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!has_cors_headers(&response));
    }

    #[tokio::test]
    async fn test_same_origin_request_passes() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/banque/comptes")
            .header(header::HOST, "localhost:8082")
            .header(header::ORIGIN, "http://localhost:8082")
            .body(Body::empty())
            .unwrap();

        let response = send(app(), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(header_of(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_same_host_with_other_scheme_is_not_same_origin() {
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState {
            store: store.clone(),
        });
        let registry = Arc::new(register_cors_mappings(&CorsConfig::default()).unwrap());
        let app = create_router(state, registry);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/banque/comptes")
            .header(header::HOST, "localhost:3000")
            .header(header::ORIGIN, "https://localhost:3000")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"solde": 10.0, "type": "Courant"}"#))
            .unwrap();

        let response = send(app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(header_of(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .unwrap();

        let response = send(app(), request).await;
        assert_eq!(header_of(&response, header::HeaderName::from_static("x-request-id")), Some("req-123"));
    }
}

mod custom_policy {
    use super::*;

    #[tokio::test]
    async fn test_configured_exposed_headers() {
        let app = app_with(CorsConfig {
            exposed_headers: vec!["x-request-id".to_string()],
            ..CorsConfig::default()
        });

        let response = send(app, get("/banque/comptes", Some(FRONTEND))).await;
        assert_eq!(
            header_of(&response, header::ACCESS_CONTROL_EXPOSE_HEADERS),
            Some("x-request-id")
        );
    }

    #[tokio::test]
    async fn test_any_origin_without_credentials() {
        let app = app_with(CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: false,
            ..CorsConfig::default()
        });

        let response = send(app, get("/banque/comptes", Some("https://anywhere.example"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_of(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
        assert!(header_of(&response, header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }
}
