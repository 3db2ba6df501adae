//! End-to-end dispatch behaviour through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use pattern_router::{
    enable_cors, make_route, sync_handler, Dispatcher, HandlerContext, HandlerError, Interceptors,
    Outcome, Route,
};

mod common;

fn scenario_routes() -> Vec<Route> {
    vec![
        make_route("GET /health", sync_handler(|_| "ok".into_response())).unwrap(),
        make_route("/users/:id", |ctx: HandlerContext| async move {
            ctx.params.get("id").unwrap_or_default().to_string().into_response()
        })
        .unwrap(),
    ]
}

#[tokio::test]
async fn test_health_and_user_scenario() {
    let dispatcher = Dispatcher::with_interceptors(scenario_routes(), Interceptors::new());

    let response = dispatcher.handle(common::request(Method::GET, "/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_string(response).await, "ok");

    let response = dispatcher.handle(common::request(Method::GET, "/users/42")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_string(response).await, "42");

    let response = dispatcher.handle(common::request(Method::POST, "/health")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(common::body_string(response).await, "not found");
}

#[tokio::test]
async fn test_options_never_reaches_handlers() {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let dispatcher = Dispatcher::with_interceptors(
        vec![make_route(
            "/*",
            sync_handler(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
                "caught".into_response()
            }),
        )
        .unwrap()],
        Interceptors::new(),
    );

    for path in ["/", "/users/1", "/deep/nested/path"] {
        let response = dispatcher.handle(common::request(Method::OPTIONS, path)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(common::body_string(response).await, "ok");
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_decline_after_inspecting_request() {
    // The first route only handles requests carrying an api key.
    let keyed = make_route("/reports/:id", |ctx: HandlerContext| async move {
        if ctx.request.headers().contains_key("x-api-key") {
            Outcome::Handled(format!("full report {}", ctx.params.get("id").unwrap_or_default()).into_response())
        } else {
            Outcome::NotHandled
        }
    })
    .unwrap();
    let public = make_route("GET /reports/:id", sync_handler(|_| "summary".into_response())).unwrap();
    let dispatcher = Dispatcher::with_interceptors(vec![keyed, public], Interceptors::new());

    let response = dispatcher.handle(common::request(Method::GET, "/reports/7")).await;
    assert_eq!(common::body_string(response).await, "summary");

    let mut request = common::request(Method::GET, "/reports/7");
    request
        .headers_mut()
        .insert("x-api-key", "secret".parse().unwrap());
    let response = dispatcher.handle(request).await;
    assert_eq!(common::body_string(response).await, "full report 7");
}

#[tokio::test]
async fn test_handler_failure_stops_dispatch() {
    let errors = Arc::new(Mutex::new(Vec::<String>::new()));
    let later = Arc::new(AtomicUsize::new(0));
    let (sink, l) = (Arc::clone(&errors), Arc::clone(&later));

    let dispatcher = Dispatcher::with_interceptors(
        vec![
            make_route("POST /orders", |ctx: HandlerContext| async move {
                let order: serde_json::Value = serde_json::from_slice(ctx.request.body())?;
                Ok::<Response, HandlerError>(order.to_string().into_response())
            })
            .unwrap(),
            make_route(
                "/orders",
                sync_handler(move |_| {
                    l.fetch_add(1, Ordering::SeqCst);
                    "fallback".into_response()
                }),
            )
            .unwrap(),
        ],
        Interceptors::new().on_error(move |message, _trace| {
            sink.lock().unwrap().push(message.to_string());
        }),
    );

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/orders")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = dispatcher.handle(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(later.load(Ordering::SeqCst), 0);
    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(!errors[0].is_empty());
}

#[tokio::test]
async fn test_cors_on_every_response() {
    let cors = enable_cors("https://example.com").unwrap();
    let mut interceptors = Interceptors::new();
    interceptors.set_response(cors);

    let failing = make_route(
        "/fail",
        sync_handler(|_| Err::<Response, _>(HandlerError::forbidden("nope"))),
    )
    .unwrap();
    let mut routes = scenario_routes();
    routes.push(failing);
    let dispatcher = Dispatcher::with_interceptors(routes, interceptors);

    for (method, path) in [
        (Method::GET, "/health"),
        (Method::GET, "/missing"),
        (Method::OPTIONS, "/health"),
        (Method::GET, "/fail"),
    ] {
        let response = dispatcher.handle(common::request(method, path)).await;
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://example.com",
            "missing CORS header on {path}"
        );
    }
}

#[tokio::test]
async fn test_independent_dispatchers_keep_their_observers() {
    let a_seen = Arc::new(AtomicUsize::new(0));
    let b_seen = Arc::new(AtomicUsize::new(0));
    let (a, b) = (Arc::clone(&a_seen), Arc::clone(&b_seen));

    let first = Dispatcher::with_interceptors(
        Vec::new(),
        Interceptors::new().on_request(move |_, _| {
            a.fetch_add(1, Ordering::SeqCst);
        }),
    );
    let second = Dispatcher::with_interceptors(
        Vec::new(),
        Interceptors::new().on_request(move |_, _| {
            b.fetch_add(1, Ordering::SeqCst);
        }),
    );

    first.handle(common::request(Method::GET, "/")).await;
    first.handle(common::request(Method::GET, "/")).await;
    second.handle(common::request(Method::GET, "/")).await;

    assert_eq!(a_seen.load(Ordering::SeqCst), 2);
    assert_eq!(b_seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let dispatcher = Dispatcher::with_interceptors(scenario_routes(), Interceptors::new());

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let response = dispatcher
                    .handle(common::request(Method::GET, &format!("/users/{i}")))
                    .await;
                (i, common::body_string(response).await)
            })
        })
        .collect();

    for task in tasks {
        let (i, body) = task.await.unwrap();
        assert_eq!(body, i.to_string());
    }
}

#[tokio::test]
async fn test_host_header_cannot_steer_matching() {
    let mut routes = scenario_routes();
    routes.push(make_route("/admin/*", sync_handler(|_| "ADMIN".into_response())).unwrap());
    let dispatcher = Dispatcher::with_interceptors(routes, Interceptors::new());

    for (host, path) in [("svc/admin", "/"), ("svc#", "/health"), ("svc?", "/health")] {
        let request = axum::http::Request::builder()
            .uri(path)
            .header("host", host)
            .body(axum::body::Body::empty())
            .unwrap();
        let response = dispatcher.handle(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "host {host:?}");
    }

    let response = dispatcher.handle(common::request(Method::GET, "/health")).await;
    assert_eq!(common::body_string(response).await, "ok");
}

#[tokio::test]
async fn test_encoded_literals_match() {
    let dispatcher = Dispatcher::with_interceptors(
        vec![
            make_route("GET /a b", sync_handler(|_| "space".into_response())).unwrap(),
            make_route("GET /café", sync_handler(|_| "cafe".into_response())).unwrap(),
        ],
        Interceptors::new(),
    );

    let response = dispatcher.handle(common::request(Method::GET, "/a%20b")).await;
    assert_eq!(common::body_string(response).await, "space");

    let response = dispatcher.handle(common::request(Method::GET, "/caf%C3%A9")).await;
    assert_eq!(common::body_string(response).await, "cafe");
}

#[tokio::test]
async fn test_body_read_failure_is_bad_request() {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let dispatcher = Dispatcher::with_interceptors(
        vec![make_route(
            "POST /upload",
            sync_handler(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
                "stored".into_response()
            }),
        )
        .unwrap()],
        Interceptors::new(),
    );

    let chunks: Vec<Result<bytes::Bytes, std::io::Error>> = vec![Err(std::io::Error::other("reset"))];
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header("host", "example.test")
        .body(axum::body::Body::from_stream(futures_util::stream::iter(chunks)))
        .unwrap();

    let response = dispatcher.handle(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
