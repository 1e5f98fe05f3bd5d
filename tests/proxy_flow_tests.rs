//! # 代理全链路测试
//!
//! 真实路由 + 本地桩上游，覆盖一次性转发、拦截、
//! 未知模型、流式中继等端到端场景

mod common;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use axum::routing::{any, post};
use common::{MapClassifier, setup_db};
use entity::{firewall_event, request_log, response_log};
use guard_proxy::audit::AuditLogger;
use guard_proxy::auth::DerivedKeyStore;
use guard_proxy::classifier::Classify;
use guard_proxy::config::{InternalModels, ProviderCatalog};
use guard_proxy::firewall::{FirewallChain, FirewallConfig, RequestHook};
use guard_proxy::proxy::build_http_client;
use guard_proxy::registry::ModelRegistry;
use guard_proxy::server::{AppState, create_routes};
use http_body_util::BodyExt;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// 桩上游记录的请求
#[derive(Clone, Default)]
struct UpstreamRecorder {
    bodies: Arc<Mutex<Vec<Value>>>,
    paths: Arc<Mutex<Vec<String>>>,
}

impl UpstreamRecorder {
    fn call_count(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }
}

/// 启动一个记录请求并返回固定JSON的桩上游
async fn spawn_unary_upstream(recorder: UpstreamRecorder) -> SocketAddr {
    let app = Router::new().route(
        "/{*path}",
        any(move |req: Request<Body>| {
            let recorder = recorder.clone();
            async move {
                recorder
                    .paths
                    .lock()
                    .unwrap()
                    .push(req.uri().path().to_string());
                let bytes = axum::body::to_bytes(req.into_body(), 1024 * 1024)
                    .await
                    .unwrap();
                let body: Value = serde_json::from_slice(&bytes).unwrap();
                recorder.bodies.lock().unwrap().push(body);
                axum::Json(json!({
                    "id": "cmpl-1",
                    "choices": [{"message": {"role": "assistant", "content": "hello"}}],
                    "usage": {"prompt_tokens": 3, "completion_tokens": 5, "total_tokens": 8}
                }))
            }
        }),
    );
    spawn_server(app).await
}

/// 启动一个分三帧带间隔输出的流式桩上游
async fn spawn_streaming_upstream() -> SocketAddr {
    let app = Router::new().route(
        "/{*path}",
        post(|| async {
            let stream = async_stream::stream! {
                for i in 0..3u8 {
                    if i > 0 {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                    yield Ok::<_, std::io::Error>(Bytes::from(format!("data: chunk-{i}\n\n")));
                }
            };
            Response::builder()
                .status(200)
                .header("content-type", "text/event-stream")
                .body(Body::from_stream(stream))
                .unwrap()
        }),
    );
    spawn_server(app).await
}

async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("绑定桩上游失败");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// 组装被测状态；hook 为 None 时是纯代理模式
async fn test_state(db: DatabaseConnection, hook: Option<Arc<dyn RequestHook>>) -> AppState {
    AppState {
        registry: Arc::new(ModelRegistry::new()),
        providers: Arc::new(ProviderCatalog::default()),
        audit: Arc::new(AuditLogger::new(db)),
        http_client: build_http_client().unwrap(),
        key_store: Arc::new(DerivedKeyStore),
        hook,
    }
}

fn firewall_hook(audit: Arc<AuditLogger>, classifier: Arc<dyn Classify>) -> Arc<dyn RequestHook> {
    let models = InternalModels::from_yaml(
        r"
- model: model-a
  type: text-classification
",
    )
    .unwrap();
    let config = FirewallConfig::from_yaml(
        r"
name: e2e
firewalls:
  - enabled: true
    type: prompt-injection
    model: model-a
    blocking_threshold: 0.5
",
        &models,
    )
    .unwrap();
    Arc::new(FirewallChain::new(Arc::new(config), classifier, audit))
}

async fn register_model(router: &Router, name: &str, upstream: SocketAddr) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/model/register")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "name": name,
                        "model": "gpt-4",
                        "api_url": format!("http://{upstream}/v1"),
                        "provider": "openai",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body = read_json(response).await;
    assert_eq!(body["status"], "model registered");
    assert_eq!(body["name"], name);
    assert_eq!(body["model"], "gpt-4");
}

fn generate_request(model: &str, stream: bool) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header("authorization", "Bearer k1")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "model": model,
                "stream": stream,
                "messages": [{"role": "user", "content": "hi"}],
            })
            .to_string(),
        ))
        .unwrap()
}

async fn read_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// 响应行在独立任务里落库，轮询等待
async fn wait_for_response_rows(db: &DatabaseConnection, expected: usize) -> Vec<response_log::Model> {
    for _ in 0..100 {
        let rows = response_log::Entity::find().all(db).await.unwrap();
        if rows.len() >= expected {
            return rows;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("等待响应行超时");
}

#[tokio::test]
async fn happy_path_unary_relays_and_audits() {
    let recorder = UpstreamRecorder::default();
    let upstream = spawn_unary_upstream(recorder.clone()).await;

    let db = setup_db().await;
    let state = test_state(db.clone(), None).await;
    let router = create_routes(state);

    register_model(&router, "m1", upstream).await;

    let response = router
        .clone()
        .oneshot(generate_request("m1", false))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = read_json(response).await;
    assert_eq!(body["id"], "cmpl-1");

    // 上游收到重写后的请求：model 换成上游标识，路径拼接完整
    assert_eq!(recorder.call_count(), 1);
    assert_eq!(recorder.bodies.lock().unwrap()[0]["model"], "gpt-4");
    assert_eq!(recorder.bodies.lock().unwrap()[0]["stream"], false);
    assert_eq!(
        recorder.paths.lock().unwrap()[0],
        "/v1/chat/completions"
    );

    // 请求行与响应行同一 request_id
    let requests = request_log::Entity::find().all(&db).await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "m1");

    let responses = wait_for_response_rows(&db, 1).await;
    assert_eq!(responses[0].request_id, requests[0].request_id);
    assert_eq!(responses[0].input_tokens, Some(3));
    assert_eq!(responses[0].output_tokens, Some(5));
    assert_eq!(responses[0].total_tokens, Some(8));
}

#[tokio::test]
async fn blocked_request_never_reaches_upstream() {
    let recorder = UpstreamRecorder::default();
    let upstream = spawn_unary_upstream(recorder.clone()).await;

    let db = setup_db().await;
    let audit = Arc::new(AuditLogger::new(db.clone()));
    let classifier: Arc<dyn Classify> = Arc::new(
        MapClassifier::new().with_response("model-a", &["jailbreak", "safe"], &[0.9, 0.1]),
    );
    let mut state = test_state(db.clone(), None).await;
    state.audit = Arc::clone(&audit);
    state.hook = Some(firewall_hook(audit, classifier));
    let router = create_routes(state);

    register_model(&router, "m1", upstream).await;

    let response = router
        .clone()
        .oneshot(generate_request("m1", false))
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body = read_json(response).await;
    assert_eq!(body["error"], "request rejected: blocked by firewall");

    // 不触达上游，没有响应行，事件行记录拦截
    assert_eq!(recorder.call_count(), 0);
    assert_eq!(
        response_log::Entity::find().all(&db).await.unwrap().len(),
        0
    );
    let events = firewall_event::Entity::find().all(&db).await.unwrap();
    assert_eq!(events.len(), 1);
    assert!(events[0].blocked);
    assert_eq!(events[0].firewall_type, "prompt-injection");
}

#[tokio::test]
async fn all_safe_labels_allow_forwarding() {
    let recorder = UpstreamRecorder::default();
    let upstream = spawn_unary_upstream(recorder.clone()).await;

    let db = setup_db().await;
    let audit = Arc::new(AuditLogger::new(db.clone()));
    let classifier: Arc<dyn Classify> =
        Arc::new(MapClassifier::new().with_response("model-a", &["SAFE"], &[0.99]));
    let mut state = test_state(db.clone(), None).await;
    state.audit = Arc::clone(&audit);
    state.hook = Some(firewall_hook(audit, classifier));
    let router = create_routes(state);

    register_model(&router, "m1", upstream).await;

    let response = router
        .clone()
        .oneshot(generate_request("m1", false))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(recorder.call_count(), 1);
}

#[tokio::test]
async fn unknown_model_fails_fast_without_audit_rows() {
    let db = setup_db().await;
    let state = test_state(db.clone(), None).await;
    let router = create_routes(state);

    let response = router
        .clone()
        .oneshot(generate_request("nope", false))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body = read_json(response).await;
    assert_eq!(body["error"], "model not found");

    assert_eq!(request_log::Entity::find().all(&db).await.unwrap().len(), 0);
}

#[tokio::test]
async fn missing_bearer_key_is_unauthorized() {
    let db = setup_db().await;
    let router = create_routes(test_state(db, None).await);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/chat/completions")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "model": "m1",
                        "messages": [{"role": "user", "content": "hi"}],
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let recorder = UpstreamRecorder::default();
    let upstream = spawn_unary_upstream(recorder).await;

    let db = setup_db().await;
    let router = create_routes(test_state(db, None).await);

    register_model(&router, "m1", upstream).await;

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/model/register")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "name": "m1",
                        "model": "gpt-4o-mini",
                        "api_url": format!("http://{upstream}/v1"),
                        "provider": "openai",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn streaming_relay_flushes_chunks_and_audits_after_eof() {
    let upstream = spawn_streaming_upstream().await;

    let db = setup_db().await;
    let router = create_routes(test_state(db.clone(), None).await);

    register_model(&router, "m1", upstream).await;

    let start = std::time::Instant::now();
    let response = router
        .clone()
        .oneshot(generate_request("m1", true))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(
        String::from_utf8_lossy(&bytes),
        "data: chunk-0\n\ndata: chunk-1\n\ndata: chunk-2\n\n"
    );
    // 帧间各有50ms间隔，整体耗时体现流式传输
    assert!(start.elapsed() >= Duration::from_millis(90));

    // 最后一帧之后响应行落库，记录的是拼接后的原文
    let responses = wait_for_response_rows(&db, 1).await;
    assert_eq!(
        responses[0].response,
        "data: chunk-0\n\ndata: chunk-1\n\ndata: chunk-2\n\n"
    );
    assert!(responses[0].latency_ms >= 90);
    assert_eq!(responses[0].input_tokens, None);
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let db = setup_db().await;
    let router = create_routes(test_state(db, None).await);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(read_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn list_models_returns_registered_snapshot() {
    let recorder = UpstreamRecorder::default();
    let upstream = spawn_unary_upstream(recorder).await;

    let db = setup_db().await;
    let router = create_routes(test_state(db, None).await);

    register_model(&router, "m1", upstream).await;
    register_model(&router, "m2", upstream).await;

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/model/list")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body = read_json(response).await;
    let models = body["models"].as_array().unwrap();
    assert_eq!(models.len(), 2);
    for model in models {
        assert_eq!(model["model"], "gpt-4");
        assert_eq!(model["provider"], "openai");
        assert_eq!(model["status"], "active");
    }
}
