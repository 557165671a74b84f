// crates.io
use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header},
};
use httpmock::prelude::*;
use serde_json::Value;
use tower::ServiceExt;
// self
use carrier_bridge::{
	_preludet::*,
	auth::{ScopeSet, TenantCredential, TenantId},
	exchange::Exchanger,
	platform::AppRegistration,
	pricing::HttpPricingProvider,
	rates::RateAggregator,
	server::{self, AppState},
	store::{CredentialStore, MemoryStore},
};

const SECRET: &str = "shared-secret";
const SIGNED_PAYLOAD: &str = "xtqRwgqy4DF66V/vjql1k0aJ/3MI3rAJagmQsGxkw4s=.eyJ1c2VyIjp7ImlkIjo5MTI4LCJlbWFpbCI6Im93bmVyQGV4YW1wbGUuY29tIn0sIm93bmVyIjp7ImlkIjo5MTI4LCJlbWFpbCI6Im93bmVyQGV4YW1wbGUuY29tIn0sImNvbnRleHQiOiJzdG9yZXMvejR6bjN3byIsInN0b3JlX2hhc2giOiJ6NHpuM3dvIiwidGltZXN0YW1wIjoxNzAwMDAwMDAwfQ==";

struct Harness {
	router: Router,
	store: Arc<MemoryStore>,
}

fn harness(token_endpoint: &str, pricing_base: &str) -> Harness {
	let registration = AppRegistration::builder("client-it", SECRET)
		.token_endpoint(Url::parse(token_endpoint).expect("Token endpoint fixture should parse."))
		.redirect_uri(
			Url::parse("https://carrier.example.com/api/auth/callback")
				.expect("Redirect URI fixture should parse."),
		)
		.build()
		.expect("App registration fixture should build.");
	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn CredentialStore> = store_backend.clone();
	let provider = HttpPricingProvider::new(
		Url::parse(pricing_base).expect("Pricing base URL fixture should parse."),
	)
	.expect("Pricing provider should build.");
	let state = AppState::new(
		Exchanger::new(store, registration).expect("Exchanger should build."),
		RateAggregator::new(Arc::new(provider)),
	);

	Harness { router: server::router(state), store: store_backend }
}

fn offline_harness() -> Harness {
	harness("http://127.0.0.1:9/oauth2/token", "http://127.0.0.1:9/pricing")
}

fn tenant(hash: &str) -> TenantId {
	TenantId::new(hash).expect("Tenant identifier fixture should be valid.")
}

async fn call(router: Router, request: Request<Body>) -> (StatusCode, String) {
	let response = router.oneshot(request).await.expect("Router should always respond.");
	let status = response.status();
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Response body should be readable.");

	(status, String::from_utf8(bytes.to_vec()).expect("Response body should be UTF-8."))
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).expect("GET request should build.")
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_owned()))
		.expect("POST request should build.")
}

fn json(body: &str) -> Value {
	serde_json::from_str(body).expect("Response body should be JSON.")
}

#[tokio::test]
async fn liveness_and_connection_checks_respond() {
	let Harness { router, .. } = offline_harness();
	let (status, body) = call(router.clone(), get("/")).await;

	assert_eq!(status, StatusCode::OK);
	assert!(!body.is_empty());

	let (status, body) = call(router.clone(), get("/v1/shipping/connection")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json(&body)["success"], true);

	let (status, body) = call(router, post_json("/v1/shipping/connection", "{}")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json(&body)["message"], "Carrier connected successfully");
}

#[tokio::test]
async fn load_rejects_unsigned_requests() {
	let Harness { router, .. } = offline_harness();
	let (status, body) = call(router.clone(), get("/api/load")).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(json(&body)["error"], "Signed payload failed verification.");

	let tampered = SIGNED_PAYLOAD.replacen("eyJ1", "eyJ2", 1);
	let (status, _) =
		call(router, get(&format!("/api/load?signed_payload={}", urlencode(&tampered)))).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn load_renders_the_dashboard_for_a_verified_payload() {
	let Harness { router, store } = offline_harness();
	let uri = format!("/api/load?signed_payload={}", urlencode(SIGNED_PAYLOAD));
	let (status, body) = call(router.clone(), get(&uri)).await;

	assert_eq!(status, StatusCode::OK);
	assert!(body.contains("Carrier Dashboard"));
	assert!(body.contains("z4zn3wo"));
	assert!(body.contains("Reinstall"));

	let credential = TenantCredential::builder(tenant("z4zn3wo"))
		.access_token("token-abc")
		.scope(ScopeSet::new(["store_v2_shipping"]).expect("Scope fixture should be valid."))
		.build()
		.expect("Credential fixture should build.");

	store.set(credential).await.expect("Memory store write should succeed.");

	let (status, body) = call(router, get(&uri)).await;

	assert_eq!(status, StatusCode::OK);
	assert!(body.contains("connected"));
}

#[tokio::test]
async fn rates_fall_back_when_the_provider_is_down() {
	let Harness { router, .. } = offline_harness();
	let shipment = r#"{"base_options":{"origin":{"zip":"L6H7T7"},"destination":{"zip":"M4B1B3"},"items":[{"quantity":1,"weight":{"value":2,"units":"kg"}}]}}"#;

	for uri in ["/api/rates", "/v1/shipping/rates"] {
		let (status, body) = call(router.clone(), post_json(uri, shipment)).await;
		let body = json(&body);

		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["data"][0]["code"], "standard");
		assert_eq!(body["data"][0]["cost"], 10.5);
		assert_eq!(body["data"][1]["code"], "express");
		assert_eq!(body["data"][1]["cost"], 25.0);
	}

	let (status, body) = call(router, post_json("/api/rates", "not json")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json(&body)["data"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn uninstall_forgets_the_tenant() {
	let Harness { router, store } = offline_harness();
	let credential = TenantCredential::builder(tenant("abc123"))
		.access_token("token-abc")
		.scope(ScopeSet::new(["store_v2_shipping"]).expect("Scope fixture should be valid."))
		.build()
		.expect("Credential fixture should build.");

	store.set(credential).await.expect("Memory store write should succeed.");

	let (status, body) =
		call(router.clone(), post_json("/api/uninstall", r#"{"store_hash":"abc123"}"#)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json(&body)["success"], true);
	assert!(store.is_empty());

	let (status, body) = call(router.clone(), post_json("/api/uninstall", "{}")).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json(&body)["error"], "Missing required parameter `store_hash`.");

	let untyped = Request::builder()
		.method("POST")
		.uri("/api/uninstall")
		.body(Body::from("store_hash=abc123"))
		.expect("POST request should build.");
	let (status, body) = call(router, untyped).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json(&body)["error"], "Missing required parameter `store_hash`.");
}

#[tokio::test]
async fn rates_merge_live_quotes_and_skip_failed_offerings() {
	let pricing = MockServer::start_async().await;
	let Harness { router, .. } =
		harness("http://127.0.0.1:9/oauth2/token", &pricing.url("/pricing"));

	pricing
		.mock_async(|when, then| {
			when.method(GET).path("/pricing/services");
			then.status(200).header("content-type", "application/json").body(
				"{\"services\":[{\"id\":1,\"name\":\"A\",\"abbreviation\":\"A\"},{\"id\":2,\"name\":\"B\",\"abbreviation\":\"B\"}]}",
			);
		})
		.await;
	pricing
		.mock_async(|when, then| {
			when.method(POST).path("/pricing/price").body_includes("\"service_id\":\"1\"");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"data\":{\"cost\":12.00}}");
		})
		.await;
	pricing
		.mock_async(|when, then| {
			when.method(POST).path("/pricing/price").body_includes("\"service_id\":\"2\"");
			then.status(500).body("pricing failure");
		})
		.await;

	let shipment = r#"{"base_options":{"origin":{"zip":"L6H7T7"},"destination":{"zip":"M4B1B3"},"items":[]}}"#;
	let (status, body) = call(router, post_json("/v1/shipping/rates", shipment)).await;
	let body = json(&body);

	assert_eq!(status, StatusCode::OK);
	assert_eq!(
		body,
		serde_json::json!({
			"data": [{ "code": "a", "display_name": "A", "cost": 12.0, "currency": "CAD" }]
		})
	);
}

#[tokio::test]
async fn callback_exchanges_the_code() {
	let server = MockServer::start_async().await;
	let Harness { router, store } =
		harness(&server.url("/oauth2/token"), "http://127.0.0.1:9/pricing");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token").body_includes("\"code\":\"code-123\"");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"token-abc\",\"context\":\"stores/abc123\"}");
		})
		.await;

	let (status, body) = call(
		router.clone(),
		get("/api/auth/callback?code=code-123&context=stores%2Fabc123&scope=store_v2_shipping"),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert!(body.contains("abc123"));
	assert_eq!(store.len(), 1);

	let (status, body) = call(router, get("/api/auth/callback?context=stores%2Fabc123")).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json(&body)["error"], "Missing required parameter `code`.");
}

#[tokio::test]
async fn callback_relays_upstream_rejections() {
	let server = MockServer::start_async().await;
	let Harness { router, store } =
		harness(&server.url("/oauth2/token"), "http://127.0.0.1:9/pricing");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;

	let (status, body) =
		call(router, get("/api/auth/callback?code=code-123&context=stores%2Fabc123")).await;
	let body = json(&body);

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["upstream"]["status"], 401);
	assert_eq!(body["upstream"]["kind"], "invalid_client");
	assert!(store.is_empty());
}

fn urlencode(raw: &str) -> String {
	url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
