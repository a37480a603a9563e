use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use nebula_protocol::{CreateResourceRequest, Resource};
use nebula_runtime::{ClientError, LocalStorage, LoginError, QueryKey, ServicesConfig, SessionWriter, SharedServices, TokenIssuer};
use parking_lot::Mutex;
use url::Url;

async fn serve(app: Router) -> Url {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	Url::parse(&format!("http://{addr}")).unwrap()
}

fn services(base: Url, location: &str) -> (SharedServices, SessionWriter) {
	SharedServices::new(ServicesConfig {
		api_base_url: base,
		request_timeout: Some(Duration::from_secs(5)),
		storage: LocalStorage::in_memory(),
		initial_location: location.into(),
	})
	.unwrap()
}

fn resource(id: &str, name: &str) -> Resource {
	Resource {
		id: id.into(),
		project_id: "p1".into(),
		name: name.into(),
		description: None,
		default_branch: "main".into(),
	}
}

#[derive(Clone, Default)]
struct Seen {
	auth: Arc<Mutex<Vec<Option<String>>>>,
	hits: Arc<AtomicUsize>,
}

async fn list_repos(State(seen): State<Seen>, headers: HeaderMap) -> Json<Vec<Resource>> {
	seen.hits.fetch_add(1, Ordering::SeqCst);
	let auth = headers
		.get("authorization")
		.and_then(|v| v.to_str().ok())
		.map(String::from);
	seen.auth.lock().push(auth);
	tokio::time::sleep(Duration::from_millis(50)).await;
	Json(vec![resource("r1", "demo")])
}

#[tokio::test]
async fn bearer_header_is_attached_only_with_a_session() {
	let seen = Seen::default();
	let app = Router::new().route("/api/repos", get(list_repos)).with_state(seen.clone());
	let (services, writer) = services(serve(app).await, "/");

	let _: Vec<Resource> = services.api().get_json("/api/repos", &[("projectId", "p1")], "Failed to load repos").await.unwrap();
	writer.set_token("T");
	let _: Vec<Resource> = services.api().get_json("/api/repos", &[("projectId", "p1")], "Failed to load repos").await.unwrap();

	let auth = seen.auth.lock().clone();
	assert_eq!(auth, vec![None, Some("Bearer T".to_string())]);
}

#[tokio::test]
async fn unauthorized_clears_session_and_returns_to_login() {
	let app = Router::new().route("/api/repos", get(|| async { StatusCode::UNAUTHORIZED }));
	let (services, writer) = services(serve(app).await, "/repos/r1");
	writer.set_token("stale");

	let result: Result<Vec<Resource>, _> = services.api().get_json("/api/repos", &[], "Failed to load repos").await;

	assert_eq!(result.unwrap_err(), ClientError::AuthExpired);
	assert!(!services.session().is_authenticated());
	assert_eq!(services.navigator().location(), "/");
}

#[tokio::test]
async fn failed_responses_carry_readable_messages() {
	let app = Router::new()
		.route(
			"/api/repos",
			post(|| async { (StatusCode::CONFLICT, Json(serde_json::json!({ "message": "Repository already exists" }))) }),
		)
		.route(
			"/api/repos/r1/ide/launch",
			post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>upstream died</html>").into_response() }),
		)
		.route("/api/repos/r2/ide/launch", post(|| async { (StatusCode::BAD_GATEWAY, Json(serde_json::json!({}))) }));
	let (services, writer) = services(serve(app).await, "/");
	writer.set_token("T");

	let body = CreateResourceRequest {
		project_id: "p1".into(),
		name: "demo".into(),
		description: None,
	};
	let err = services
		.api()
		.post_json::<_, Resource>("/api/repos", &body, "Failed to create repo")
		.await
		.unwrap_err();
	assert_eq!(
		err,
		ClientError::RequestFailed {
			status: 409,
			message: "Repository already exists".into()
		}
	);

	let err = services
		.api()
		.post_empty::<serde_json::Value>(&["api", "repos", "r1", "ide", "launch"], "Failed to launch IDE")
		.await
		.unwrap_err();
	assert_eq!(err.to_string(), "Internal Server Error");

	let err = services
		.api()
		.post_empty::<serde_json::Value>(&["api", "repos", "r2", "ide", "launch"], "Failed to launch IDE")
		.await
		.unwrap_err();
	assert_eq!(err.to_string(), "Failed to launch IDE (502)");
	assert!(services.session().is_authenticated(), "non-401 failures keep the session");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let (services, _writer) = services(Url::parse(&format!("http://{addr}")).unwrap(), "/");
	let err = services
		.api()
		.get_json::<Vec<Resource>>("/api/repos", &[], "Failed to load repos")
		.await
		.unwrap_err();
	assert!(matches!(err, ClientError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
	let seen = Seen::default();
	let app = Router::new().route("/code/api/repos", get(list_repos)).with_state(seen.clone());
	let base = serve(app).await.join("/code/").unwrap();
	let (services, _writer) = services(base, "/");

	let repos: Vec<Resource> = services.api().get_json("/api/repos", &[], "Failed to load repos").await.unwrap();
	assert_eq!(repos.len(), 1);
	assert_eq!(seen.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_list_queries_share_one_request() {
	let seen = Seen::default();
	let app = Router::new().route("/api/repos", get(list_repos)).with_state(seen.clone());
	let (services, writer) = services(serve(app).await, "/");
	writer.set_token("T");

	let key = QueryKey::new(["repos", "p1"]);
	let fetch = || {
		let api = services.api().clone();
		move || async move { api.get_json::<Vec<Resource>>("/api/repos", &[("projectId", "p1")], "Failed to load repos").await }
	};

	let (a, b) = tokio::join!(
		services.queries().fetch(key.clone(), fetch()),
		services.queries().fetch(key.clone(), fetch()),
	);
	let (a, b) = (a.unwrap(), b.unwrap());
	assert_eq!(seen.hits.load(Ordering::SeqCst), 1);
	assert_eq!(a, b);

	services.queries().fetch(key.clone(), fetch()).await.unwrap();
	assert_eq!(seen.hits.load(Ordering::SeqCst), 1, "settled results are served from cache");

	services.queries().invalidate(&QueryKey::new(["repos"]));
	services.queries().fetch(key, fetch()).await.unwrap();
	assert_eq!(seen.hits.load(Ordering::SeqCst), 2);
}

#[derive(serde::Deserialize)]
struct TokenForm {
	client_id: String,
	grant_type: String,
	username: String,
	password: String,
}

async fn issue_token(Form(form): Form<TokenForm>) -> axum::response::Response {
	if form.client_id == "workspace" && form.grant_type == "password" && form.username == "u" && form.password == "p" {
		Json(serde_json::json!({ "access_token": "T", "token_type": "Bearer", "expires_in": 300 })).into_response()
	} else {
		(StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "error": "invalid_grant" }))).into_response()
	}
}

#[tokio::test]
async fn token_issuer_exchanges_password_for_token() {
	let app = Router::new().route("/token", post(issue_token));
	let endpoint = serve(app).await.join("/token").unwrap();
	let issuer = TokenIssuer::new(endpoint, "workspace", Some(Duration::from_secs(5))).unwrap();

	assert_eq!(issuer.exchange("u", "p").await.unwrap(), "T");
	assert_eq!(issuer.exchange("u", "wrong").await.unwrap_err(), LoginError::InvalidCredentials);
	assert_eq!(issuer.exchange("", "p").await.unwrap_err(), LoginError::MissingCredentials);
	assert_eq!(LoginError::InvalidCredentials.to_string(), "Invalid credentials");
}
