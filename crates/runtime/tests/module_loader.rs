use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::FutureExt;
use futures::future::BoxFuture;
use nebula_protocol::RemoteEntryManifest;
use nebula_runtime::{
	Component, Element, EntrySource, LocalStorage, ModuleLoadError, ModuleLoader, ModuleRegistry, ModuleRoute, RemoteModule, RemoteModuleDescriptor,
	SHARED_DEPENDENCIES, ServicesConfig, SharedServices, UiEvent, View,
};
use parking_lot::Mutex;
use url::Url;

const NAME: &str = "codeRemote";
const BINDING: &str = "./CodeApp";

async fn serve(app: Router) -> Url {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	Url::parse(&format!("http://{addr}")).unwrap()
}

fn host_services() -> SharedServices {
	let (services, _writer) = SharedServices::new(ServicesConfig {
		api_base_url: Url::parse("http://127.0.0.1:9").unwrap(),
		request_timeout: Some(Duration::from_secs(5)),
		storage: LocalStorage::in_memory(),
		initial_location: "/repos".into(),
	})
	.unwrap();
	services
}

fn manifest(shared: &[&str]) -> RemoteEntryManifest {
	RemoteEntryManifest {
		name: NAME.into(),
		version: Some("0.4.0".into()),
		exposes: [BINDING.to_string()].into_iter().collect(),
		shared: shared.iter().map(|s| s.to_string()).collect(),
	}
}

struct Probe {
	services: SharedServices,
}

struct ProbeView {
	location: String,
}

impl Component for ProbeView {
	fn render(&mut self) -> View {
		View::new().with(Element::text(format!("probe at {}", self.location)))
	}

	fn dispatch(&mut self, _event: &UiEvent) -> bool {
		false
	}

	fn settle(&mut self) -> BoxFuture<'_, ()> {
		async {}.boxed()
	}
}

impl RemoteModule for Probe {
	fn name(&self) -> &str {
		NAME
	}

	fn mount(&self, _route: &ModuleRoute) -> Box<dyn Component> {
		Box::new(ProbeView {
			location: self.services.navigator().location(),
		})
	}
}

/// Descriptor whose factory records every invocation and the services it received.
fn probe_descriptor(entry: EntrySource, calls: Arc<AtomicUsize>, received: Arc<Mutex<Option<SharedServices>>>) -> RemoteModuleDescriptor {
	RemoteModuleDescriptor::new(NAME, entry).expose(BINDING, move |services: &SharedServices| {
		calls.fetch_add(1, Ordering::SeqCst);
		*received.lock() = Some(services.clone());
		Ok(Arc::new(Probe { services: services.clone() }) as Arc<dyn RemoteModule>)
	})
}

fn loader_for(descriptor: RemoteModuleDescriptor, services: SharedServices) -> ModuleLoader {
	let mut registry = ModuleRegistry::new();
	registry.register(descriptor).unwrap();
	ModuleLoader::new(registry, services, Some(Duration::from_secs(5))).unwrap()
}

#[derive(Clone)]
struct EntryState {
	hits: Arc<AtomicUsize>,
	status: StatusCode,
	body: String,
}

async fn entry(State(state): State<EntryState>) -> Response {
	state.hits.fetch_add(1, Ordering::SeqCst);
	tokio::time::sleep(Duration::from_millis(20)).await;
	(state.status, state.body.clone()).into_response()
}

async fn entry_server(status: StatusCode, body: String) -> (Url, Arc<AtomicUsize>) {
	let hits = Arc::new(AtomicUsize::new(0));
	let app = Router::new().route("/remoteEntry.json", get(entry)).with_state(EntryState {
		hits: Arc::clone(&hits),
		status,
		body,
	});
	(serve(app).await.join("/remoteEntry.json").unwrap(), hits)
}

#[tokio::test]
async fn entry_manifest_is_fetched_once_per_loader() {
	let body = serde_json::to_string(&manifest(&SHARED_DEPENDENCIES)).unwrap();
	let (url, hits) = entry_server(StatusCode::OK, body).await;
	let calls = Arc::new(AtomicUsize::new(0));
	let loader = loader_for(
		probe_descriptor(EntrySource::Remote(url), Arc::clone(&calls), Arc::default()),
		host_services(),
	);

	let (a, b) = tokio::join!(loader.load(NAME, BINDING), loader.load(NAME, BINDING));
	let (a, b) = (a.unwrap(), b.unwrap());
	let c = loader.load(NAME, BINDING).await.unwrap();

	assert_eq!(hits.load(Ordering::SeqCst), 1);
	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert!(Arc::ptr_eq(&a.module, &b.module));
	assert!(Arc::ptr_eq(&a.module, &c.module));
	assert!(loader.is_loaded(NAME, BINDING));
}

#[tokio::test]
async fn module_receives_the_host_instances() {
	let host = host_services();
	let received = Arc::new(Mutex::new(None));
	let loader = loader_for(
		probe_descriptor(EntrySource::Bundled(manifest(&SHARED_DEPENDENCIES)), Arc::default(), Arc::clone(&received)),
		host.clone(),
	);

	let loaded = loader.load(NAME, BINDING).await.unwrap();
	assert_eq!(loaded.module.name(), NAME);
	let received = received.lock().clone().expect("factory ran");
	assert!(received.same_instances(&host));

	let mut view = loaded.module.mount(&ModuleRoute::new("/repos", ""));
	assert!(view.render().contains_text("probe at /repos"));
}

#[tokio::test]
async fn unknown_module_is_not_found() {
	let loader = loader_for(
		probe_descriptor(EntrySource::Bundled(manifest(&SHARED_DEPENDENCIES)), Arc::default(), Arc::default()),
		host_services(),
	);
	let err = loader.load("dataRemote", BINDING).await.unwrap_err();
	assert_eq!(err, ModuleLoadError::NotFound { name: "dataRemote".into() });
}

#[tokio::test]
async fn unreachable_entry_is_a_fetch_error_and_is_retried() {
	let (url, hits) = entry_server(StatusCode::SERVICE_UNAVAILABLE, String::new()).await;
	let calls = Arc::new(AtomicUsize::new(0));
	let loader = loader_for(
		probe_descriptor(EntrySource::Remote(url), Arc::clone(&calls), Arc::default()),
		host_services(),
	);

	let err = loader.load(NAME, BINDING).await.unwrap_err();
	assert!(matches!(err, ModuleLoadError::Fetch { .. }), "got {err:?}");
	assert_eq!(err.kind(), "fetch");

	loader.load(NAME, BINDING).await.unwrap_err();
	assert_eq!(hits.load(Ordering::SeqCst), 2, "failed loads are not cached");
	assert_eq!(calls.load(Ordering::SeqCst), 0);
	assert!(!loader.is_loaded(NAME, BINDING));
}

#[tokio::test]
async fn malformed_entry_is_an_invalid_manifest() {
	let (url, _hits) = entry_server(StatusCode::OK, "<html>not a manifest</html>".into()).await;
	let loader = loader_for(probe_descriptor(EntrySource::Remote(url), Arc::default(), Arc::default()), host_services());

	let err = loader.load(NAME, BINDING).await.unwrap_err();
	assert!(matches!(err, ModuleLoadError::InvalidManifest { .. }), "got {err:?}");
}

#[tokio::test]
async fn shared_mismatch_is_reported_before_module_code_runs() {
	let calls = Arc::new(AtomicUsize::new(0));
	let loader = loader_for(
		probe_descriptor(
			EntrySource::Bundled(manifest(&["api-client", "navigator", "session"])),
			Arc::clone(&calls),
			Arc::default(),
		),
		host_services(),
	);

	let err = loader.load(NAME, BINDING).await.unwrap_err();
	assert_eq!(
		err,
		ModuleLoadError::SharedMismatch {
			name: NAME.into(),
			missing: vec!["query-cache".into()],
			unexpected: vec![],
		}
	);
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unexposed_binding_is_rejected() {
	let loader = loader_for(
		probe_descriptor(EntrySource::Bundled(manifest(&SHARED_DEPENDENCIES)), Arc::default(), Arc::default()),
		host_services(),
	);
	let err = loader.load(NAME, "./DatasetsApp").await.unwrap_err();
	assert!(matches!(err, ModuleLoadError::BindingNotExposed { .. }), "got {err:?}");
}

#[tokio::test]
async fn factory_failures_are_init_errors() {
	let panicked = Arc::new(AtomicBool::new(false));
	let flag = Arc::clone(&panicked);
	let mut registry = ModuleRegistry::new();
	registry
		.register(
			RemoteModuleDescriptor::new(NAME, EntrySource::Bundled(manifest(&SHARED_DEPENDENCIES)))
				.expose(BINDING, |_: &SharedServices| Err("missing project id".to_string())),
		)
		.unwrap();
	let mut exposes = manifest(&SHARED_DEPENDENCIES);
	exposes.name = "panicky".into();
	registry
		.register(RemoteModuleDescriptor::new("panicky", EntrySource::Bundled(exposes)).expose(
			BINDING,
			move |_: &SharedServices| -> Result<Arc<dyn RemoteModule>, String> {
				flag.store(true, Ordering::SeqCst);
				panic!("module exploded")
			},
		))
		.unwrap();
	let loader = ModuleLoader::new(registry, host_services(), None).unwrap();

	let err = loader.load(NAME, BINDING).await.unwrap_err();
	assert_eq!(
		err,
		ModuleLoadError::Init {
			name: NAME.into(),
			binding: BINDING.into(),
			message: "missing project id".into(),
		}
	);

	let err = loader.load("panicky", BINDING).await.unwrap_err();
	assert!(panicked.load(Ordering::SeqCst));
	match err {
		ModuleLoadError::Init { message, .. } => assert_eq!(message, "module exploded"),
		other => panic!("unexpected {other:?}"),
	}
}
