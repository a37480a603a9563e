// nebula-runtime: services shared between the workspace shell and its feature modules
//
// The shell constructs one `SharedServices` at startup and hands it to every
// module it loads. Modules depend on this crate for the contracts only; they
// never construct sessions, clients or caches themselves.

pub mod error;
pub mod http;
pub mod issuer;
pub mod loader;
pub mod navigator;
pub mod query;
pub mod registry;
pub mod services;
pub mod session;
pub mod storage;
pub mod task;
pub mod view;

/// Default per-request timeout applied to backend calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub use error::{ClientError, LoginError, Result, ServicesError, StorageError};
pub use http::{ApiClient, LOGIN_ENTRY_POINT};
pub use issuer::TokenIssuer;
pub use loader::{LoadedModule, ModuleLoadError, ModuleLoader};
pub use navigator::{Navigator, normalize_path};
pub use query::{QueryCache, QueryKey};
pub use registry::{EntrySource, ModuleFactory, ModuleRegistry, ModuleRoute, RegistryError, RemoteModule, RemoteModuleDescriptor};
pub use services::{SHARED_DEPENDENCIES, ServicesConfig, SharedServices, shared_dependency_set};
pub use session::{ClearReason, SessionContext, SessionWriter, TOKEN_KEY};
pub use storage::LocalStorage;
pub use task::Pending;
pub use view::{Component, Element, Intent, UiEvent, View};
