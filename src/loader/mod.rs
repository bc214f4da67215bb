pub mod builtins;
pub mod fetcher;
pub mod module;
pub mod registry;

pub use builtins::{BUILTIN_MODULES, builtin_assets, builtin_registry};
pub use fetcher::{AssetFetcher, EmbeddedFetcher, FetchError, HttpFetcher, asset_path};
pub use module::{MarkupOnly, ModuleContext, ModuleExports, ModuleFactory, ModuleInitError, RouteModule};
pub use registry::{ModuleLoader, RegistryLoader};
