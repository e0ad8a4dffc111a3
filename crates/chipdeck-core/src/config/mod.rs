mod dirs;
mod settings;
mod validation;

pub use dirs::{Directories, runtime_dir};
pub use settings::{BackendConfig, CacheConfig, Config};
pub use validation::{invalid_entities, unknown_fields, warn_config_issues};
