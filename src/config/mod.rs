pub mod duration;
pub mod error;
pub mod load;
pub mod paths;
pub mod projects;
pub mod save;
pub mod settings;

pub use duration::RunDuration;
pub use error::ConfigError;
pub use load::{load_global_settings, load_settings_from};
pub use paths::{
    default_global_config_path, CONFIG_PATH_ENV, GLOBAL_SETTINGS_FILE_NAME, GLOBAL_STATE_DIR,
};
pub use projects::{ParametricScenario, ProjectSpec, ScenarioSpec, Stage, StagedScenario};
pub use save::{save_settings, save_settings_to};
pub use settings::{
    ContainerRuntimeSettings, PathSettings, PortSettings, Settings, WorkerSettings,
};
