pub mod admission;
pub mod descriptors;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod launcher;
pub mod load_shape;
pub mod provision;
pub mod reaper;
pub mod refresh;
pub mod registry;
pub mod report_client;
pub mod state_paths;
pub mod terminator;

pub use descriptors::{ClearSummary, RunSummary, StartDescriptor, StopDescriptor};
pub use engine::{RunEngine, StartIntent};
pub use error::EngineError;
pub use inventory::ContainerSummary;
pub use registry::{RunRecord, RunRegistry, RunStatus};
pub use report_client::{HttpReportClient, ReportFetchError, WorkerReportClient};
