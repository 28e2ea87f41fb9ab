pub mod app;
pub mod config;
pub mod container;
pub mod orchestration;
pub mod results;
pub mod shared;
