// Infrastructure layer - File formats, configuration and rendering
pub mod config;
pub mod file_output;
pub mod file_repository;
pub mod headed_ascii;
pub mod metrics_log;
pub mod plot_renderer;
pub mod ram_log_reader;
