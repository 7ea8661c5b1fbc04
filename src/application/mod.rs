// Application layer - Alignment, metrics and comparison use cases
pub mod alignment;
pub mod comparison_service;
pub mod metrics_service;
pub mod regression;
pub mod series_repository;
pub mod threshold_service;
