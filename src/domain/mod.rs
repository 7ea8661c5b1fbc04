// Domain layer - Series, metrics and contingency models
pub mod contingency;
pub mod metrics;
pub mod series;
pub mod sweep;
pub mod variant;
