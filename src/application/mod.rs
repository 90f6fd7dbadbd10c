// Application layer - use cases and long-lived services
pub mod dashboard_repository;
pub mod dashboard_service;
pub mod refresh_scheduler;
pub mod saved_views;
pub mod series_store;
pub mod style_service;
pub mod telemetry_source;
