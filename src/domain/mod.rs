// Domain layer - pure models and geometry, no I/O
pub mod chart;
pub mod dashboard;
pub mod error;
pub mod grid;
pub mod series;
pub mod widget;
