pub mod heatmap;
pub mod sampling;
pub mod statistics;
