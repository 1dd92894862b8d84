//! Bounding boxes and elementwise series helpers over `glam` vectors for the terra workspace.

mod aabb;
mod series;

pub use aabb::Aabb3;
pub use series::{aggregate_into, gather, map, mean, min, zip_map};
