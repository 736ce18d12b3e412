pub mod factory;
pub mod labels;
pub mod resources;

pub use resources::{ChildResource, http_scaled_object_resource};
