pub mod resource_location;
pub mod text;
