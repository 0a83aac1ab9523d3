pub mod analysis;
pub mod diagram;
pub mod schema;
