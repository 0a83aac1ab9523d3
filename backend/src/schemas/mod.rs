pub mod analysis;
pub mod diagram;
