pub mod config;
pub mod crud;
pub mod engine;
pub mod http;
pub mod schemas;
