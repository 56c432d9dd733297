pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod engine;
pub mod gateway;
pub mod infrastructure;
pub mod projection;
