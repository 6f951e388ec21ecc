// Infrastructure layer (shared components)
pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Domain layer (client state)
pub mod alert;
pub mod notification;
pub mod store;

// Application layer
pub mod admin;
pub mod api;
pub mod facade;
pub mod push;
