pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod imagery;
pub mod models;
pub mod paths;
pub mod repository;
pub mod schema;
pub mod services;
