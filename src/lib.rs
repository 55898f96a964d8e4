pub mod app;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;
pub mod storage;
pub mod utils;
