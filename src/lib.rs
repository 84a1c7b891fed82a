pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod monitoring;
pub mod nutrition;
pub mod planner;
pub mod security;
