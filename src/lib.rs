pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod models;
pub mod output;
pub mod ratings;
pub mod search;
pub mod services;
pub mod store;
pub mod web;
