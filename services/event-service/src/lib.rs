pub mod app;
mod coerce;
pub mod config;
pub mod db;
mod frame;
mod handlers;
mod labels;
pub mod models;
mod service;
pub mod state;
pub mod store;
