pub mod api;
pub mod config;
pub mod geo;
pub mod models;
pub mod poller;
pub mod state;
pub mod storage;
pub mod tracker;
pub mod transform;
