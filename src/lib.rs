pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod dump;
pub mod search;
pub mod state;
