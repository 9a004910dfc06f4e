pub mod api_connection;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod language;
pub mod search;
pub mod search_index;
