pub mod browser;
pub mod config;
pub mod error;
pub mod fetch;
pub mod links;
pub mod local;
pub mod parser;
pub mod record;
pub mod store;
