pub mod config;
pub mod models;
pub mod parser;
pub mod stats;
pub mod wbbot;
pub mod wbdb;
