pub mod commands;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod lifecycle;
pub mod repository;
pub mod server;
pub mod service;
pub mod test_utils;
