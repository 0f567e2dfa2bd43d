pub mod auth;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod field;
pub mod filter;
pub mod form;
pub mod logging;
pub mod presentation;
pub mod services;
pub mod session;
