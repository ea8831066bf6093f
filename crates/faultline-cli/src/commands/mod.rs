pub mod completions;
pub mod config;
pub mod flag;
pub mod report;
pub mod route;
pub mod webhook;
