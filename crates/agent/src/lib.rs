//! Host process for the netstat collector: configuration and HTTP surface

pub mod api;
pub mod config;
