// src/lib.rs
pub mod cert;
pub mod command;
pub mod config;
pub mod error;
pub mod kubeconfig;
pub mod truststore;
pub mod utils;
