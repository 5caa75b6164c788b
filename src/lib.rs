pub mod cli;
pub mod config;
pub mod ingest;
pub mod notification;
pub mod parser;
pub mod pipeline;
pub mod server;
pub mod storage;
