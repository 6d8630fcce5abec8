pub mod cli;
pub mod config;
pub mod data;
pub mod dps;
pub mod server;
pub mod stats;
pub mod unpacker;
