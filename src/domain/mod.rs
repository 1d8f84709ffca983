// Domain module - Core types shared by both tools
pub mod config;
pub mod error;
pub mod inventory;
pub mod vm;
