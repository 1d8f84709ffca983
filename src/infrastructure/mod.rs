// Infrastructure module - External integrations
pub mod config;
pub mod logging;
pub mod xapi;
