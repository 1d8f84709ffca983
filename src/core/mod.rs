// Core module - Operations against the XenServer API
pub mod api;
pub mod inventory;
pub mod tags;

pub use api::XenApi;
pub use inventory::{BuildOptions, InventoryBuilder, InventoryCache, InventorySource};
pub use tags::{TagAction, TagMutator};
