// Inventory module - Grouping and caching of the Ansible inventory
pub mod builder;
pub mod cache;

pub use builder::{group_vm, BuildOptions, InventoryBuilder};
pub use cache::{InventoryCache, InventorySource};
