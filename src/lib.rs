//! xentools Library
//!
//! XenServer VM tagging and Ansible dynamic inventory, built on the XAPI
//! JSON-RPC interface.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::domain::error::{XapiFailure, XenError, XenResult};
pub use crate::domain::config::{XenCredentials, XenToolsConfig};
pub use crate::domain::inventory::{Group, HostVars, InventoryDocument, ROOT_GROUPS};
pub use crate::core::api::XenApi;
pub use crate::core::inventory::{BuildOptions, InventoryBuilder, InventoryCache, InventorySource};
pub use crate::core::tags::{TagAction, TagMutator};
pub use crate::infrastructure::xapi::XenSession;
