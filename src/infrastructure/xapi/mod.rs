// XAPI module - JSON-RPC access to the XenServer management API
pub mod client;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod session;

pub use client::JsonRpcClient;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockVm, MockXenApi};
pub use session::XenSession;
