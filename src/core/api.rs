use crate::domain::error::XenResult;
use crate::domain::vm::{GuestMetrics, OpaqueRef, VmRecord};
use async_trait::async_trait;

/// The XAPI calls the tools depend on, bound to an authenticated session.
#[async_trait]
pub trait XenApi: Send + Sync {
    /// All VM handles on the host (`VM.get_all`)
    async fn list_vms(&self) -> XenResult<Vec<OpaqueRef>>;

    /// VMs whose name label matches exactly (`VM.get_by_name_label`)
    async fn vms_by_name(&self, name: &str) -> XenResult<Vec<OpaqueRef>>;

    /// Full VM record (`VM.get_record`)
    async fn vm_record(&self, vm: &OpaqueRef) -> XenResult<VmRecord>;

    /// Current tag set (`VM.get_tags`)
    async fn vm_tags(&self, vm: &OpaqueRef) -> XenResult<Vec<String>>;

    /// Add a tag (`VM.add_tags`); adding a present tag is a no-op remotely
    async fn add_tag(&self, vm: &OpaqueRef, tag: &str) -> XenResult<()>;

    /// Remove a tag (`VM.remove_tags`)
    async fn remove_tag(&self, vm: &OpaqueRef, tag: &str) -> XenResult<()>;

    /// Guest tools metrics (`VM_guest_metrics.get_record`)
    async fn guest_metrics(&self, metrics: &OpaqueRef) -> XenResult<GuestMetrics>;
}
