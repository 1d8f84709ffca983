//! In-memory XAPI for tests

use crate::core::api::XenApi;
use crate::domain::error::{XapiFailure, XenResult};
use crate::domain::vm::{GuestMetrics, OpaqueRef, VmRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// A VM as seeded into [`MockXenApi`].
#[derive(Debug, Clone)]
pub struct MockVm {
    name: String,
    tags: Vec<String>,
    interfaces: usize,
    networks: Vec<(String, String)>,
    has_guest_metrics: bool,
    is_control_domain: bool,
    is_a_template: bool,
}

impl MockVm {
    /// A running guest with one interface and no tags.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tags: Vec::new(),
            interfaces: 1,
            networks: Vec::new(),
            has_guest_metrics: true,
            is_control_domain: false,
            is_a_template: false,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_interfaces(mut self, count: usize) -> Self {
        self.interfaces = count;
        self
    }

    pub fn with_networks(mut self, networks: &[(&str, &str)]) -> Self {
        self.networks = networks
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    pub fn without_guest_metrics(mut self) -> Self {
        self.has_guest_metrics = false;
        self
    }

    pub fn control_domain(mut self) -> Self {
        self.is_control_domain = true;
        self
    }

    pub fn template(mut self) -> Self {
        self.is_a_template = true;
        self
    }
}

#[derive(Default)]
struct MockState {
    vms: Vec<(OpaqueRef, VmRecord)>,
    metrics: HashMap<OpaqueRef, GuestMetrics>,
    calls: Vec<String>,
}

/// Mock XAPI session backed by an in-memory VM table
#[derive(Default)]
pub struct MockXenApi {
    state: Mutex<MockState>,
    failing_method: Option<String>,
}

impl MockXenApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vm(mut self, vm: MockVm) -> Self {
        let state = self.state.get_mut();
        let index = state.vms.len();
        let vm_ref = OpaqueRef::new(format!("OpaqueRef:vm-{}", index));

        let guest_metrics = if vm.has_guest_metrics {
            let gm_ref = OpaqueRef::new(format!("OpaqueRef:gm-{}", index));
            state.metrics.insert(
                gm_ref.clone(),
                GuestMetrics {
                    networks: vm.networks.into_iter().collect(),
                },
            );
            gm_ref
        } else {
            OpaqueRef::null()
        };

        let record = VmRecord {
            name_label: vm.name,
            is_control_domain: vm.is_control_domain,
            is_a_template: vm.is_a_template,
            vifs: (0..vm.interfaces)
                .map(|n| OpaqueRef::new(format!("OpaqueRef:vif-{}-{}", index, n)))
                .collect(),
            guest_metrics,
            tags: vm.tags,
        };
        state.vms.push((vm_ref, record));
        self
    }

    /// Make every call of `method` (XAPI name, e.g. `VM.get_all`) fail.
    pub fn failing_on(mut self, method: &str) -> Self {
        self.failing_method = Some(method.to_string());
        self
    }

    /// Tags of the first VM named `name`; empty if there is none.
    pub async fn tags_of(&self, name: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .vms
            .iter()
            .find(|(_, record)| record.name_label == name)
            .map(|(_, record)| record.tags.clone())
            .unwrap_or_default()
    }

    /// Number of calls made to `method` so far.
    pub async fn call_count(&self, method: &str) -> usize {
        let state = self.state.lock().await;
        state.calls.iter().filter(|m| m.as_str() == method).count()
    }

    async fn enter(&self, method: &str) -> XenResult<tokio::sync::MutexGuard<'_, MockState>> {
        let mut state = self.state.lock().await;
        state.calls.push(method.to_string());
        if self.failing_method.as_deref() == Some(method) {
            return Err(XapiFailure::new("INTERNAL_ERROR", vec![format!("{} failed", method)]).into());
        }
        Ok(state)
    }
}

fn handle_invalid(class: &str, handle: &OpaqueRef) -> XapiFailure {
    XapiFailure::new("HANDLE_INVALID", vec![class.to_string(), handle.to_string()])
}

impl MockState {
    fn record_mut(&mut self, vm: &OpaqueRef) -> XenResult<&mut VmRecord> {
        self.vms
            .iter_mut()
            .find(|(r, _)| r == vm)
            .map(|(_, record)| record)
            .ok_or_else(|| handle_invalid("VM", vm).into())
    }
}

#[async_trait]
impl XenApi for MockXenApi {
    async fn list_vms(&self) -> XenResult<Vec<OpaqueRef>> {
        let state = self.enter("VM.get_all").await?;
        Ok(state.vms.iter().map(|(r, _)| r.clone()).collect())
    }

    async fn vms_by_name(&self, name: &str) -> XenResult<Vec<OpaqueRef>> {
        let state = self.enter("VM.get_by_name_label").await?;
        Ok(state
            .vms
            .iter()
            .filter(|(_, record)| record.name_label == name)
            .map(|(r, _)| r.clone())
            .collect())
    }

    async fn vm_record(&self, vm: &OpaqueRef) -> XenResult<VmRecord> {
        let mut state = self.enter("VM.get_record").await?;
        state.record_mut(vm).map(|record| record.clone())
    }

    async fn vm_tags(&self, vm: &OpaqueRef) -> XenResult<Vec<String>> {
        let mut state = self.enter("VM.get_tags").await?;
        state.record_mut(vm).map(|record| record.tags.clone())
    }

    async fn add_tag(&self, vm: &OpaqueRef, tag: &str) -> XenResult<()> {
        let mut state = self.enter("VM.add_tags").await?;
        let record = state.record_mut(vm)?;
        if !record.tags.iter().any(|t| t == tag) {
            record.tags.push(tag.to_string());
        }
        Ok(())
    }

    async fn remove_tag(&self, vm: &OpaqueRef, tag: &str) -> XenResult<()> {
        let mut state = self.enter("VM.remove_tags").await?;
        state.record_mut(vm)?.tags.retain(|t| t != tag);
        Ok(())
    }

    async fn guest_metrics(&self, metrics: &OpaqueRef) -> XenResult<GuestMetrics> {
        let state = self.enter("VM_guest_metrics.get_record").await?;
        state
            .metrics
            .get(metrics)
            .cloned()
            .ok_or_else(|| handle_invalid("VM_guest_metrics", metrics).into())
    }
}
