use super::cache::InventorySource;
use crate::core::api::XenApi;
use crate::domain::error::XenResult;
use crate::domain::inventory::{is_root_group, HostVars, InventoryDocument, META_KEY, UNGROUPED};
use crate::domain::vm::VmRecord;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Knobs for [`InventoryBuilder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Group a VM once per network interface rather than once per VM. Hosts
    /// then show up in their tag groups once per interface.
    pub per_interface_passes: bool,
}

/// Builds the Ansible inventory from the VMs on a host.
pub struct InventoryBuilder<'a, A: XenApi + ?Sized> {
    api: &'a A,
    options: BuildOptions,
}

impl<'a, A: XenApi + ?Sized> InventoryBuilder<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self::with_options(api, BuildOptions::default())
    }

    pub fn with_options(api: &'a A, options: BuildOptions) -> Self {
        Self { api, options }
    }

    /// Walk every guest VM and group it by its tags.
    ///
    /// Control domains, templates and VMs without network interfaces are
    /// left out. The first failing remote call aborts the build.
    pub async fn build(&self) -> XenResult<InventoryDocument> {
        let mut inventory = InventoryDocument::new();
        let vms = self.api.list_vms().await?;
        debug!("Host reports {} VM objects", vms.len());

        for vm in &vms {
            let record = self.api.vm_record(vm).await?;
            if !record.is_guest() {
                continue;
            }

            let passes = self.passes(&record);
            if passes == 0 {
                debug!("Skipping VM '{}' without network interfaces", record.name_label);
                continue;
            }

            for _ in 0..passes {
                let tags = self.api.vm_tags(vm).await?;
                group_vm(&mut inventory, &record.name_label, &tags);

                let ansible_host = self.primary_address(&record).await?;
                inventory.set_host_vars(&record.name_label, HostVars { ansible_host });
            }
        }

        info!(
            "Built inventory with {} hosts in {} groups",
            inventory.meta.hostvars.len(),
            inventory.groups.len()
        );
        Ok(inventory)
    }

    fn passes(&self, record: &VmRecord) -> usize {
        if self.options.per_interface_passes {
            record.vifs.len()
        } else {
            usize::from(!record.vifs.is_empty())
        }
    }

    async fn primary_address(&self, record: &VmRecord) -> XenResult<Option<String>> {
        // No guest tools installed
        if record.guest_metrics.is_null() {
            return Ok(None);
        }
        let metrics = self.api.guest_metrics(&record.guest_metrics).await?;
        Ok(metrics.primary_address().map(str::to_string))
    }
}

#[async_trait]
impl<'a, A: XenApi + ?Sized> InventorySource for InventoryBuilder<'a, A> {
    async fn build_inventory(&self) -> XenResult<InventoryDocument> {
        self.build().await
    }
}

/// Place one VM into the inventory according to its tags.
///
/// Untagged VMs go to `ungrouped`. Every tag gets a group; non-root tags
/// receive the VM as a host and become children of each root tag the VM
/// also carries. Root groups never list hosts directly.
pub fn group_vm(inventory: &mut InventoryDocument, vm_name: &str, tags: &[String]) {
    let usable: Vec<&String> = tags
        .iter()
        .filter(|tag| {
            if *tag == META_KEY {
                warn!("Ignoring tag '{}' on VM '{}': reserved name", tag, vm_name);
                return false;
            }
            true
        })
        .collect();

    if usable.is_empty() {
        inventory.add_host(UNGROUPED, vm_name);
        return;
    }

    for tag in &usable {
        inventory.ensure_group(tag);
        if is_root_group(tag) {
            continue;
        }

        inventory.add_host(tag, vm_name);
        for root in usable.iter().filter(|t| is_root_group(t)) {
            inventory.add_child(root, tag);
        }
    }
}
