use crate::core::api::XenApi;
use crate::domain::error::{XenError, XenResult};
use crate::domain::vm::OpaqueRef;
use std::fmt;
use tracing::{debug, info, warn};

/// Tag operation requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagAction {
    Add,
    Remove,
}

impl fmt::Display for TagAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagAction::Add => write!(f, "add"),
            TagAction::Remove => write!(f, "rm"),
        }
    }
}

/// Adds and removes VM tags by VM name.
pub struct TagMutator<'a, A: XenApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: XenApi + ?Sized> TagMutator<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    pub async fn add_tag(&self, vm_name: &str, tag: &str) -> XenResult<()> {
        self.apply(TagAction::Add, vm_name, tag).await
    }

    pub async fn remove_tag(&self, vm_name: &str, tag: &str) -> XenResult<()> {
        self.apply(TagAction::Remove, vm_name, tag).await
    }

    pub async fn apply(&self, action: TagAction, vm_name: &str, tag: &str) -> XenResult<()> {
        let vm = self.resolve(vm_name).await?;
        match action {
            TagAction::Add => self.api.add_tag(&vm, tag).await?,
            TagAction::Remove => self.api.remove_tag(&vm, tag).await?,
        }
        info!("{} tag '{}' on VM '{}'", action, tag, vm_name);
        Ok(())
    }

    /// First VM carrying the name. Name labels are not unique in XAPI, so
    /// with several matches the choice is arbitrary.
    async fn resolve(&self, vm_name: &str) -> XenResult<OpaqueRef> {
        let matches = self.api.vms_by_name(vm_name).await?;
        if matches.len() > 1 {
            warn!(
                "{} VMs are named '{}', using the first one",
                matches.len(),
                vm_name
            );
        }
        let vm = matches.into_iter().next().ok_or_else(|| XenError::VmNotFound {
            name: vm_name.to_string(),
        })?;
        debug!("Resolved VM '{}' to {}", vm_name, vm);
        Ok(vm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::xapi::mock::{MockVm, MockXenApi};

    fn api() -> MockXenApi {
        MockXenApi::new()
            .with_vm(MockVm::new("web-01").with_tags(&["linux"]))
            .with_vm(MockVm::new("db-01"))
    }

    #[test]
    fn test_add_then_remove_restores_tags() {
        tokio_test::block_on(async {
            let api = api();
            let before = api.tags_of("web-01").await;
            let mutator = TagMutator::new(&api);

            mutator.add_tag("web-01", "foo").await.unwrap();
            assert!(api.tags_of("web-01").await.contains(&"foo".to_string()));

            mutator.remove_tag("web-01", "foo").await.unwrap();
            assert_eq!(api.tags_of("web-01").await, before);
        });
    }

    #[test]
    fn test_unknown_vm() {
        tokio_test::block_on(async {
            let api = api();
            let result = TagMutator::new(&api).add_tag("nope", "foo").await;
            assert!(matches!(result, Err(XenError::VmNotFound { name }) if name == "nope"));
        });
    }

    #[test]
    fn test_duplicate_names_use_first_match() {
        tokio_test::block_on(async {
            let api = MockXenApi::new()
                .with_vm(MockVm::new("twin"))
                .with_vm(MockVm::new("twin").with_tags(&["second"]));

            TagMutator::new(&api).add_tag("twin", "first").await.unwrap();

            let vms = api.list_vms().await.unwrap();
            assert_eq!(api.vm_tags(&vms[0]).await.unwrap(), vec!["first".to_string()]);
            assert_eq!(api.vm_tags(&vms[1]).await.unwrap(), vec!["second".to_string()]);
        });
    }

    #[test]
    fn test_remote_failure_is_returned() {
        tokio_test::block_on(async {
            let api = api().failing_on("VM.add_tags");
            let result = TagMutator::new(&api).add_tag("web-01", "foo").await;
            assert!(matches!(result, Err(XenError::Api(_))));
        });
    }
}
