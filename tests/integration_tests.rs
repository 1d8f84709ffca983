use serde_json::{json, Map, Value};
use std::cell::RefCell;
use std::fs;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use xentools::cli::args::{InventoryMode, TagCommand};
use xentools::cli::commands::{tag_vm, write_inventory};
use xentools::cli::output::{render_json, OutputError, OutputWriter};
use xentools::infrastructure::xapi::{MockVm, MockXenApi};
use xentools::{
    BuildOptions, InventoryBuilder, InventoryCache, InventoryDocument, XenApi, XenError, ROOT_GROUPS,
};

/// Integration tests for the xentools library
#[cfg(test)]
mod integration_tests {
    use super::*;

    #[derive(Default)]
    struct CaptureWriter {
        stdout: RefCell<Vec<String>>,
    }

    impl OutputWriter for CaptureWriter {
        fn write_inventory(&self, inventory: &InventoryDocument) -> Result<(), OutputError> {
            self.stdout.borrow_mut().push(render_json(inventory)?);
            Ok(())
        }

        fn write_host_vars(&self, vars: &Map<String, Value>) -> Result<(), OutputError> {
            self.stdout.borrow_mut().push(render_json(vars)?);
            Ok(())
        }

        fn write_error(&self, _error: &str) -> Result<(), OutputError> {
            Ok(())
        }
    }

    fn two_vm_host() -> MockXenApi {
        MockXenApi::new()
            .with_vm(
                MockVm::new("A")
                    .with_tags(&["production", "web"])
                    .with_networks(&[("0/ip", "10.0.0.5"), ("0/ipv6/0", "fe80::1")]),
            )
            .with_vm(MockVm::new("B"))
    }

    fn hosts(inventory: &InventoryDocument, group: &str) -> Vec<String> {
        inventory.group(group).map(|g| g.hosts().to_vec()).unwrap_or_default()
    }

    fn children(inventory: &InventoryDocument, group: &str) -> Vec<String> {
        inventory.group(group).map(|g| g.children().to_vec()).unwrap_or_default()
    }

    fn age_file(path: &std::path::Path, by: Duration) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[tokio::test]
    async fn test_two_vm_example() {
        let api = two_vm_host();
        let inventory = InventoryBuilder::new(&api).build().await.unwrap();

        assert_eq!(hosts(&inventory, "web"), ["A"]);
        assert_eq!(children(&inventory, "production"), ["web"]);
        assert_eq!(hosts(&inventory, "ungrouped"), ["B"]);

        let value = serde_json::to_value(&inventory).unwrap();
        assert_eq!(
            value["_meta"]["hostvars"],
            json!({
                "A": {"ansible_host": "10.0.0.5"},
                "B": {"ansible_host": null}
            })
        );
        assert_eq!(value["web"], json!({"children": [], "hosts": ["A"]}));
    }

    #[tokio::test]
    async fn test_root_groups_always_present() {
        let api = MockXenApi::new();
        let inventory = InventoryBuilder::new(&api).build().await.unwrap();

        let all = children(&inventory, "all");
        for root in ROOT_GROUPS {
            assert!(all.contains(&root.to_string()), "missing root group {}", root);
            assert!(inventory.group(root).is_some());
        }
        assert!(hosts(&inventory, "ungrouped").is_empty());
        assert!(inventory.meta.hostvars.is_empty());
    }

    #[tokio::test]
    async fn test_control_domain_and_templates_skipped() {
        let api = MockXenApi::new()
            .with_vm(MockVm::new("Control domain on host: xen01").control_domain())
            .with_vm(MockVm::new("Debian 12 template").template())
            .with_vm(MockVm::new("app-01"));

        let inventory = InventoryBuilder::new(&api).build().await.unwrap();

        assert_eq!(hosts(&inventory, "ungrouped"), ["app-01"]);
        assert_eq!(inventory.meta.hostvars.len(), 1);
        assert_eq!(api.call_count("VM.get_tags").await, 1);
    }

    #[tokio::test]
    async fn test_vm_tagged_only_meta_is_ungrouped() {
        let api = MockXenApi::new().with_vm(MockVm::new("x").with_tags(&["_meta"]));

        let inventory = InventoryBuilder::new(&api).build().await.unwrap();

        assert_eq!(hosts(&inventory, "ungrouped"), ["x"]);
        assert!(inventory.group("_meta").is_none());
        assert!(inventory.host_vars("x").is_some());
    }

    #[tokio::test]
    async fn test_vm_without_interfaces_is_excluded() {
        let api = MockXenApi::new()
            .with_vm(MockVm::new("isolated").with_interfaces(0).with_tags(&["web"]))
            .with_vm(MockVm::new("connected"));

        for per_interface_passes in [false, true] {
            let options = BuildOptions { per_interface_passes };
            let inventory = InventoryBuilder::with_options(&api, options).build().await.unwrap();

            assert!(inventory.group("web").is_none());
            assert!(inventory.host_vars("isolated").is_none());
            assert_eq!(hosts(&inventory, "ungrouped"), ["connected"]);
        }
    }

    #[tokio::test]
    async fn test_multiple_interfaces_grouped_once_by_default() {
        let api = MockXenApi::new().with_vm(
            MockVm::new("A")
                .with_tags(&["web", "production"])
                .with_interfaces(3),
        );

        let inventory = InventoryBuilder::new(&api).build().await.unwrap();

        assert_eq!(hosts(&inventory, "web"), ["A"]);
        assert_eq!(children(&inventory, "production"), ["web"]);
        assert_eq!(api.call_count("VM.get_tags").await, 1);
    }

    #[tokio::test]
    async fn test_per_interface_passes_repeat_hosts() {
        let api = MockXenApi::new()
            .with_vm(
                MockVm::new("A")
                    .with_tags(&["web", "production"])
                    .with_interfaces(3),
            )
            .with_vm(MockVm::new("B").with_interfaces(2));
        let options = BuildOptions {
            per_interface_passes: true,
        };

        let inventory = InventoryBuilder::with_options(&api, options).build().await.unwrap();

        // Child registration is deduplicated, host lists are not
        assert_eq!(children(&inventory, "production"), ["web"]);
        assert_eq!(hosts(&inventory, "web"), ["A", "A", "A"]);
        assert_eq!(hosts(&inventory, "ungrouped"), ["B", "B"]);
        assert_eq!(api.call_count("VM.get_tags").await, 5);
        assert_eq!(inventory.meta.hostvars.len(), 2);
    }

    #[tokio::test]
    async fn test_address_resolution() {
        let api = MockXenApi::new()
            .with_vm(MockVm::new("dual").with_networks(&[("0", "10.0.0.5"), ("1", "fe80::1")]))
            .with_vm(MockVm::new("v6only").with_networks(&[("0/ipv6/0", "fe80::2")]))
            .with_vm(MockVm::new("notools").without_guest_metrics());

        let inventory = InventoryBuilder::new(&api).build().await.unwrap();

        assert_eq!(
            inventory.host_vars("dual").unwrap().ansible_host.as_deref(),
            Some("10.0.0.5")
        );
        assert_eq!(inventory.host_vars("v6only").unwrap().ansible_host, None);
        assert_eq!(inventory.host_vars("notools").unwrap().ansible_host, None);
        assert_eq!(api.call_count("VM_guest_metrics.get_record").await, 2);
    }

    #[tokio::test]
    async fn test_remote_failure_aborts_build() {
        let api = two_vm_host().failing_on("VM.get_tags");
        let result = InventoryBuilder::new(&api).build().await;

        match result {
            Err(XenError::Api(failure)) => assert_eq!(failure.code, "INTERNAL_ERROR"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cache_round_trip_within_ttl() {
        let temp_dir = TempDir::new().unwrap();
        let cache = InventoryCache::new(temp_dir.path().join("inv.cache"), Duration::from_secs(600));
        let api = two_vm_host();
        let builder = InventoryBuilder::new(&api);

        let fresh = cache.cached_inventory(&builder, false).await.unwrap();
        let cached = cache.cached_inventory(&builder, false).await.unwrap();

        assert_eq!(api.call_count("VM.get_all").await, 1);
        assert_eq!(cached.to_json_pretty().unwrap(), fresh.to_json_pretty().unwrap());

        let on_disk: InventoryDocument =
            serde_json::from_str(&fs::read_to_string(cache.path()).unwrap()).unwrap();
        assert_eq!(on_disk, fresh);
    }

    #[tokio::test]
    async fn test_cache_expiry_triggers_rebuild() {
        let temp_dir = TempDir::new().unwrap();
        let cache = InventoryCache::new(temp_dir.path().join("inv.cache"), Duration::from_secs(10));
        let api = two_vm_host();
        let builder = InventoryBuilder::new(&api);

        cache.cached_inventory(&builder, false).await.unwrap();
        age_file(cache.path(), Duration::from_secs(3600));
        assert!(!cache.is_fresh());

        cache.cached_inventory(&builder, false).await.unwrap();

        assert_eq!(api.call_count("VM.get_all").await, 2);
        assert!(cache.is_fresh());
    }

    #[tokio::test]
    async fn test_zero_ttl_never_hits() {
        let temp_dir = TempDir::new().unwrap();
        let cache = InventoryCache::new(temp_dir.path().join("inv.cache"), Duration::ZERO);
        let api = two_vm_host();
        let builder = InventoryBuilder::new(&api);

        cache.cached_inventory(&builder, false).await.unwrap();
        cache.cached_inventory(&builder, false).await.unwrap();

        assert_eq!(api.call_count("VM.get_all").await, 2);
    }

    #[tokio::test]
    async fn test_forced_refresh_rebuilds_fresh_cache() {
        let temp_dir = TempDir::new().unwrap();
        let cache = InventoryCache::new(temp_dir.path().join("inv.cache"), Duration::from_secs(600));
        let api = two_vm_host();
        let builder = InventoryBuilder::new(&api);

        cache.cached_inventory(&builder, false).await.unwrap();
        assert!(cache.is_fresh());
        cache.cached_inventory(&builder, true).await.unwrap();

        assert_eq!(api.call_count("VM.get_all").await, 2);
    }

    #[tokio::test]
    async fn test_refresh_replaces_stale_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("inv.cache");
        let mut stale = InventoryDocument::new();
        stale.add_host("ungrouped", "deleted-vm");
        fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();

        let cache = InventoryCache::new(&path, Duration::from_secs(600));
        let api = two_vm_host();

        let cached = cache.cached_inventory(&InventoryBuilder::new(&api), false).await.unwrap();
        assert_eq!(cached, stale);

        let refreshed = cache.cached_inventory(&InventoryBuilder::new(&api), true).await.unwrap();
        assert_eq!(hosts(&refreshed, "ungrouped"), ["B"]);
        assert_eq!(cache.load().unwrap(), refreshed);
    }

    #[tokio::test]
    async fn test_cached_host_merges_all_hostvars() {
        let temp_dir = TempDir::new().unwrap();
        let cache = InventoryCache::new(temp_dir.path().join("inv.cache"), Duration::from_secs(600));
        let api = MockXenApi::new()
            .with_vm(MockVm::new("first").with_networks(&[("0/ip", "10.0.0.1")]))
            .with_vm(MockVm::new("second").with_networks(&[("0/ip", "10.0.0.2")]));

        let vars = cache
            .cached_host("first", &InventoryBuilder::new(&api), false)
            .await
            .unwrap();

        assert_eq!(Value::Object(vars), json!({"ansible_host": "10.0.0.2"}));
    }

    #[tokio::test]
    async fn test_write_inventory_list_output() {
        let temp_dir = TempDir::new().unwrap();
        let cache = InventoryCache::new(temp_dir.path().join("inv.cache"), Duration::from_secs(600));
        let api = two_vm_host();
        let writer = CaptureWriter::default();

        write_inventory(&api, &InventoryMode::List, &cache, BuildOptions::default(), false, &writer)
            .await
            .unwrap();

        let output = writer.stdout.borrow();
        assert_eq!(output.len(), 1);
        assert!(output[0].starts_with("{\n  \"all\": {\n    \"children\": [\n      \"ungrouped\""));
        let parsed: Value = serde_json::from_str(&output[0]).unwrap();
        assert_eq!(parsed["ungrouped"]["hosts"], json!(["B"]));
    }

    #[tokio::test]
    async fn test_write_inventory_host_output() {
        let temp_dir = TempDir::new().unwrap();
        let cache = InventoryCache::new(temp_dir.path().join("inv.cache"), Duration::from_secs(600));
        let api = two_vm_host();
        let writer = CaptureWriter::default();

        write_inventory(
            &api,
            &InventoryMode::Host("A".to_string()),
            &cache,
            BuildOptions::default(),
            false,
            &writer,
        )
        .await
        .unwrap();

        assert_eq!(writer.stdout.borrow()[0], "{\n  \"ansible_host\": null\n}");
    }

    #[tokio::test]
    async fn test_tag_round_trip() {
        let api = two_vm_host();
        let before = api.tags_of("A").await;

        let add = TagCommand::Add {
            vm_name: "A".to_string(),
            tag: "foo".to_string(),
        };
        let rm = TagCommand::Rm {
            vm_name: "A".to_string(),
            tag: "foo".to_string(),
        };

        tag_vm(&api, &add).await.unwrap();
        assert_eq!(api.tags_of("A").await.len(), before.len() + 1);
        tag_vm(&api, &rm).await.unwrap();

        assert_eq!(api.tags_of("A").await, before);
    }

    #[tokio::test]
    async fn test_tag_added_vm_moves_out_of_ungrouped() {
        let api = two_vm_host();
        let add = TagCommand::Add {
            vm_name: "B".to_string(),
            tag: "db".to_string(),
        };

        tag_vm(&api, &add).await.unwrap();
        let inventory = InventoryBuilder::new(&api).build().await.unwrap();

        assert!(hosts(&inventory, "ungrouped").is_empty());
        assert_eq!(hosts(&inventory, "db"), ["B"]);
        let vms = api.list_vms().await.unwrap();
        assert_eq!(api.vm_tags(&vms[1]).await.unwrap(), ["db"]);
    }
}
