use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level group every other group hangs off.
pub const ALL_GROUP: &str = "all";
/// Group for VMs without any tag.
pub const UNGROUPED: &str = "ungrouped";
/// Key of the hostvars section; never usable as a group name.
pub const META_KEY: &str = "_meta";
/// Reserved tags that organize the other tags as nested children.
pub const ROOT_GROUPS: [&str; 4] = ["production", "nonproduction", "linux", "windows"];

pub fn is_root_group(name: &str) -> bool {
    ROOT_GROUPS.contains(&name)
}

/// An inventory group. Absent lists are omitted from the JSON form, so
/// `all` only carries `children` and `ungrouped` only carries `hosts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
}

impl Group {
    pub fn with_children() -> Self {
        Self {
            children: Some(Vec::new()),
            hosts: None,
        }
    }

    pub fn with_hosts() -> Self {
        Self {
            children: None,
            hosts: Some(Vec::new()),
        }
    }

    /// Shape of a group created from a tag.
    pub fn tagged() -> Self {
        Self {
            children: Some(Vec::new()),
            hosts: Some(Vec::new()),
        }
    }

    pub fn children(&self) -> &[String] {
        self.children.as_deref().unwrap_or_default()
    }

    pub fn hosts(&self) -> &[String] {
        self.hosts.as_deref().unwrap_or_default()
    }
}

/// Per-host variables handed to Ansible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostVars {
    pub ansible_host: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub hostvars: IndexMap<String, HostVars>,
}

/// Ansible dynamic inventory document.
///
/// Groups keep their insertion order through a serialize/deserialize cycle,
/// which is what makes a cached document re-serialize byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDocument {
    #[serde(flatten)]
    pub groups: IndexMap<String, Group>,
    #[serde(rename = "_meta", default)]
    pub meta: Meta,
}

impl InventoryDocument {
    /// Empty inventory with `all`, `ungrouped` and the root groups in place.
    pub fn new() -> Self {
        let mut groups = IndexMap::new();
        groups.insert(
            ALL_GROUP.to_string(),
            Group {
                children: Some(vec![UNGROUPED.to_string()]),
                hosts: None,
            },
        );
        groups.insert(UNGROUPED.to_string(), Group::with_hosts());

        let mut inventory = Self {
            groups,
            meta: Meta::default(),
        };
        for root in ROOT_GROUPS {
            inventory
                .groups
                .insert(root.to_string(), Group::with_children());
            inventory.add_child(ALL_GROUP, root);
        }
        inventory
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Existing group, or a fresh tag-shaped one appended at the end.
    pub fn ensure_group(&mut self, name: &str) -> &mut Group {
        self.groups
            .entry(name.to_string())
            .or_insert_with(Group::tagged)
    }

    /// Append a host to a group, creating the group or its host list as needed.
    /// Duplicates are kept.
    pub fn add_host(&mut self, group: &str, host: &str) {
        self.ensure_group(group)
            .hosts
            .get_or_insert_with(Vec::new)
            .push(host.to_string());
    }

    /// Register `child` under `parent` unless already present.
    pub fn add_child(&mut self, parent: &str, child: &str) {
        let children = self
            .ensure_group(parent)
            .children
            .get_or_insert_with(Vec::new);
        if !children.iter().any(|c| c == child) {
            children.push(child.to_string());
        }
    }

    pub fn set_host_vars(&mut self, host: &str, vars: HostVars) {
        self.meta.hostvars.insert(host.to_string(), vars);
    }

    pub fn host_vars(&self, host: &str) -> Option<&HostVars> {
        self.meta.hostvars.get(host)
    }

    /// Every host's variables folded into one map, later hosts overwriting
    /// earlier ones key by key.
    pub fn merged_host_vars(&self) -> Map<String, Value> {
        let mut merged = Map::new();
        for vars in self.meta.hostvars.values() {
            if let Ok(Value::Object(entries)) = serde_json::to_value(vars) {
                merged.extend(entries);
            }
        }
        merged
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for InventoryDocument {
    fn default() -> Self {
        Self::new()
    }
}
