use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

const NULL_REF: &str = "OpaqueRef:NULL";

/// XAPI object handle (`OpaqueRef:<uuid>`), also used for session ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueRef(String);

impl OpaqueRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn null() -> Self {
        Self(NULL_REF.to_string())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_empty() || self.0 == NULL_REF
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OpaqueRef {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for OpaqueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OpaqueRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The subset of a `VM.get_record` response the tools read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmRecord {
    #[serde(default)]
    pub name_label: String,
    #[serde(default)]
    pub is_control_domain: bool,
    #[serde(default)]
    pub is_a_template: bool,
    #[serde(rename = "VIFs", default)]
    pub vifs: Vec<OpaqueRef>,
    #[serde(default)]
    pub guest_metrics: OpaqueRef,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl VmRecord {
    /// A running guest instance, as opposed to dom0 or a template.
    pub fn is_guest(&self) -> bool {
        !self.is_control_domain && !self.is_a_template
    }
}

/// `VM_guest_metrics` record, reduced to the network map reported by the
/// guest tools (`"0/ip" -> "10.0.0.5"`, `"0/ipv6/0" -> "fe80::1"`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuestMetrics {
    #[serde(default)]
    pub networks: IndexMap<String, String>,
}

impl GuestMetrics {
    /// Last network value without a colon, scanning in reported order.
    ///
    /// Device numbering reported by the guest tools is not reliable, so the
    /// scan does not stop at the first hit.
    pub fn primary_address(&self) -> Option<&str> {
        self.networks
            .values()
            .filter(|value| !value.contains(':'))
            .last()
            .map(String::as_str)
    }
}
