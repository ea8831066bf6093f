//! Session user context
//!
//! Static user, device and build metadata attached to the crash backend's
//! session once the user has authenticated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::variant::BuildVariant;

/// Metadata describing who is running which build on which device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub version: String,
    pub build: String,
    pub variant: BuildVariant,
    pub user_id: String,
    pub user_name: Option<String>,
    /// Saved tenant / workspace identifier
    pub tenant_id: Option<String>,
    pub device_id: Option<String>,
    /// Additional labels (OS information, locale, ...)
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl UserContext {
    /// Creates a context for the given build and user
    pub fn new(
        version: impl Into<String>,
        build: impl Into<String>,
        variant: BuildVariant,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            build: build.into(),
            variant,
            user_id: user_id.into(),
            user_name: None,
            tenant_id: None,
            device_id: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Labelled key/value pairs in attachment order
    ///
    /// Absent optional fields are skipped.
    pub fn annotations(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("version".to_string(), self.version.clone()),
            ("build".to_string(), self.build.clone()),
            ("variant".to_string(), self.variant.to_string()),
            ("user_id".to_string(), self.user_id.clone()),
        ];

        if let Some(name) = &self.user_name {
            pairs.push(("user_name".to_string(), name.clone()));
        }
        if let Some(tenant) = &self.tenant_id {
            pairs.push(("tenant_id".to_string(), tenant.clone()));
        }
        if let Some(device) = &self.device_id {
            pairs.push(("device_id".to_string(), device.clone()));
        }

        pairs.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }
}
