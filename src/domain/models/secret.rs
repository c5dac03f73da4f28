use std::collections::BTreeMap;

use crate::domain::errors::ValidationError;

pub const ACCESS_KEY_FIELD: &str = "accesskey";
pub const SECRET_KEY_FIELD: &str = "secretkey";
pub const CA_CERT_FIELD: &str = "ca.crt";

/// A named key/value secret, shaped like a Kubernetes `Secret`.
///
/// Values are raw bytes. Only the keys a consumer knows about are read,
/// anything else is ignored.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    pub namespace: Option<String>,
    pub data: BTreeMap<String, Vec<u8>>,
}

impl Secret {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.data.get(key).map(Vec::as_slice)
    }

    /// Value of `key` as a string, empty when the key is absent
    pub fn get_string(&self, key: &str) -> String {
        self.get(key)
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .unwrap_or_default()
    }
}

// Values stay out of logs.
impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Validate a credential secret. An absent secret is valid.
///
/// Only the presence of `accesskey` and `secretkey` is checked here; empty
/// values are accepted and simply don't yield static credentials later.
pub fn validate_secret(secret: Option<&Secret>) -> Result<(), ValidationError> {
    let Some(secret) = secret else {
        return Ok(());
    };

    if !secret.contains(ACCESS_KEY_FIELD) || !secret.contains(SECRET_KEY_FIELD) {
        return Err(ValidationError::InvalidSecret {
            name: secret.name.clone(),
        });
    }

    Ok(())
}
