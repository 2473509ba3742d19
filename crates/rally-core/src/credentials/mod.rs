//! Schema-validated credential bags.
//!
//! Each credential kind owns a static [`CredentialSchema`]. A payload is
//! validated on construction and decoded into a typed struct; the set of
//! kinds is closed and selected explicitly through [`CredentialKind`].

mod error;
mod generic;
mod openstack;
mod schema;

pub use error::CredentialsError;
pub use generic::{GENERIC_SCHEMA, GenericCredentials};
pub use openstack::{
    DEFAULT_DOMAIN, DEFAULT_ENDPOINT_TYPE, DEFAULT_PERMISSION, OPENSTACK_SCHEMA,
    OpenStackCredentials,
};
pub use schema::{CredentialSchema, FieldSpec, ValueType};

use serde_json::{Map, Value};

/// Discriminant selecting a credential variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    OpenStack,
    Generic,
}

impl CredentialKind {
    /// Look up a kind by its registered name (the deployment `type`).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "openstack" => Some(Self::OpenStack),
            "generic" => Some(Self::Generic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.schema().kind
    }

    pub fn schema(&self) -> &'static CredentialSchema {
        match self {
            Self::OpenStack => &OPENSTACK_SCHEMA,
            Self::Generic => &GENERIC_SCHEMA,
        }
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated credential bag of one of the known kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    OpenStack(OpenStackCredentials),
    Generic(GenericCredentials),
}

impl Credentials {
    /// Validate `values` against the schema of `kind` and build the variant.
    pub fn build(kind: CredentialKind, values: Map<String, Value>) -> Result<Self, CredentialsError> {
        match kind {
            CredentialKind::OpenStack => OpenStackCredentials::new(values).map(Self::OpenStack),
            CredentialKind::Generic => GenericCredentials::new(values).map(Self::Generic),
        }
    }

    pub const fn kind(&self) -> CredentialKind {
        match self {
            Self::OpenStack(_) => CredentialKind::OpenStack,
            Self::Generic(_) => CredentialKind::Generic,
        }
    }

    /// Snapshot without internal fields.
    pub fn to_dict(&self) -> Map<String, Value> {
        match self {
            Self::OpenStack(creds) => creds.to_dict(false),
            Self::Generic(creds) => creds.to_dict(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Map<String, Value> {
        json!({"auth_url": "u", "username": "n", "password": "p"})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_build_selects_variant() {
        let creds = Credentials::build(CredentialKind::OpenStack, payload()).unwrap();
        assert_eq!(creds.kind(), CredentialKind::OpenStack);
        assert!(creds.to_dict().contains_key("endpoint_type"));

        let creds = Credentials::build(CredentialKind::Generic, payload()).unwrap();
        assert_eq!(creds.kind(), CredentialKind::Generic);
        assert_eq!(creds.to_dict().len(), 3);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(CredentialKind::parse("openstack"), Some(CredentialKind::OpenStack));
        assert_eq!(CredentialKind::parse("generic"), Some(CredentialKind::Generic));
        assert_eq!(CredentialKind::parse("base_credentials"), None);
        assert_eq!(CredentialKind::OpenStack.to_string(), "openstack");
    }
}
