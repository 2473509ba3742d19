//! OpenStack-flavored credentials.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::CredentialsError;
use super::schema::{BOOLEAN, CredentialSchema, FieldSpec, NULLABLE_STRING, STRING};

pub static OPENSTACK_SCHEMA: CredentialSchema = CredentialSchema {
    kind: "openstack",
    fields: &[
        FieldSpec::required("auth_url", STRING),
        FieldSpec::required("username", STRING),
        FieldSpec::required("password", STRING),
        FieldSpec::optional("tenant_name", NULLABLE_STRING),
        FieldSpec::optional("permission", NULLABLE_STRING),
        FieldSpec::optional("region_name", NULLABLE_STRING),
        FieldSpec::optional("endpoint_type", NULLABLE_STRING),
        FieldSpec::optional("domain_name", NULLABLE_STRING),
        FieldSpec::optional("user_domain_name", NULLABLE_STRING),
        FieldSpec::optional("admin_domain_name", NULLABLE_STRING),
        FieldSpec::optional("project_domain_name", NULLABLE_STRING),
        FieldSpec::optional("endpoint", NULLABLE_STRING),
        FieldSpec::optional("https_insecure", BOOLEAN),
        FieldSpec::optional("https_cacert", NULLABLE_STRING),
    ],
};

pub const DEFAULT_PERMISSION: &str = "user";
pub const DEFAULT_ENDPOINT_TYPE: &str = "public";
pub const DEFAULT_DOMAIN: &str = "Default";

/// Default values merged under every caller payload.
///
/// Built fresh on each call so no two credential bags share a backing map.
fn default_values() -> Map<String, Value> {
    let defaults = json!({
        "tenant_name": null,
        "permission": DEFAULT_PERMISSION,
        "region_name": null,
        "endpoint_type": DEFAULT_ENDPOINT_TYPE,
        "domain_name": null,
        "endpoint": null,
        "user_domain_name": DEFAULT_DOMAIN,
        "admin_domain_name": DEFAULT_DOMAIN,
        "project_domain_name": DEFAULT_DOMAIN,
        "https_insecure": false,
        "https_cacert": null,
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Validated credentials for an OpenStack cloud.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenStackCredentials {
    pub auth_url: String,
    pub username: String,
    pub password: String,
    pub tenant_name: Option<String>,
    pub permission: Option<String>,
    pub region_name: Option<String>,
    pub endpoint_type: Option<String>,
    pub domain_name: Option<String>,
    pub user_domain_name: Option<String>,
    pub admin_domain_name: Option<String>,
    pub project_domain_name: Option<String>,
    pub endpoint: Option<String>,
    /// Derived from `https_insecure`.
    #[serde(rename = "https_insecure")]
    pub insecure: bool,
    /// Derived from `https_cacert`.
    #[serde(rename = "https_cacert")]
    pub cacert: Option<String>,
}

impl OpenStackCredentials {
    /// Merge `values` over the defaults, validate, and decode.
    pub fn new(values: Map<String, Value>) -> Result<Self, CredentialsError> {
        let mut merged = default_values();
        merged.extend(values);
        OPENSTACK_SCHEMA.validate(&merged)?;

        serde_json::from_value(Value::Object(merged)).map_err(|e| {
            CredentialsError::SchemaValidation {
                kind: OPENSTACK_SCHEMA.kind,
                violations: vec![e.to_string()],
            }
        })
    }

    /// Snapshot of the credentials under their input key names.
    ///
    /// `permission` is only emitted when `include_permission` is set.
    pub fn to_dict(&self, include_permission: bool) -> Map<String, Value> {
        let mut dict = Map::new();
        dict.insert("auth_url".into(), json!(self.auth_url));
        dict.insert("username".into(), json!(self.username));
        dict.insert("password".into(), json!(self.password));
        dict.insert("tenant_name".into(), json!(self.tenant_name));
        dict.insert("region_name".into(), json!(self.region_name));
        dict.insert("endpoint_type".into(), json!(self.endpoint_type));
        dict.insert("domain_name".into(), json!(self.domain_name));
        dict.insert("user_domain_name".into(), json!(self.user_domain_name));
        dict.insert("admin_domain_name".into(), json!(self.admin_domain_name));
        dict.insert("project_domain_name".into(), json!(self.project_domain_name));
        dict.insert("endpoint".into(), json!(self.endpoint));
        dict.insert("https_insecure".into(), json!(self.insecure));
        dict.insert("https_cacert".into(), json!(self.cacert));
        if include_permission {
            dict.insert("permission".into(), json!(self.permission));
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Map<String, Value> {
        json!({
            "auth_url": "http://keystone:5000/v3",
            "username": "admin",
            "password": "secret",
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let creds = OpenStackCredentials::new(minimal()).unwrap();
        assert_eq!(creds.permission.as_deref(), Some(DEFAULT_PERMISSION));
        assert_eq!(creds.endpoint_type.as_deref(), Some(DEFAULT_ENDPOINT_TYPE));
        assert_eq!(creds.user_domain_name.as_deref(), Some("Default"));
        assert_eq!(creds.project_domain_name.as_deref(), Some("Default"));
        assert!(creds.tenant_name.is_none());
        assert!(!creds.insecure);
        assert!(creds.cacert.is_none());
    }

    #[test]
    fn test_caller_values_override_defaults() {
        let mut values = minimal();
        values.insert("permission".into(), json!("admin"));
        values.insert("https_insecure".into(), json!(true));
        values.insert("https_cacert".into(), json!("/etc/ssl/ca.pem"));

        let creds = OpenStackCredentials::new(values).unwrap();
        assert_eq!(creds.permission.as_deref(), Some("admin"));
        assert!(creds.insecure);
        assert_eq!(creds.cacert.as_deref(), Some("/etc/ssl/ca.pem"));
    }

    #[test]
    fn test_missing_password_rejected() {
        let mut values = minimal();
        values.remove("password");
        let err = OpenStackCredentials::new(values).unwrap_err();
        assert!(err.to_string().contains("'password' is a required property"));
    }

    #[test]
    fn test_undeclared_key_rejected() {
        let mut values = minimal();
        values.insert("insecure".into(), json!(true));
        assert!(matches!(
            OpenStackCredentials::new(values),
            Err(CredentialsError::SchemaValidation { kind: "openstack", .. })
        ));
    }

    #[test]
    fn test_to_dict_hides_permission_unless_requested() {
        let creds = OpenStackCredentials::new(minimal()).unwrap();

        let dict = creds.to_dict(false);
        assert!(!dict.contains_key("permission"));
        assert!(!dict.contains_key("insecure"));
        assert!(!dict.contains_key("cacert"));
        assert_eq!(dict["https_insecure"], json!(false));
        assert_eq!(dict.len(), 13);

        let dict = creds.to_dict(true);
        assert_eq!(dict["permission"], json!("user"));
    }

    #[test]
    fn test_instances_do_not_share_defaults() {
        let mut first = OpenStackCredentials::new(minimal()).unwrap();
        first.region_name = Some("RegionOne".to_string());
        let second = OpenStackCredentials::new(minimal()).unwrap();
        assert!(second.region_name.is_none());
    }
}
