//! Plain URL/user/password credentials.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::CredentialsError;
use super::schema::{CredentialSchema, FieldSpec, STRING};

pub static GENERIC_SCHEMA: CredentialSchema = CredentialSchema {
    kind: "generic",
    fields: &[
        FieldSpec::required("auth_url", STRING),
        FieldSpec::required("username", STRING),
        FieldSpec::required("password", STRING),
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenericCredentials {
    pub auth_url: String,
    pub username: String,
    pub password: String,
}

impl GenericCredentials {
    pub fn new(values: Map<String, Value>) -> Result<Self, CredentialsError> {
        GENERIC_SCHEMA.validate(&values)?;
        serde_json::from_value(Value::Object(values)).map_err(|e| {
            CredentialsError::SchemaValidation {
                kind: GENERIC_SCHEMA.kind,
                violations: vec![e.to_string()],
            }
        })
    }

    pub fn to_dict(&self) -> Map<String, Value> {
        let mut dict = Map::new();
        dict.insert("auth_url".into(), json!(self.auth_url));
        dict.insert("username".into(), json!(self.username));
        dict.insert("password".into(), json!(self.password));
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_dict_returns_input() {
        let input = json!({
            "auth_url": "foo_url",
            "username": "foo_user",
            "password": "foo_password",
        });
        let creds = GenericCredentials::new(input.as_object().cloned().unwrap()).unwrap();
        assert_eq!(Value::Object(creds.to_dict()), input);
    }

    #[test]
    fn test_rejects_openstack_only_keys() {
        let input = json!({
            "auth_url": "foo_url",
            "username": "foo_user",
            "password": "foo_password",
            "tenant_name": "demo",
        });
        assert!(GenericCredentials::new(input.as_object().cloned().unwrap()).is_err());
    }
}
