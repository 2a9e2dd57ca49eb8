//! Context mapping
//!
//! Outbound, the populated variant decides the API `spec.type` and the shape
//! of `spec.data`. YAML variants are parsed into a JSON object; storage
//! variants nest their credentials under `auth` with camel-cased keys.
//!
//! Inbound, encrypted variants are only rebuilt from the API when the
//! context is read decrypted. Otherwise the previously known spec is kept,
//! since the API would only return ciphertext.

use anyhow::{Context as _, Result};
use cfclient::Context;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::schema::{AzureAuth, ContextConfig, ContextKind, ContextSpec, JsonConfigAuth};

/// Build the API payload from a validated config
pub fn to_api(config: &ContextConfig) -> Result<Context> {
    let spec = config.spec.to_spec()?;
    let data = spec_to_data(&spec)?;

    Ok(Context::new(
        config.name.clone(),
        cfclient::ContextSpec {
            context_type: spec.kind().api_type().to_string(),
            data,
        },
    ))
}

fn spec_to_data(spec: &ContextSpec) -> Result<Map<String, Value>> {
    Ok(match spec {
        ContextSpec::Config(data) | ContextSpec::Secret(data) => data
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
        ContextSpec::Yaml(yaml) | ContextSpec::SecretYaml(yaml) => {
            serde_yaml::from_str(yaml).context("Context data is not a YAML mapping")?
        }
        ContextSpec::StorageGc(auth) | ContextSpec::StorageS3(auth) => {
            let json_config: Map<String, Value> = auth
                .json_config
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            let mut auth_obj = Map::new();
            auth_obj.insert("type".into(), Value::String(auth.auth_type.clone()));
            auth_obj.insert("jsonConfig".into(), Value::Object(json_config));
            Map::from_iter([("auth".to_string(), Value::Object(auth_obj))])
        }
        ContextSpec::StorageAzure(auth) => {
            let mut auth_obj = Map::new();
            auth_obj.insert("type".into(), Value::String(auth.auth_type.clone()));
            auth_obj.insert("accountName".into(), Value::String(auth.account_name.clone()));
            auth_obj.insert("accountKey".into(), Value::String(auth.account_key.clone()));
            Map::from_iter([("auth".to_string(), Value::Object(auth_obj))])
        }
    })
}

/// Whether a read of this context should ask the API to decrypt it
pub fn read_decrypted(config: &ContextConfig) -> bool {
    config.decrypt_spec && config.spec.detect_kind().is_some_and(ContextKind::is_encrypted)
}

/// Rebuild a config from the API representation
///
/// `prior` is the last known config for this context. It supplies
/// `decrypt_spec`, the declared variant and, for encrypted variants read
/// without decryption, the spec itself.
pub fn from_api(context: &Context, prior: &ContextConfig) -> Result<ContextConfig> {
    let declared = prior.spec.detect_kind();
    let keep_prior = !prior.decrypt_spec && declared.is_some_and(ContextKind::is_encrypted);

    let spec = if keep_prior {
        prior.spec.clone()
    } else {
        match spec_from_api(&context.spec)? {
            Some(spec) => spec.into(),
            None => {
                log::warn!(
                    "context {} has unsupported type {:?}",
                    context.metadata.name,
                    context.spec.context_type
                );
                Default::default()
            }
        }
    };

    Ok(ContextConfig {
        name: context.metadata.name.clone(),
        decrypt_spec: prior.decrypt_spec,
        spec,
    })
}

/// Convert the API spec into the sum type; `None` for unknown types
fn spec_from_api(spec: &cfclient::ContextSpec) -> Result<Option<ContextSpec>> {
    let Some(kind) = ContextKind::from_api_type(&spec.context_type) else {
        return Ok(None);
    };

    let data = &spec.data;
    Ok(Some(match kind {
        ContextKind::Config => ContextSpec::Config(string_map(data)),
        ContextKind::Secret => ContextSpec::Secret(string_map(data)),
        ContextKind::Yaml => ContextSpec::Yaml(to_yaml(data)?),
        ContextKind::SecretYaml => ContextSpec::SecretYaml(to_yaml(data)?),
        ContextKind::StorageGc => ContextSpec::StorageGc(json_config_auth(data)),
        ContextKind::StorageS3 => ContextSpec::StorageS3(json_config_auth(data)),
        ContextKind::StorageAzure => {
            let auth = auth_object(data);
            ContextSpec::StorageAzure(AzureAuth {
                auth_type: string_field(auth, "type"),
                account_name: string_field(auth, "accountName"),
                account_key: string_field(auth, "accountKey"),
            })
        }
    }))
}

/// Parse and re-emit a config so equivalent YAML renders identically
pub fn normalize(config: &ContextConfig) -> Result<ContextConfig> {
    from_api(&to_api(config)?, config)
}

/// Copy of `config` with encrypted values replaced by a short digest
///
/// Digests still differ when values differ, so masked renderings remain
/// comparable. Masking is idempotent.
pub fn mask_sensitive(config: &ContextConfig) -> ContextConfig {
    let mut masked = config.clone();
    let spec = &mut masked.spec;

    if let Some(secret) = spec.secret.as_mut() {
        for value in secret.data.values_mut() {
            *value = digest(value);
        }
    }
    if let Some(secret_yaml) = spec.secret_yaml.as_mut() {
        secret_yaml.data = digest(&secret_yaml.data);
    }
    if let Some(s3) = spec.storage_s3.as_mut() {
        for value in s3.data.auth.json_config.values_mut() {
            *value = digest(value);
        }
    }
    if let Some(azure) = spec.storage_azuref.as_mut() {
        azure.data.auth.account_key = digest(&azure.data.auth.account_key);
    }
    masked
}

const MASK_PREFIX: &str = "(sensitive ";

/// Masking an already masked value leaves it as is
fn digest(value: &str) -> String {
    if value.starts_with(MASK_PREFIX) {
        return value.to_string();
    }
    let hex = blake3::hash(value.as_bytes()).to_hex();
    format!("{MASK_PREFIX}{})", &hex.as_str()[..12])
}

fn to_yaml(data: &Map<String, Value>) -> Result<String> {
    serde_yaml::to_string(data).context("Failed to render context data as YAML")
}

fn string_map(data: &Map<String, Value>) -> BTreeMap<String, String> {
    data.iter().map(|(k, v)| (k.clone(), value_string(v))).collect()
}

fn value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn auth_object(data: &Map<String, Value>) -> Option<&Map<String, Value>> {
    data.get("auth").and_then(Value::as_object)
}

fn string_field(object: Option<&Map<String, Value>>, key: &str) -> String {
    object
        .and_then(|o| o.get(key))
        .map(value_string)
        .unwrap_or_default()
}

fn json_config_auth(data: &Map<String, Value>) -> JsonConfigAuth {
    let auth = auth_object(data);
    JsonConfigAuth {
        auth_type: string_field(auth, "type"),
        json_config: auth
            .and_then(|a| a.get("jsonConfig"))
            .and_then(Value::as_object)
            .map(string_map)
            .unwrap_or_default(),
    }
}
