//! Hierarchical configuration for the options bridge.
//!
//! Configuration is a JSON tree assembled from one or more sources. Sections
//! are addressed with colon-separated paths (`"Database:Primary"`), and key
//! lookup ignores ASCII case, both for section paths and for the members of a
//! bound type. A section binds onto an existing value: members it names are
//! overwritten and every other member keeps its current value.

use std::env;
use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{DiError, DiResult};

/// Separator between keys in a section path
pub const KEY_DELIMITER: &str = ":";

/// A node of the configuration tree and the path it was taken from.
///
/// Missing sections are not errors: they come back empty and bind to the
/// target type's default.
///
/// ```rust
/// use ferrous_bindings::Configuration;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Deserialize, Serialize)]
/// struct Pool { size: u32 }
///
/// let config = Configuration::from_json(r#"{ "Database": { "Pool": { "size": 8 } } }"#).unwrap();
///
/// let pool = config.get_section("database:pool");
/// assert_eq!(pool.path(), "database:pool");
/// assert_eq!(pool.bind::<Pool>().unwrap().size, 8);
///
/// let missing = config.get_section("Cache");
/// assert!(!missing.exists());
/// assert_eq!(missing.bind::<Pool>().unwrap().size, 0);
/// ```
#[derive(Clone, PartialEq)]
pub struct Configuration {
    path: String,
    value: Value,
}

impl Configuration {
    /// A configuration root holding `value`.
    pub fn new(value: Value) -> Self {
        Self {
            path: String::new(),
            value,
        }
    }

    /// An empty configuration root.
    pub fn empty() -> Self {
        Self::new(Value::Null)
    }

    pub fn from_json(json: &str) -> DiResult<Self> {
        ConfigurationBuilder::new().add_json_str(json)?.build()
    }

    /// Path of this section from the root; empty for the root itself.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last key of the path.
    pub fn key(&self) -> &str {
        self.path.rsplit(KEY_DELIMITER).next().unwrap_or_default()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether the section holds any value.
    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    /// The section at `path`, relative to this one.
    pub fn get_section(&self, path: &str) -> Configuration {
        let mut current = Some(&self.value);
        for key in path.split(KEY_DELIMITER).filter(|k| !k.is_empty()) {
            current = current.and_then(|node| child(node, key));
        }

        Configuration {
            path: join_path(&self.path, path),
            value: current.cloned().unwrap_or(Value::Null),
        }
    }

    /// The scalar at `path` rendered as a string.
    pub fn get(&self, path: &str) -> Option<String> {
        match self.get_section(path).value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Direct child sections, in key order.
    pub fn children(&self) -> Vec<Configuration> {
        match &self.value {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| Configuration {
                    path: join_path(&self.path, key),
                    value: value.clone(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Binds this section to `T`, starting from `T::default()`.
    ///
    /// An empty section yields `T::default()`.
    pub fn bind<T: Serialize + DeserializeOwned + Default>(&self) -> DiResult<T> {
        let mut value = T::default();
        self.bind_onto(&mut value)?;
        Ok(value)
    }

    /// Overlays this section onto `value`.
    ///
    /// Members are matched ignoring ASCII case; members absent from the
    /// section keep their current value. An empty section changes nothing.
    pub fn bind_onto<T: Serialize + DeserializeOwned>(&self, value: &mut T) -> DiResult<()> {
        if self.value.is_null() {
            return Ok(());
        }

        let fail = |e: serde_json::Error| {
            DiError::Configuration(format!(
                "cannot bind section '{}' to {}: {}",
                self.path,
                std::any::type_name::<T>(),
                e
            ))
        };

        let mut tree = serde_json::to_value(&*value).map_err(fail)?;
        merge(&mut tree, self.value.clone());
        *value = serde_json::from_value(tree).map_err(fail)?;
        Ok(())
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("path", &self.path)
            .field("value", &self.value)
            .finish()
    }
}

fn child<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v)),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn join_path(parent: &str, path: &str) -> String {
    match (parent.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{parent}{KEY_DELIMITER}{path}"),
    }
}

/// Builder assembling a [`Configuration`] from layered sources.
///
/// Sources are merged in the order they are added; later sources override
/// earlier ones key by key.
///
/// ```rust
/// use ferrous_bindings::ConfigurationBuilder;
/// use serde_json::json;
///
/// let config = ConfigurationBuilder::new()
///     .add_value(json!({ "Server": { "Host": "localhost", "Port": 80 } }))
///     .add_value(json!({ "Server": { "Port": 8080 } }))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.get("Server:Host").as_deref(), Some("localhost"));
/// assert_eq!(config.get("server:port").as_deref(), Some("8080"));
/// ```
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    layers: Vec<Value>,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_value(mut self, value: Value) -> Self {
        self.layers.push(value);
        self
    }

    pub fn add_json_str(self, json: &str) -> DiResult<Self> {
        let value = serde_json::from_str(json)
            .map_err(|e| DiError::Configuration(format!("invalid JSON configuration: {e}")))?;
        Ok(self.add_value(value))
    }

    pub fn add_json_file(self, path: impl AsRef<Path>) -> DiResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DiError::Configuration(format!("cannot read configuration file {}: {}", path.display(), e))
        })?;
        self.add_json_str(&content)
    }

    /// Adds environment variables named `{prefix}__A__B`, mapped to key `A:B`.
    ///
    /// Values are parsed as integer, float or boolean where possible and
    /// kept as strings otherwise.
    pub fn add_environment_variables(self, prefix: &str) -> Self {
        let marker = format!("{}__", prefix.to_uppercase());
        let mut root = Value::Object(Map::new());

        for (name, raw) in env::vars() {
            let Some(rest) = strip_prefix_ignore_case(&name, &marker) else {
                continue;
            };
            let keys: Vec<&str> = rest.split("__").filter(|k| !k.is_empty()).collect();
            insert_path(&mut root, &keys, parse_scalar(raw));
        }

        self.add_value(root)
    }

    pub fn build(self) -> DiResult<Configuration> {
        let mut root = Value::Null;
        for layer in self.layers {
            merge(&mut root, layer);
        }
        tracing::debug!(configured = root.is_object(), "built configuration");
        Ok(Configuration::new(root))
    }
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &name[prefix.len()..])
}

fn parse_scalar(raw: String) -> Value {
    if let Ok(int_val) = raw.parse::<i64>() {
        Value::from(int_val)
    } else if let Ok(float_val) = raw.parse::<f64>() {
        Value::from(float_val)
    } else if let Ok(bool_val) = raw.parse::<bool>() {
        Value::Bool(bool_val)
    } else {
        Value::String(raw)
    }
}

fn insert_path(root: &mut Value, keys: &[&str], value: Value) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };

    let mut node = root;
    for key in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        node = map.entry(key.to_string()).or_insert(Value::Null);
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(last.to_string(), value);
    }
}

/// Deep merge; keys match case-insensitively, `base` keeps its spelling and
/// `overlay` wins.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let existing = base_map
                    .keys()
                    .find(|k| k.eq_ignore_ascii_case(&key))
                    .cloned();
                match existing {
                    Some(existing) => {
                        if let Some(slot) = base_map.get_mut(&existing) {
                            merge(slot, value);
                        }
                    }
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
    struct Endpoint {
        host: String,
        port: u16,
    }

    #[test]
    fn nested_sections_carry_their_path() {
        let config = Configuration::new(json!({ "Services": { "Api": { "host": "api", "port": 443 } } }));
        let api = config.get_section("Services").get_section("Api");
        assert_eq!(api.path(), "Services:Api");
        assert_eq!(api.key(), "Api");
        assert_eq!(api.bind::<Endpoint>().unwrap(), Endpoint { host: "api".into(), port: 443 });
    }

    #[test]
    fn bind_errors_name_the_section() {
        let config = Configuration::new(json!({ "Api": { "port": "not a number" } }));
        let err = config.get_section("Api").bind::<Endpoint>().unwrap_err();
        assert!(matches!(err, DiError::Configuration(ref msg) if msg.contains("'Api'")));
    }

    #[test]
    fn member_names_bind_ignoring_case() {
        let config = Configuration::new(json!({ "Api": { "HOST": "api", "Port": 8443 } }));
        let endpoint = config.get_section("api").bind::<Endpoint>().unwrap();
        assert_eq!(endpoint, Endpoint { host: "api".into(), port: 8443 });
    }

    #[test]
    fn binding_onto_keeps_members_the_section_omits() {
        let config = Configuration::new(json!({ "Api": { "port": 9000, "unknown": true } }));
        let mut endpoint = Endpoint { host: "localhost".into(), port: 80 };
        config.get_section("Api").bind_onto(&mut endpoint).unwrap();
        assert_eq!(endpoint, Endpoint { host: "localhost".into(), port: 9000 });

        Configuration::empty().bind_onto(&mut endpoint).unwrap();
        assert_eq!(endpoint.port, 9000);
    }

    #[test]
    fn array_elements_are_addressable_by_index() {
        let config = Configuration::new(json!({ "Hosts": ["a", "b"] }));
        assert_eq!(config.get("Hosts:1").as_deref(), Some("b"));
        assert!(config.get("Hosts:2").is_none());
    }

    #[test]
    fn children_enumerate_object_members() {
        let config = Configuration::new(json!({ "A": 1, "B": { "C": true } }));
        let paths: Vec<_> = config.children().iter().map(|c| c.path().to_string()).collect();
        assert_eq!(paths, ["A", "B"]);
        assert!(Configuration::empty().children().is_empty());
    }

    #[test]
    fn merge_overrides_case_insensitively() {
        let config = ConfigurationBuilder::new()
            .add_value(json!({ "Api": { "Host": "old", "Port": 1 } }))
            .add_value(json!({ "api": { "host": "new" } }))
            .build()
            .unwrap();
        assert_eq!(config.get("Api:Host").as_deref(), Some("new"));
        assert_eq!(config.get("Api:Port").as_deref(), Some("1"));
    }

    #[test]
    fn environment_variables_map_double_underscores_to_sections() {
        env::set_var("BINDINGS_CFG_TEST__Api__Port", "8081");
        env::set_var("BINDINGS_CFG_TEST__Api__Secure", "true");
        env::set_var("BINDINGS_CFG_TEST__Api__Host", "example.org");

        let config = ConfigurationBuilder::new()
            .add_environment_variables("bindings_cfg_test")
            .build()
            .unwrap();

        let api = config.get_section("Api");
        assert_eq!(api.get_section("Port").value(), &json!(8081));
        assert_eq!(api.get_section("Secure").value(), &json!(true));
        assert_eq!(api.get("Host").as_deref(), Some("example.org"));

        env::remove_var("BINDINGS_CFG_TEST__Api__Port");
        env::remove_var("BINDINGS_CFG_TEST__Api__Secure");
        env::remove_var("BINDINGS_CFG_TEST__Api__Host");
    }

    #[test]
    fn invalid_json_is_a_configuration_error() {
        assert!(matches!(
            ConfigurationBuilder::new().add_json_str("{ nope"),
            Err(DiError::Configuration(_))
        ));
        assert!(ConfigurationBuilder::new().add_json_file("/definitely/missing.json").is_err());
    }
}
