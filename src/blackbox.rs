use crate::document::Section;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// The `modules` map of a blackbox exporter configuration file.
///
/// Modules that were not created by us (`tcp_connect`, `icmp`, ...) can have
/// any shape, so the map keeps plain YAML values and only the modules we
/// generate go through [`Module`].
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modules(pub Mapping);

impl Section for Modules {
    const KEY: &'static str = "modules";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub prober: String,
    pub http: HttpProbe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpProbe {
    pub method: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuth>,

    pub tls_config: TlsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicAuth {
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub insecure_skip_verify: bool,
}

/// A prober definition as it is received by the API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Prober {
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub unique_name: String,
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub method: String,
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub basic_auth: BasicAuth,
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub body: String,
    #[serde(deserialize_with = "crate::de::null_as_default")]
    pub headers: BTreeMap<String, String>,
}

impl From<Prober> for Module {
    /// Convert a prober definition into an http blackbox module.
    ///
    /// Credentials are only used when both the username and the password are
    /// provided. Certificate verification is always disabled.
    fn from(prober: Prober) -> Self {
        let basic_auth = Some(prober.basic_auth)
            .filter(|auth| !auth.username.is_empty() && !auth.password.is_empty());

        Module {
            prober: "http".to_string(),
            http: HttpProbe {
                method: prober.method,
                headers: prober.headers,
                body: Some(prober.body).filter(|body| !body.is_empty()),
                basic_auth,
                tls_config: TlsConfig {
                    insecure_skip_verify: true,
                },
            },
        }
    }
}

impl Modules {
    /// Insert `module` under `name`, overwriting (not merging) any module with
    /// the same name. An existing module keeps its position in the map.
    pub fn upsert(&mut self, name: &str, module: &Module) -> Result<()> {
        let value = serde_yaml::to_value(module)?;
        self.0.insert(Value::String(name.to_string()), value);
        Ok(())
    }

    /// Remove the module called `name`, keeping the order of the remaining
    /// modules. Returns `None` if there was no such module.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    /// Decode the module called `name`. Returns `None` for unknown modules and
    /// for modules that are not http probes.
    pub fn get(&self, name: &str) -> Option<Module> {
        self.0
            .get(name)
            .and_then(|value| serde_yaml::from_value(value.clone()).ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn prober(name: &str) -> Prober {
        Prober {
            unique_name: name.to_string(),
            method: "GET".to_string(),
            ..Default::default()
        }
    }

    fn names(modules: &Modules) -> Vec<String> {
        modules
            .0
            .keys()
            .filter_map(|key| key.as_str().map(str::to_string))
            .collect()
    }

    #[test]
    fn minimal_module() {
        let module = Module::from(prober("health"));

        let expected: Value = serde_yaml::from_str(
            r#"
prober: http
http:
  method: GET
  tls_config:
    insecure_skip_verify: true
"#,
        )
        .unwrap();
        assert_eq!(serde_yaml::to_value(&module).unwrap(), expected);
    }

    #[test]
    fn full_module() {
        let module = Module::from(Prober {
            unique_name: "login".to_string(),
            method: "POST".to_string(),
            basic_auth: BasicAuth {
                username: "probe".to_string(),
                password: "secret".to_string(),
            },
            body: r#"{"ping":true}"#.to_string(),
            headers: BTreeMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
        });

        assert_eq!(module.prober, "http");
        assert_eq!(module.http.method, "POST");
        assert_eq!(module.http.headers["Content-Type"], "application/json");
        assert_eq!(module.http.body.as_deref(), Some(r#"{"ping":true}"#));
        assert_eq!(
            module.http.basic_auth,
            Some(BasicAuth {
                username: "probe".to_string(),
                password: "secret".to_string(),
            })
        );
        assert!(module.http.tls_config.insecure_skip_verify);
    }

    #[rstest]
    #[case("probe", "")]
    #[case("", "secret")]
    #[case("", "")]
    fn partial_credentials_are_dropped(#[case] username: &str, #[case] password: &str) {
        let mut request = prober("health");
        request.basic_auth = BasicAuth {
            username: username.to_string(),
            password: password.to_string(),
        };

        let module = Module::from(request);

        assert_eq!(module.http.basic_auth, None);
        assert!(module.http.tls_config.insecure_skip_verify);
    }

    #[test]
    fn upsert_overwrites_without_merging() {
        let mut modules = Modules::default();

        let mut first = prober("health");
        first.body = "ping".to_string();
        first.headers = BTreeMap::from([("X-Probe".to_string(), "1".to_string())]);
        modules.upsert("health", &first.into()).unwrap();

        let mut second = prober("health");
        second.method = "HEAD".to_string();
        modules.upsert("health", &second.into()).unwrap();

        assert_eq!(modules.len(), 1);
        let module = modules.get("health").unwrap();
        assert_eq!(module.http.method, "HEAD");
        assert!(module.http.headers.is_empty());
        assert_eq!(module.http.body, None);
    }

    #[test]
    fn upsert_keeps_position_of_existing_module() {
        let mut modules: Modules = serde_yaml::from_str(
            r#"
tcp_connect:
  prober: tcp
health:
  prober: http
icmp:
  prober: icmp
"#,
        )
        .unwrap();

        modules.upsert("health", &prober("health").into()).unwrap();
        modules.upsert("login", &prober("login").into()).unwrap();

        assert_eq!(names(&modules), vec!["tcp_connect", "health", "icmp", "login"]);
        assert_eq!(modules.get("health").unwrap().http.method, "GET");
        assert_eq!(modules.get("tcp_connect"), None);
    }

    #[test]
    fn remove_keeps_order() {
        let mut modules = Modules::default();
        for name in ["a", "b", "c"] {
            modules.upsert(name, &prober(name).into()).unwrap();
        }

        assert!(modules.remove("a").is_some());
        assert_eq!(names(&modules), vec!["b", "c"]);
        assert!(!modules.contains("a"));
    }

    #[test]
    fn remove_absent_module() {
        let mut modules = Modules::default();
        modules.upsert("a", &prober("a").into()).unwrap();
        let before = modules.clone();

        assert!(modules.remove("missing").is_none());
        assert_eq!(modules, before);
    }
}
