//! Security-domain configuration
//!
//! A [`SecurityDomainConfig`] names the ordered authorization modules, the
//! mapping providers and the trust modules that apply to one security domain.
//! Configuration is loaded once and treated as read-only afterwards.
//!
//! ```toml
//! [[domain]]
//! name = "payroll"
//!
//! [domain.settings]
//! empty_chain_decision = "deny"
//! enforce_role_ref_restriction = true
//!
//! [[domain.authorization]]
//! module = "ejb"
//! flag = "required"
//! options = { unspecified-method = "deny" }
//! ```

use crate::control_flag::ControlFlag;
use crate::decision::AuthorizationDecision;
use bastion_core::{resolve_role_link, BastionError, Result, SecurityRoleRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

/// Ordered string → value options handed to a module factory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleOptions(BTreeMap<String, Value>);

impl ModuleOptions {
    /// Empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw option value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String option; a present non-string value is a configuration error
    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(type_error(key, "a string", other)),
        }
    }

    /// Boolean option; accepts `true`/`false` or the strings `"true"`/`"false"`
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(other) => Err(type_error(key, "a boolean", other)),
        }
    }

    /// List-of-strings option; a single comma-separated string is accepted
    pub fn get_str_list(&self, key: &str) -> Result<Vec<String>> {
        match self.0.get(key) {
            None => Ok(Vec::new()),
            Some(value) => value_to_str_list(key, value),
        }
    }

    /// Table of string → list-of-strings, e.g. `{ alice = ["admin"] }`
    pub fn get_str_list_table(&self, key: &str) -> Result<BTreeMap<String, Vec<String>>> {
        match self.0.get(key) {
            None => Ok(BTreeMap::new()),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(name, value)| Ok((name.clone(), value_to_str_list(key, value)?)))
                .collect(),
            Some(other) => Err(type_error(key, "a table", other)),
        }
    }

    /// Table of string → string
    pub fn get_str_table(&self, key: &str) -> Result<BTreeMap<String, String>> {
        match self.0.get(key) {
            None => Ok(BTreeMap::new()),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(name, value)| match value {
                    Value::String(s) => Ok((name.clone(), s.clone())),
                    other => Err(type_error(key, "a table of strings", other)),
                })
                .collect(),
            Some(other) => Err(type_error(key, "a table", other)),
        }
    }

    /// Whether no options are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn value_to_str_list(key: &str, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(s) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(type_error(key, "a list of strings", other)),
            })
            .collect(),
        other => Err(type_error(key, "a list of strings", other)),
    }
}

fn type_error(key: &str, expected: &str, found: &Value) -> BastionError {
    BastionError::configuration(format!("option '{key}' must be {expected}, found {found}"))
}

/// One configured module: identifier, control flag and options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Registry identifier of the module
    pub module: String,
    /// How this module's outcome combines with the rest of the chain
    #[serde(default)]
    pub flag: ControlFlag,
    /// Options handed to the module factory
    #[serde(default, skip_serializing_if = "ModuleOptions::is_empty")]
    pub options: ModuleOptions,
}

/// Entry in a domain's authorization chain
pub type AuthorizationModuleEntry = ModuleEntry;

/// Entry in a domain's identity-trust chain
pub type TrustModuleEntry = ModuleEntry;

impl ModuleEntry {
    /// Entry with no options
    pub fn new(module: impl Into<String>, flag: ControlFlag) -> Self {
        Self {
            module: module.into(),
            flag,
            options: ModuleOptions::new(),
        }
    }

    /// Attach options
    pub fn with_options(mut self, options: ModuleOptions) -> Self {
        self.options = options;
        self
    }
}

/// One configured mapping provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Registry identifier of the provider
    pub provider: String,
    /// Options handed to the provider factory
    #[serde(default, skip_serializing_if = "ModuleOptions::is_empty")]
    pub options: ModuleOptions,
}

impl MappingEntry {
    /// Entry for a provider
    pub fn new(provider: impl Into<String>, options: ModuleOptions) -> Self {
        Self {
            provider: provider.into(),
            options,
        }
    }
}

/// Per-domain policy switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSettings {
    /// Decision when no module produced a decisive outcome
    #[serde(default)]
    pub empty_chain_decision: AuthorizationDecision,
    /// Reject role checks whose role name has no security-role-ref
    #[serde(default)]
    pub enforce_role_ref_restriction: bool,
    /// Roles declared by the deployment; when non-empty, strict role-ref
    /// checking also requires the linked role to be declared here
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub declared_roles: BTreeSet<String>,
}

impl DomainSettings {
    /// Deployed role a programmatic role check refers to
    ///
    /// Returns `None` when no reference links `role_name`, in which case the
    /// name is checked as-is. Under the strict role-ref restriction a missing
    /// link, or a link outside a non-empty `declared_roles`, is a
    /// configuration error.
    pub fn resolve_role_ref<'r>(
        &self,
        refs: &'r [SecurityRoleRef],
        role_name: &str,
    ) -> Result<Option<&'r str>> {
        let link = resolve_role_link(refs, role_name);
        if !self.enforce_role_ref_restriction {
            return Ok(link);
        }
        let Some(link) = link else {
            return Err(BastionError::configuration(format!(
                "no security-role-ref declared for role '{role_name}'"
            )));
        };
        if !self.declared_roles.is_empty() && !self.declared_roles.contains(link) {
            return Err(BastionError::configuration(format!(
                "security-role-ref '{role_name}' links to undeclared role '{link}'"
            )));
        }
        Ok(Some(link))
    }
}

/// Full configuration of one security domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityDomainConfig {
    /// Domain name
    pub name: String,
    /// Ordered authorization chain
    #[serde(default)]
    pub authorization: Vec<AuthorizationModuleEntry>,
    /// Ordered role-mapping providers
    #[serde(default)]
    pub role_mapping: Vec<MappingEntry>,
    /// Ordered principal-mapping providers
    #[serde(default)]
    pub principal_mapping: Vec<MappingEntry>,
    /// Ordered identity-trust chain
    #[serde(default)]
    pub trust: Vec<TrustModuleEntry>,
    /// Policy switches
    #[serde(default)]
    pub settings: DomainSettings,
}

impl SecurityDomainConfig {
    /// Empty domain
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append an authorization module
    pub fn with_module(mut self, entry: AuthorizationModuleEntry) -> Self {
        self.authorization.push(entry);
        self
    }

    /// Append a role-mapping provider
    pub fn with_role_mapping(mut self, entry: MappingEntry) -> Self {
        self.role_mapping.push(entry);
        self
    }

    /// Append a principal-mapping provider
    pub fn with_principal_mapping(mut self, entry: MappingEntry) -> Self {
        self.principal_mapping.push(entry);
        self
    }

    /// Append a trust module
    pub fn with_trust_module(mut self, entry: TrustModuleEntry) -> Self {
        self.trust.push(entry);
        self
    }

    /// Replace the policy switches
    pub fn with_settings(mut self, settings: DomainSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Structural validation; module ids are checked against a registry later
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BastionError::configuration("security domain name is empty"));
        }
        let modules = self.authorization.iter().chain(&self.trust).map(|e| &e.module);
        let providers = self
            .role_mapping
            .iter()
            .chain(&self.principal_mapping)
            .map(|e| &e.provider);
        if modules.chain(providers).any(|id| id.trim().is_empty()) {
            return Err(BastionError::configuration(format!(
                "security domain '{}' has an entry with an empty module id",
                self.name
            )));
        }
        Ok(())
    }
}

/// Source of security-domain configuration
pub trait ConfigurationProvider: Send + Sync {
    /// Configuration for a domain; unknown domains are configuration errors
    fn security_domain(&self, name: &str) -> Result<Arc<SecurityDomainConfig>>;

    /// Names of every configured domain
    fn domain_names(&self) -> Vec<String>;
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default, rename = "domain")]
    domains: Vec<SecurityDomainConfig>,
}

/// Immutable, in-memory configuration
#[derive(Debug, Clone, Default)]
pub struct StaticConfiguration {
    domains: BTreeMap<String, Arc<SecurityDomainConfig>>,
}

impl StaticConfiguration {
    /// Configuration with no domains
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validated domain; duplicate names are rejected
    pub fn with_domain(mut self, domain: SecurityDomainConfig) -> Result<Self> {
        domain.validate()?;
        if self.domains.contains_key(&domain.name) {
            return Err(BastionError::configuration(format!(
                "security domain '{}' is defined more than once",
                domain.name
            )));
        }
        self.domains.insert(domain.name.clone(), Arc::new(domain));
        Ok(self)
    }

    /// Parse a TOML document of `[[domain]]` tables
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(source)
            .map_err(|e| BastionError::configuration(format!("invalid configuration: {e}")))?;
        file.domains
            .into_iter()
            .try_fold(Self::new(), |config, domain| config.with_domain(domain))
    }

    /// Read and parse a TOML configuration file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            BastionError::configuration(format!(
                "failed to read configuration file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&source)
    }
}

impl ConfigurationProvider for StaticConfiguration {
    fn security_domain(&self, name: &str) -> Result<Arc<SecurityDomainConfig>> {
        self.domains.get(name).cloned().ok_or_else(|| {
            BastionError::configuration(format!("security domain '{name}' is not configured"))
        })
    }

    fn domain_names(&self) -> Vec<String> {
        self.domains.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [[domain]]
        name = "payroll"

        [domain.settings]
        empty_chain_decision = "permit"
        enforce_role_ref_restriction = true
        declared_roles = ["clerk", "manager"]

        [[domain.authorization]]
        module = "ejb"
        flag = "requisite"
        options = { unspecified-method = "deny" }

        [[domain.authorization]]
        module = "acl"
        flag = "Sufficient"

        [[domain.role_mapping]]
        provider = "principal-roles"
        options = { principals = { alice = ["manager", "clerk"] } }

        [[domain]]
        name = "web"
    "#;

    #[test]
    fn parses_toml_domains() {
        let config = StaticConfiguration::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.domain_names(), vec!["payroll", "web"]);

        let payroll = config.security_domain("payroll").unwrap();
        assert_eq!(payroll.authorization.len(), 2);
        assert_eq!(payroll.authorization[0].flag, ControlFlag::Requisite);
        assert_eq!(payroll.authorization[1].flag, ControlFlag::Sufficient);
        assert_eq!(
            payroll.authorization[0].options.get_str("unspecified-method").unwrap(),
            Some("deny")
        );
        assert_eq!(
            payroll.settings.empty_chain_decision,
            AuthorizationDecision::Permit
        );
        assert!(payroll.settings.enforce_role_ref_restriction);

        let table = payroll.role_mapping[0]
            .options
            .get_str_list_table("principals")
            .unwrap();
        assert_eq!(table["alice"], vec!["manager", "clerk"]);

        let web = config.security_domain("web").unwrap();
        assert!(web.authorization.is_empty());
        assert_eq!(web.settings.empty_chain_decision, AuthorizationDecision::Deny);
    }

    #[test]
    fn unknown_domain_is_configuration_error() {
        let err = StaticConfiguration::new().security_domain("nope").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn rejects_invalid_documents() {
        let bad_flag = "[[domain]]\nname = \"d\"\n[[domain.authorization]]\nmodule = \"ejb\"\nflag = \"always\"\n";
        assert!(StaticConfiguration::from_toml_str(bad_flag).unwrap_err().is_configuration());

        let duplicate = "[[domain]]\nname = \"d\"\n[[domain]]\nname = \"d\"\n";
        assert!(StaticConfiguration::from_toml_str(duplicate).unwrap_err().is_configuration());

        let empty_module = "[[domain]]\nname = \"d\"\n[[domain.authorization]]\nmodule = \" \"\n";
        assert!(StaticConfiguration::from_toml_str(empty_module).is_err());
    }

    #[test]
    fn strict_role_refs_require_a_declared_link() {
        let refs = [SecurityRoleRef::new("admin", "roleA"), SecurityRoleRef::new("auditor", "roleZ")];
        let lenient = DomainSettings::default();
        assert_eq!(lenient.resolve_role_ref(&refs, "admin").unwrap(), Some("roleA"));
        assert_eq!(lenient.resolve_role_ref(&refs, "teller").unwrap(), None);

        let strict = DomainSettings {
            enforce_role_ref_restriction: true,
            declared_roles: ["roleA".to_string()].into_iter().collect(),
            ..DomainSettings::default()
        };
        assert_eq!(strict.resolve_role_ref(&refs, "admin").unwrap(), Some("roleA"));
        assert!(strict.resolve_role_ref(&refs, "teller").unwrap_err().is_configuration());
        assert!(strict.resolve_role_ref(&refs, "auditor").unwrap_err().is_configuration());
    }

    #[test]
    fn option_accessors_check_types() {
        let options = ModuleOptions::new()
            .with("flag", true)
            .with("name", "x")
            .with("list", "a, b,,c")
            .with("number", 3);
        assert_eq!(options.get_bool("flag").unwrap(), Some(true));
        assert_eq!(options.get_str("name").unwrap(), Some("x"));
        assert_eq!(options.get_str_list("list").unwrap(), vec!["a", "b", "c"]);
        assert!(options.get_str("number").unwrap_err().is_configuration());
        assert!(options.get_bool("name").is_err());
        assert_eq!(options.get_str("missing").unwrap(), None);
    }

    #[test]
    fn load_from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bastion.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = StaticConfiguration::load_from_file(&path).unwrap();
        assert_eq!(config.domain_names().len(), 2);

        let missing = StaticConfiguration::load_from_file(&dir.path().join("absent.toml"));
        assert!(missing.unwrap_err().is_configuration());
    }
}
