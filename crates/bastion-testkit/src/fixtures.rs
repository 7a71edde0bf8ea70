//! Scripted modules and request builders

use bastion_authorization::{
    AuthorizationModule, ControlFlag, ModuleEntry, ModuleOutcome, ModuleRegistry, Providers,
    SecurityDomainConfig,
};
use bastion_core::{Principal, Resource, ResourceId, ResourceKind, RoleGroup, Subject};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Module returning a fixed outcome and counting its invocations
#[derive(Debug)]
pub struct ScriptedModule {
    name: String,
    outcome: ModuleOutcome,
    calls: AtomicUsize,
    log: Option<Arc<InvocationLog>>,
}

impl ScriptedModule {
    /// Module named `name` always answering `outcome`
    pub fn new(name: impl Into<String>, outcome: ModuleOutcome) -> Self {
        Self {
            name: name.into(),
            outcome,
            calls: AtomicUsize::new(0),
            log: None,
        }
    }

    /// Also append the module name to `log` on each invocation
    pub fn logging_to(mut self, log: Arc<InvocationLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// Number of times `authorize` ran
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AuthorizationModule for ScriptedModule {
    fn authorize(&self, _: &Resource, _: &Subject, _: &RoleGroup) -> ModuleOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.record(&self.name);
        }
        self.outcome.clone()
    }
}

/// Shared, ordered record of module invocations
#[derive(Debug, Default)]
pub struct InvocationLog {
    entries: Mutex<Vec<String>>,
}

impl InvocationLog {
    /// Empty log
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Append an entry
    pub fn record(&self, name: &str) {
        self.entries.lock().push(name.to_string());
    }

    /// Entries in invocation order
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

/// A domain whose chain is made of scripted modules
///
/// Each step is registered under its own id so the context resolves it
/// through the registry like any configured module.
pub struct ScriptedChain {
    /// Domain configuration listing the steps in order
    pub config: SecurityDomainConfig,
    /// Registry holding the scripted modules plus the built-ins
    pub registry: Arc<ModuleRegistry>,
    /// The scripted modules, in chain order
    pub modules: Vec<Arc<ScriptedModule>>,
    /// Invocation order across every module
    pub log: Arc<InvocationLog>,
}

impl ScriptedChain {
    /// Build a chain named `domain` from (flag, outcome) steps
    pub fn new(domain: &str, steps: &[(ControlFlag, ModuleOutcome)]) -> Self {
        let log = InvocationLog::new();
        let mut registry = Providers::builtin().modules;
        let mut config = SecurityDomainConfig::new(domain);
        let mut modules = Vec::new();
        for (index, (flag, outcome)) in steps.iter().enumerate() {
            let id = format!("step-{index}");
            let module = Arc::new(
                ScriptedModule::new(id.clone(), outcome.clone()).logging_to(Arc::clone(&log)),
            );
            let shared = Arc::clone(&module);
            registry.register(id.clone(), move |_| {
                Ok(Arc::clone(&shared) as Arc<dyn AuthorizationModule>)
            });
            config = config.with_module(ModuleEntry::new(id, *flag));
            modules.push(module);
        }
        Self {
            config,
            registry: Arc::new(registry),
            modules,
            log,
        }
    }

    /// Invocation count of each step, in chain order
    pub fn calls(&self) -> Vec<usize> {
        self.modules.iter().map(|module| module.calls()).collect()
    }
}

/// Authenticated subject with a single caller principal
pub fn subject(name: &str) -> Subject {
    Subject::new(Principal::new(name))
}

/// Caller-role group of simple roles
pub fn roles(names: &[&str]) -> RoleGroup {
    RoleGroup::from_names(RoleGroup::CALLER_ROLES, names.iter().copied())
}

/// Resource with no layer-specific data
pub fn generic_resource(key: &str) -> Resource {
    Resource::new(ResourceId::new(ResourceKind::Custom("test".to_string()), key))
}

/// Install a `tracing` subscriber honouring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
