//! Plugin registry
//!
//! Hosts register admission contributions and custom serializers here
//! explicitly; schemes read the registry every time they (re)run
//! registration against a factory. Registration order is preserved.

use crate::admission::AdmissionPolicy;
use crate::custom::{Isolated, ProxyAdapter, ProxySerializer};
use crate::error::Result;
use crate::serializer::Serializer;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Contributes type names to admission policies
pub trait WhitelistContributor: Send + Sync {
    /// Contributor name, used in logs
    fn name(&self) -> &str;

    /// Portable type names to admit
    fn whitelist(&self) -> Vec<String>;
}

static DEFAULT_WHITELIST: Lazy<Vec<String>> = Lazy::new(|| {
    ["flow.FiberSnapshot", "flow.ResumePoint"]
        .iter()
        .map(|s| s.to_string())
        .collect()
});

/// Portable types of the framework itself
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultWhitelist;

impl WhitelistContributor for DefaultWhitelist {
    fn name(&self) -> &str {
        "default"
    }

    fn whitelist(&self) -> Vec<String> {
        DEFAULT_WHITELIST.clone()
    }
}

/// A contributed serializer and where it came from
#[derive(Clone)]
pub struct ContributedSerializer {
    /// Contributing plugin
    pub source: String,
    /// Serializer, already wrapped in [`Isolated`]
    pub serializer: Arc<dyn Serializer>,
}

#[derive(Default)]
struct Contributions {
    whitelists: Vec<Arc<dyn WhitelistContributor>>,
    serializers: Vec<ContributedSerializer>,
}

/// Explicit replacement for service discovery
#[derive(Default)]
pub struct SerializationPlugins {
    contributions: RwLock<Contributions>,
}

impl SerializationPlugins {
    /// Registry holding only [`DefaultWhitelist`]
    pub fn new() -> Self {
        let plugins = SerializationPlugins::default();
        plugins.add_whitelist(Arc::new(DefaultWhitelist));
        plugins
    }

    /// Registry with no contributions at all
    pub fn empty() -> Self {
        SerializationPlugins::default()
    }

    /// Add an admission contributor
    pub fn add_whitelist(&self, contributor: Arc<dyn WhitelistContributor>) {
        self.contributions.write().whitelists.push(contributor);
    }

    /// Add a proxy serializer contributed by `source`
    pub fn add_proxy_serializer<P: ProxySerializer>(&self, source: &str, serializer: P) {
        self.add_serializer(source, Arc::new(ProxyAdapter::new(source, serializer)));
    }

    /// Add any serializer contributed by `source`; it is wrapped in
    /// [`Isolated`]
    pub fn add_serializer(&self, source: &str, serializer: Arc<dyn Serializer>) {
        self.contributions.write().serializers.push(ContributedSerializer {
            source: source.to_string(),
            serializer: Arc::new(Isolated::new(serializer)),
        });
    }

    /// Admission contributors in registration order
    pub fn whitelists(&self) -> Vec<Arc<dyn WhitelistContributor>> {
        self.contributions.read().whitelists.clone()
    }

    /// Contributed serializers in registration order
    pub fn serializers(&self) -> Vec<ContributedSerializer> {
        self.contributions.read().serializers.clone()
    }

    /// Merge every contribution into `policy`, in registration order
    ///
    /// Names already admitted are skipped, so this can run again against the
    /// same policy. Returns how many names were new.
    pub fn apply_whitelists(&self, policy: &AdmissionPolicy) -> Result<usize> {
        let mut added = 0;
        for contributor in self.whitelists() {
            let count = policy.admit_missing(contributor.whitelist())?;
            if count > 0 {
                debug!(contributor = contributor.name(), policy = %policy.id(), count, "merged whitelist");
            }
            added += count;
        }
        Ok(added)
    }

    /// Fresh listed policy seeded from every contribution
    pub fn default_policy(&self) -> Result<AdmissionPolicy> {
        let policy = AdmissionPolicy::new();
        self.apply_whitelists(&policy)?;
        Ok(policy)
    }
}
