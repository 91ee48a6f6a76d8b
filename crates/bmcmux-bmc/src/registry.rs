//! Ordered provider registry
//!
//! The registry holds the providers for one BMC in precedence order. Filters
//! and preference methods return a new registry and leave the original
//! untouched; preference only reorders, it never drops a provider.

use std::sync::Arc;

use crate::capability::Capability;
use crate::provider::{Provider, RegisteredProvider};
use crate::types::Protocol;

/// Providers for one BMC, in the order they will be attempted
#[derive(Debug, Clone, Default)]
pub struct Registry {
    providers: Vec<RegisteredProvider>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider at the end of the list
    pub fn register<P: Provider + 'static>(&mut self, provider: P) {
        self.providers.push(RegisteredProvider::new(provider));
    }

    /// Register a provider (Arc version for shared ownership)
    pub fn register_arc<P: Provider + 'static>(&mut self, provider: Arc<P>) {
        self.providers.push(RegisteredProvider::from_arc(provider));
    }

    /// Get a provider by name
    pub fn get(&self, name: &str) -> Option<&RegisteredProvider> {
        self.providers.iter().find(|p| p.name() == name)
    }

    /// Check if a provider is registered
    pub fn has_provider(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Provider names in precedence order
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn providers(&self) -> &[RegisteredProvider] {
        &self.providers
    }

    /// Providers speaking `protocol`
    pub fn using(&self, protocol: Protocol) -> Registry {
        self.filter(|p| p.protocol() == Some(protocol))
    }

    /// Only the provider called `name`
    pub fn for_provider(&self, name: &str) -> Registry {
        self.filter(|p| p.name() == name)
    }

    /// Providers implementing capability `C`
    pub fn supports<C: Capability + ?Sized>(&self) -> Registry {
        self.filter(|p| C::resolve(p.provider()).is_some())
    }

    /// Move the provider called `name` to the front
    pub fn prefer_provider(&self, name: &str) -> Registry {
        let (mut preferred, rest): (Vec<_>, Vec<_>) = self
            .providers
            .iter()
            .cloned()
            .partition(|p| p.name() == name);
        preferred.extend(rest);
        Registry {
            providers: preferred,
        }
    }

    /// Order providers by the position of their protocol in `protocols`
    ///
    /// Providers whose protocol is not listed keep their relative order
    /// after the listed ones.
    pub fn prefer_protocol(&self, protocols: &[Protocol]) -> Registry {
        let mut providers = self.providers.clone();
        providers.sort_by_key(|p| {
            p.protocol()
                .and_then(|proto| protocols.iter().position(|x| *x == proto))
                .unwrap_or(protocols.len())
        });
        Registry { providers }
    }

    fn filter(&self, keep: impl Fn(&RegisteredProvider) -> bool) -> Registry {
        Registry {
            providers: self.providers.iter().filter(|p| keep(p)).cloned().collect(),
        }
    }
}

impl From<Vec<RegisteredProvider>> for Registry {
    fn from(providers: Vec<RegisteredProvider>) -> Self {
        Self { providers }
    }
}

impl FromIterator<RegisteredProvider> for Registry {
    fn from_iter<I: IntoIterator<Item = RegisteredProvider>>(iter: I) -> Self {
        Self {
            providers: iter.into_iter().collect(),
        }
    }
}

impl AsRef<[RegisteredProvider]> for Registry {
    fn as_ref(&self) -> &[RegisteredProvider] {
        &self.providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::power::PowerSetter;
    use crate::testing::{Behavior, ScriptedProvider};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(ScriptedProvider::new("redfish").with_protocol(Protocol::Redfish));
        registry.register(
            ScriptedProvider::new("ipmitool")
                .with_protocol(Protocol::Ipmi)
                .script::<dyn PowerSetter>(Behavior::Succeed),
        );
        registry.register(ScriptedProvider::new("custom"));
        registry.register(
            ScriptedProvider::new("wol")
                .with_protocol(Protocol::Wol)
                .script::<dyn PowerSetter>(Behavior::Succeed),
        );
        registry
    }

    #[test]
    fn test_registry_new() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_register() {
        let registry = registry();
        assert_eq!(registry.len(), 4);
        assert!(registry.has_provider("ipmitool"));
        assert!(!registry.has_provider("nonexistent"));
        assert_eq!(registry.names(), vec!["redfish", "ipmitool", "custom", "wol"]);
    }

    #[test]
    fn test_registry_register_arc() {
        let mut registry = Registry::new();
        registry.register_arc(Arc::new(ScriptedProvider::new("shared")));

        assert!(registry.get("shared").is_some());
    }

    #[test]
    fn test_using_protocol() {
        let registry = registry().using(Protocol::Ipmi);
        assert_eq!(registry.names(), vec!["ipmitool"]);
    }

    #[test]
    fn test_for_provider() {
        assert_eq!(registry().for_provider("wol").names(), vec!["wol"]);
        assert!(registry().for_provider("missing").is_empty());
    }

    #[test]
    fn test_supports() {
        let registry = registry().supports::<dyn PowerSetter>();
        assert_eq!(registry.names(), vec!["ipmitool", "wol"]);
    }

    #[test]
    fn test_prefer_provider_is_stable() {
        let original = registry();
        let preferred = original.prefer_provider("custom");

        assert_eq!(preferred.names(), vec!["custom", "redfish", "ipmitool", "wol"]);
        assert_eq!(original.names(), vec!["redfish", "ipmitool", "custom", "wol"]);
        assert_eq!(
            original.prefer_provider("missing").names(),
            original.names()
        );
    }

    #[test]
    fn test_prefer_protocol() {
        let registry = registry().prefer_protocol(&[Protocol::Wol, Protocol::Ipmi]);
        assert_eq!(registry.names(), vec!["wol", "ipmitool", "redfish", "custom"]);
    }
}
