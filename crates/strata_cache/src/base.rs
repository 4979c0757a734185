//! The base layer: raw source content at the bottom of the chain.

use std::fmt;
use std::hash::Hash;
use std::path::Path;
use std::sync::{Arc, RwLock};

use strata_deps::DependencyRegistry;
use strata_source::ChangeEvent;

use crate::spec::{Domain, View};
use crate::update::TriggeredDeps;

/// Domain logic of the base layer.
///
/// The base is not memoized; it owns the raw content and interprets the
/// incoming change events. `apply_event` is the only mutation point of the
/// whole chain, and `read` must be total: unknown keys yield the absent
/// value.
pub trait BaseSpec<G: Domain>: Send + Sync + 'static {
    /// Identity of a base entity (typically a module name).
    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    /// Raw content served upstream of the first cached layer.
    type Value: Clone + fmt::Debug + Send + Sync + 'static;

    /// Applies one raw change event to the base state, returning the
    /// dependency seeds it triggers. An event that changes nothing
    /// observable (same content hash) returns no seeds.
    fn apply_event(&mut self, event: &ChangeEvent) -> Vec<G::Dep>;

    /// Reads the current content for `key`.
    fn read(&self, key: &Self::Key) -> Self::Value;

    /// Maps a path to its base key, or `None` for paths outside the
    /// tracked domain.
    fn key_for_path(&self, path: &Path) -> Option<Self::Key>;

    /// The dependency describing "this base entity changed".
    fn key_to_dependency(&self, key: &Self::Key) -> G::Dep;

    /// The overlay ownership unit `key` belongs to.
    fn owner_of(&self, key: &Self::Key) -> G::Owner;

    /// Builds a content value from overlay-supplied code.
    fn value_from_code(&self, code: &str) -> Self::Value;

    /// The value served for keys with no content.
    fn absent_value(&self) -> Self::Value;
}

/// Layer 0 of a pipeline: wraps the base state and seeds updates.
pub struct BaseLayer<G: Domain, B: BaseSpec<G>> {
    state: RwLock<B>,
    registry: Arc<DependencyRegistry<G::Dep>>,
}

impl<G: Domain, B: BaseSpec<G>> BaseLayer<G, B> {
    /// Wraps `state` as the bottom of a chain.
    pub fn new(state: B, registry: Arc<DependencyRegistry<G::Dep>>) -> Self {
        Self {
            state: RwLock::new(state),
            registry,
        }
    }

    /// Applies a batch of change events, returning the triggered seed set
    /// for the update protocol.
    pub fn apply_events(&self, events: &[ChangeEvent]) -> TriggeredDeps {
        let mut state = self.state.write().unwrap();
        let mut triggered = TriggeredDeps::new();
        for event in events {
            for dep in state.apply_event(event) {
                triggered.insert(self.registry.register(&dep));
            }
        }
        triggered
    }

    /// Runs `f` against the base state under the read lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        f(&self.state.read().unwrap())
    }

    /// The registry shared by the chain above this base.
    pub fn registry(&self) -> &Arc<DependencyRegistry<G::Dep>> {
        &self.registry
    }
}

impl<G: Domain, B: BaseSpec<G>> View<B::Key, B::Value> for BaseLayer<G, B> {
    fn read(&self, key: &B::Key) -> B::Value {
        self.state.read().unwrap().read(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    struct TestDomain;
    impl Domain for TestDomain {
        type Dep = String;
        type Owner = String;
    }

    /// Minimal base: path stem → line count.
    struct CountBase {
        counts: HashMap<String, i64>,
    }

    impl BaseSpec<TestDomain> for CountBase {
        type Key = String;
        type Value = i64;

        fn apply_event(&mut self, event: &ChangeEvent) -> Vec<String> {
            let key = match self.key_for_path(&event.path) {
                Some(key) => key,
                None => return Vec::new(),
            };
            match event.kind {
                strata_source::ChangeKind::Deleted => {
                    self.counts.remove(&key);
                }
                _ => {
                    *self.counts.entry(key.clone()).or_insert(0) += 1;
                }
            }
            vec![self.key_to_dependency(&key)]
        }

        fn read(&self, key: &String) -> i64 {
            *self.counts.get(key).unwrap_or(&-1)
        }

        fn key_for_path(&self, path: &Path) -> Option<String> {
            path.file_stem()?.to_str().map(str::to_string)
        }

        fn key_to_dependency(&self, key: &String) -> String {
            format!("content:{key}")
        }

        fn owner_of(&self, key: &String) -> String {
            key.clone()
        }

        fn value_from_code(&self, code: &str) -> i64 {
            code.lines().count() as i64
        }

        fn absent_value(&self) -> i64 {
            -1
        }
    }

    fn make_base() -> BaseLayer<TestDomain, CountBase> {
        BaseLayer::new(
            CountBase {
                counts: HashMap::new(),
            },
            Arc::new(DependencyRegistry::new()),
        )
    }

    #[test]
    fn apply_events_seeds_triggered_set() {
        let base = make_base();
        let triggered = base.apply_events(&[ChangeEvent::created(PathBuf::from("a.st"))]);
        assert_eq!(triggered.len(), 1);
        let id = base.registry().lookup(&"content:a".to_string()).unwrap();
        assert!(triggered.contains(id));
    }

    #[test]
    fn read_serves_current_state() {
        let base = make_base();
        base.apply_events(&[ChangeEvent::created(PathBuf::from("a.st"))]);
        assert_eq!(base.read(&"a".to_string()), 1);
    }

    #[test]
    fn unknown_key_reads_absent_value() {
        let base = make_base();
        assert_eq!(base.read(&"ghost".to_string()), -1);
    }

    #[test]
    fn deletion_seeds_and_removes() {
        let base = make_base();
        base.apply_events(&[ChangeEvent::created(PathBuf::from("a.st"))]);
        let triggered = base.apply_events(&[ChangeEvent::deleted(PathBuf::from("a.st"))]);
        assert_eq!(triggered.len(), 1);
        assert_eq!(base.read(&"a".to_string()), -1);
    }
}
