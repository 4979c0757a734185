//! The base of the chain: raw module sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use strata_cache::BaseSpec;
use strata_common::{Ident, Interner};
use strata_source::{module_stem, ChangeEvent, ChangeKind, SourceDb, SourceProvider};

use crate::fact::{AnalysisDomain, Fact};

/// The base layer's value: a module's source text, or nothing.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SourceText {
    /// The module exists with this content.
    Present(Arc<str>),
    /// No such module.
    Absent,
}

/// Base state: the source database plus the module-name index.
///
/// Change events mutate this state and seed the update protocol. Content
/// is pulled through the [`SourceProvider`] when an event arrives, and
/// hashed by the database so events that did not actually change anything
/// seed nothing.
pub struct SourceBase {
    db: SourceDb,
    modules: HashMap<Ident, PathBuf>,
    provider: Arc<dyn SourceProvider>,
    interner: Arc<Interner>,
}

impl SourceBase {
    /// Creates an empty base reading through `provider`.
    pub fn new(provider: Arc<dyn SourceProvider>, interner: Arc<Interner>) -> Self {
        Self {
            db: SourceDb::new(),
            modules: HashMap::new(),
            provider,
            interner,
        }
    }

    /// All currently known module names.
    pub fn modules(&self) -> Vec<Ident> {
        self.modules.keys().copied().collect()
    }

    /// The interner shared with the rest of the pipeline.
    pub fn interner(&self) -> &Arc<Interner> {
        &self.interner
    }

    fn remove(&mut self, module: Ident, path: &Path) -> Vec<Fact> {
        let existed = self.db.remove(path).is_some();
        self.modules.remove(&module);
        if existed {
            vec![Fact::Content(module)]
        } else {
            Vec::new()
        }
    }
}

impl BaseSpec<AnalysisDomain> for SourceBase {
    type Key = Ident;
    type Value = SourceText;

    fn apply_event(&mut self, event: &ChangeEvent) -> Vec<Fact> {
        let Some(module) = self.key_for_path(&event.path) else {
            return Vec::new();
        };
        match event.kind {
            ChangeKind::Deleted => self.remove(module, &event.path),
            ChangeKind::Created | ChangeKind::Modified => match self.provider.read(&event.path) {
                Ok(content) => {
                    let (_, changed) = self.db.upsert(&event.path, &content);
                    self.modules.insert(module, event.path.clone());
                    if changed {
                        vec![Fact::Content(module)]
                    } else {
                        Vec::new()
                    }
                }
                Err(error) => {
                    warn!(
                        path = %event.path.display(),
                        %error,
                        "change event for unreadable file; treating as deleted"
                    );
                    self.remove(module, &event.path)
                }
            },
        }
    }

    fn read(&self, key: &Ident) -> SourceText {
        match self.modules.get(key).and_then(|path| self.db.content(path)) {
            Some(content) => SourceText::Present(content),
            None => SourceText::Absent,
        }
    }

    fn key_for_path(&self, path: &Path) -> Option<Ident> {
        module_stem(path).map(|stem| self.interner.intern(stem))
    }

    fn key_to_dependency(&self, key: &Ident) -> Fact {
        Fact::Content(*key)
    }

    fn owner_of(&self, key: &Ident) -> Ident {
        *key
    }

    fn value_from_code(&self, code: &str) -> SourceText {
        SourceText::Present(Arc::from(code))
    }

    fn absent_value(&self) -> SourceText {
        SourceText::Absent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_source::MemoryProvider;

    fn make_base() -> (MemoryProvider, SourceBase) {
        let provider = MemoryProvider::new();
        let base = SourceBase::new(
            Arc::new(provider.clone()),
            Arc::new(Interner::new()),
        );
        (provider, base)
    }

    #[test]
    fn created_file_becomes_readable() {
        let (provider, mut base) = make_base();
        provider.set("a.st", "foo: int");
        let seeds = base.apply_event(&ChangeEvent::created("a.st"));

        let a = base.interner().get("a").unwrap();
        assert_eq!(seeds, vec![Fact::Content(a)]);
        assert_eq!(
            base.read(&a),
            SourceText::Present(Arc::from("foo: int"))
        );
    }

    #[test]
    fn unchanged_content_seeds_nothing() {
        let (provider, mut base) = make_base();
        provider.set("a.st", "foo: int");
        base.apply_event(&ChangeEvent::created("a.st"));
        let seeds = base.apply_event(&ChangeEvent::modified("a.st"));
        assert!(seeds.is_empty());
    }

    #[test]
    fn deletion_seeds_and_clears() {
        let (provider, mut base) = make_base();
        provider.set("a.st", "foo: int");
        base.apply_event(&ChangeEvent::created("a.st"));
        provider.remove(Path::new("a.st"));

        let a = base.interner().get("a").unwrap();
        let seeds = base.apply_event(&ChangeEvent::deleted("a.st"));
        assert_eq!(seeds, vec![Fact::Content(a)]);
        assert_eq!(base.read(&a), SourceText::Absent);
        assert!(base.modules().is_empty());
    }

    #[test]
    fn deleting_unknown_file_seeds_nothing() {
        let (_provider, mut base) = make_base();
        assert!(base.apply_event(&ChangeEvent::deleted("ghost.st")).is_empty());
    }

    #[test]
    fn unreadable_file_is_treated_as_deleted() {
        let (provider, mut base) = make_base();
        provider.set("a.st", "foo: int");
        base.apply_event(&ChangeEvent::created("a.st"));
        provider.remove(Path::new("a.st"));

        let a = base.interner().get("a").unwrap();
        let seeds = base.apply_event(&ChangeEvent::modified("a.st"));
        assert_eq!(seeds, vec![Fact::Content(a)]);
        assert_eq!(base.read(&a), SourceText::Absent);
    }

    #[test]
    fn unknown_module_reads_absent() {
        let (_provider, base) = make_base();
        let ghost = base.interner().intern("ghost");
        assert_eq!(base.read(&ghost), SourceText::Absent);
    }
}
