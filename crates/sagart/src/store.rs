use sagaprobe_effect::{Effect, EffectKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Insertion-ordered collection that keeps duplicates.
///
/// Deletion removes at most one entry, always the earliest match, and never
/// fails: deleting something absent is a no-op returning `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultisetStore<T> {
    entries: Vec<T>,
}

impl<T> Default for MultisetStore<T> {
    fn default() -> Self {
        MultisetStore {
            entries: Vec::new(),
        }
    }
}

impl<T> MultisetStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: T) {
        self.entries.push(value);
    }

    /// Remove the first entry satisfying `predicate`.
    pub fn delete_by(&mut self, predicate: impl Fn(&T) -> bool) -> bool {
        match self.entries.iter().position(predicate) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn values(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: PartialEq> MultisetStore<T> {
    /// Remove the first entry equal to `value`.
    pub fn delete(&mut self, value: &T) -> bool {
        self.delete_by(|entry| entry == value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.entries.contains(value)
    }
}

impl<T> FromIterator<T> for MultisetStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        MultisetStore {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Observed effects of a run, one multiset per effect kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectStore {
    by_kind: BTreeMap<EffectKind, MultisetStore<Effect>>,
}

impl EffectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, effect: Effect) {
        self.by_kind.entry(effect.kind()).or_default().add(effect);
    }

    pub fn delete(&mut self, effect: &Effect) -> bool {
        self.by_kind
            .get_mut(&effect.kind())
            .is_some_and(|store| store.delete(effect))
    }

    pub fn delete_by(&mut self, kind: EffectKind, predicate: impl Fn(&Effect) -> bool) -> bool {
        self.by_kind
            .get_mut(&kind)
            .is_some_and(|store| store.delete_by(predicate))
    }

    /// Remaining effects of one kind, in the order they were yielded.
    pub fn values(&self, kind: EffectKind) -> &[Effect] {
        self.by_kind.get(&kind).map(|s| s.values()).unwrap_or(&[])
    }

    pub fn kind(&self, kind: EffectKind) -> Option<&MultisetStore<Effect>> {
        self.by_kind.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(MultisetStore::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
