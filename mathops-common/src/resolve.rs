//! Last-writer-wins resolution
//!
//! Several jobs see more than one row for the same key (duplicate ODS
//! applications, repeated math plan answers, multiple test scores) and must
//! keep the "most recent" one. Each job describes what "recent" means as an
//! ordered chain of comparison tiers; the first tier that distinguishes two
//! records decides.
//!
//! # Usage
//!
//! ```rust,ignore
//! let chain = RecencyChain::new()
//!     .then_by_optional(|r: &Row| r.term)
//!     .then_by_optional(|r: &Row| r.date)
//!     .then_by_key(|r: &Row| r.digest());
//!
//! let winners = resolve_latest(rows, |r| r.id.clone(), &chain);
//! ```

use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

type Tier<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Ordered sequence of comparison tiers
///
/// `compare(a, b) == Greater` means `a` is more recent than `b`.
pub struct RecencyChain<T> {
    tiers: Vec<Tier<T>>,
}

impl<T> Default for RecencyChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyChain<T> {
    /// Create an empty chain (every pair compares equal)
    pub fn new() -> Self {
        Self { tiers: Vec::new() }
    }

    /// Append an arbitrary comparison tier
    pub fn then_by<F>(mut self, tier: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.tiers.push(Box::new(tier));
        self
    }

    /// Append a tier where the larger key is more recent
    pub fn then_by_key<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.then_by(move |a, b| key(a).cmp(&key(b)))
    }

    /// Append a tier over an optional key
    ///
    /// A present value beats an absent one; two absent values tie and defer
    /// to the next tier.
    pub fn then_by_optional<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> Option<K> + Send + Sync + 'static,
    {
        self.then_by(move |a, b| compare_optional(key(a), key(b)))
    }

    /// Compare two records tier by tier
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.tiers
            .iter()
            .map(|tier| tier(a, b))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// True if `a` strictly wins over `b`
    pub fn is_more_recent(&self, a: &T, b: &T) -> bool {
        self.compare(a, b) == Ordering::Greater
    }

    /// Index of the tier that decided between `a` and `b`, if any
    pub fn deciding_tier(&self, a: &T, b: &T) -> Option<usize> {
        self.tiers
            .iter()
            .position(|tier| tier(a, b) != Ordering::Equal)
    }
}

/// Compare optional values with "present beats absent"
pub fn compare_optional<K: Ord>(a: Option<K>, b: Option<K>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Keep, per key, the item that compares greatest under `chain`
///
/// When two items tie on every tier the first one seen is kept.
pub fn resolve_latest<T, K, I, F>(items: I, key: F, chain: &RecencyChain<T>) -> HashMap<K, T>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut winners: HashMap<K, T> = HashMap::new();

    for item in items {
        let k = key(&item);
        match winners.get(&k) {
            Some(existing) if !chain.is_more_recent(&item, existing) => {}
            _ => {
                winners.insert(k, item);
            }
        }
    }

    winners
}

/// Stable digest over a record's field values
///
/// Used as a final tier so otherwise-identical candidates still produce a
/// repeatable winner across runs and platforms. Absent fields hash
/// differently from empty strings.
pub fn content_digest<'a, I>(fields: I) -> [u8; 32]
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut hasher = Sha256::new();
    for field in fields {
        match field {
            Some(value) => {
                hasher.update([1u8]);
                hasher.update((value.len() as u64).to_le_bytes());
                hasher.update(value.as_bytes());
            }
            None => hasher.update([0u8]),
        }
    }
    hasher.finalize().into()
}
