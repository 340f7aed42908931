use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use opentelemetry::{Key, KeyValue};
use rustc_hash::FxHasher;

/// A unique set of attributes that identifies one time series of a stream.
///
/// Entries are sorted by key and keys are unique, so two sets built from the
/// same attributes in a different order are equal. The hash is computed once
/// on construction.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub(crate) struct AttributeSet(Vec<KeyValue>, u64);

impl From<&[KeyValue]> for AttributeSet {
    fn from(values: &[KeyValue]) -> Self {
        AttributeSet::new(values.to_vec())
    }
}

impl AttributeSet {
    fn new(mut values: Vec<KeyValue>) -> Self {
        // Stable sort keeps insertion order among equal keys; the last one wins.
        values.sort_by(|a, b| a.key.cmp(&b.key));
        let mut deduped: Vec<KeyValue> = Vec::with_capacity(values.len());
        for kv in values {
            match deduped.last_mut() {
                Some(last) if last.key == kv.key => *last = kv,
                _ => deduped.push(kv),
            }
        }

        let hash = calculate_hash(&deduped);
        AttributeSet(deduped, hash)
    }

    /// A copy of this set holding only the keys in `allowed`.
    pub(crate) fn filter(&self, allowed: &HashSet<Key>) -> AttributeSet {
        let kept: Vec<KeyValue> = self
            .0
            .iter()
            .filter(|kv| allowed.contains(&kv.key))
            .cloned()
            .collect();
        let hash = calculate_hash(&kept);
        AttributeSet(kept, hash)
    }

    pub(crate) fn to_vec(&self) -> Vec<KeyValue> {
        self.0.clone()
    }

    #[cfg(test)]
    pub(crate) fn as_slice(&self) -> &[KeyValue] {
        &self.0
    }
}

fn calculate_hash(values: &[KeyValue]) -> u64 {
    let mut hasher = FxHasher::default();
    values.iter().for_each(|item| item.hash(&mut hasher));
    hasher.finish()
}

impl Hash for AttributeSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_independent() {
        let a = AttributeSet::from(&[KeyValue::new("a", 1), KeyValue::new("b", 2)][..]);
        let b = AttributeSet::from(&[KeyValue::new("b", 2), KeyValue::new("a", 1)][..]);
        assert_eq!(a, b);
        assert_eq!(a.1, b.1);
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let set = AttributeSet::from(
            &[
                KeyValue::new("k", "first"),
                KeyValue::new("other", true),
                KeyValue::new("k", "second"),
            ][..],
        );
        assert_eq!(
            set.as_slice(),
            [KeyValue::new("k", "second"), KeyValue::new("other", true)]
        );
    }

    #[test]
    fn filter_keeps_allowed_keys() {
        let set = AttributeSet::from(&[KeyValue::new("a", 1), KeyValue::new("b", 2)][..]);
        let allowed: HashSet<Key> = [Key::new("b")].into_iter().collect();
        let filtered = set.filter(&allowed);
        assert_eq!(filtered.as_slice(), [KeyValue::new("b", 2)]);
        assert_eq!(
            filtered,
            AttributeSet::from(&[KeyValue::new("b", 2)][..])
        );
    }
}
