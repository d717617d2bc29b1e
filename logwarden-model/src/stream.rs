use std::fmt;

use crate::entry::Labels;

/// The equivalence class of entries sharing the same filtered label set at
/// the ordered log store sink.
///
/// `Labels` is a `BTreeMap`, so iteration order is already canonical by
/// construction; `StreamKey::from_labels` relies on that instead of sorting
/// again, but takes an already-sorted map as its contract so callers can't
/// accidentally pass something unsorted.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamKey(String);

impl StreamKey {
    pub fn from_labels(labels: &Labels) -> Self {
        let mut out = String::new();
        for (k, v) in labels {
            if !out.is_empty() {
                out.push(',');
            }
            out.push_str(k);
            out.push('=');
            out.push_str(v);
        }
        StreamKey(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_independent_of_insertion_order() {
        let mut m1 = Labels::new();
        m1.insert("a".into(), "1".into());
        m1.insert("b".into(), "2".into());
        m1.insert("c".into(), "3".into());

        let mut m2 = Labels::new();
        m2.insert("c".into(), "3".into());
        m2.insert("a".into(), "1".into());
        m2.insert("b".into(), "2".into());

        assert_eq!(StreamKey::from_labels(&m1), StreamKey::from_labels(&m2));
    }

    #[test]
    fn distinct_maps_produce_distinct_keys() {
        let mut m1 = Labels::new();
        m1.insert("a".into(), "1".into());
        let mut m2 = Labels::new();
        m2.insert("a".into(), "2".into());
        assert_ne!(StreamKey::from_labels(&m1), StreamKey::from_labels(&m2));
    }
}
