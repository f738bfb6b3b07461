use std::collections::HashMap;

use crate::schema::Record;

/// Maps internal field identifiers to user-facing labels.
#[derive(Debug, Clone, Default)]
pub struct DisplayLabelMap {
    labels: HashMap<String, String>,
}

impl DisplayLabelMap {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Japanese labels for the estate schema fields.
    pub fn estate() -> Self {
        Self::new([
            ("price", "価格"),
            ("location", "所在地"),
            ("structure", "構造"),
            ("floors", "階建"),
            ("floor_part", "階部分"),
            ("area", "面積"),
        ])
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Rename record keys through `labels`, keeping order; unknown keys pass through.
pub fn change_key(record: &Record, labels: &DisplayLabelMap) -> Record {
    let mut out = Record::new();
    for (key, value) in record {
        let key = labels.label(key).unwrap_or(key);
        out.insert(key.to_string(), value.clone());
    }
    out
}
