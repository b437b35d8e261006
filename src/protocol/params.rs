//! Request parameters and their canonical wire form.

/// Separator used when a parameter carries a list of values (`tags=rock,indie`).
pub const LIST_DELIMITER: &str = ",";

/// A single request parameter value.
///
/// Absent values and values that normalize to an empty string are dropped
/// before encoding; they never reach the wire as `name=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
    /// Raw bytes in an unknown encoding, transcoded on normalization.
    Bytes(Vec<u8>),
    Absent,
}

impl ParamValue {
    /// Normalized wire text, or `None` when the parameter must be omitted.
    pub fn to_wire(&self) -> Option<String> {
        let text = match self {
            ParamValue::Text(s) => s.clone(),
            ParamValue::List(items) => items
                .iter()
                .filter(|s| !s.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(LIST_DELIMITER),
            ParamValue::Bytes(bytes) => transcode_to_utf8(bytes),
            ParamValue::Absent => return None,
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<&String> for ParamValue {
    fn from(s: &String) -> Self {
        ParamValue::Text(s.clone())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        ParamValue::List(items)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(items: Vec<&str>) -> Self {
        ParamValue::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<&[u8]> for ParamValue {
    fn from(bytes: &[u8]) -> Self {
        ParamValue::Bytes(bytes.to_vec())
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Text(if b { "1" } else { "0" }.to_string())
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(n: $t) -> Self {
                ParamValue::Text(n.to_string())
            }
        })*
    };
}

impl_from_integer!(u8, u16, u32, u64, usize, i32, i64);

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ParamValue::Absent)
    }
}

/// Insertion-ordered parameter map with unique names.
///
/// Inserting an existing name replaces its value in place, so the later
/// writer wins while the original position is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// True when `name` is present with a value that survives normalization.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).and_then(ParamValue::to_wire).is_some()
    }

    /// Merge `other` on top of `self`; names in `other` win.
    pub fn merge(&mut self, other: Params) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Normalized `(name, value)` pairs in ascending byte order of the name.
    ///
    /// Absent and empty values are excluded. This is the order used for both
    /// signing and cache keys.
    pub fn canonical(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .entries
            .iter()
            .filter_map(|(n, v)| v.to_wire().map(|w| (n.clone(), w)))
            .collect();
        pairs.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        pairs
    }

    /// `application/x-www-form-urlencoded` rendition of [`Params::canonical`].
    pub fn encode_query(&self) -> String {
        encode_pairs(&self.canonical())
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Form-encode already normalized pairs, preserving their order.
pub fn encode_pairs(pairs: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

/// Decode bytes of unknown encoding into UTF-8.
///
/// Valid UTF-8 passes through untouched. Anything else is read as ISO-8859-1,
/// where every byte is the code point of the same value, so decoding never fails.
pub fn transcode_to_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
