//! Query-string builder for filter mappings.
//!
//! Filters are an arbitrary mapping of keys to string values. Keys are unique
//! and keep their insertion order, so the rendered query string is stable for
//! a given sequence of inserts.

use std::fmt::Display;
use url::form_urlencoded;

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Insert a key/value pair, replacing the value in place if the key exists.
    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Display,
    {
        let key = key.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<K, V>(&mut self, key: K, value: Option<V>)
    where
        K: Into<String>,
        V: Display,
    {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Builder-style [`QueryParams::push`].
    #[must_use]
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Display,
    {
        self.push(key, value);
        self
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Render as `application/x-www-form-urlencoded` (`a=1&b=two+words`).
    #[must_use]
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }

    /// Append the encoded parameters to `path`, always adding a `?`.
    #[must_use]
    pub fn append_to(&self, path: &str) -> String {
        format!("{path}?{}", self.encode())
    }

    /// Append the encoded parameters to `path` only when there are any.
    #[must_use]
    pub fn append_nonempty_to(&self, path: &str) -> String {
        if self.is_empty() {
            path.to_string()
        } else {
            self.append_to(path)
        }
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Display,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.push(key, value);
        }
        params
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for QueryParams
where
    K: Into<String>,
    V: Display,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::QueryParams;

    #[test]
    fn push_opt_skips_none() {
        let mut params = QueryParams::new();
        params.push_opt("name", Option::<String>::None);
        assert!(params.is_empty());
    }

    #[test]
    fn keeps_insertion_order() {
        let params = QueryParams::from([
            ("model", "model1"),
            ("cloud", "cloud1"),
            ("status", "active"),
        ]);
        assert_eq!(params.encode(), "model=model1&cloud=cloud1&status=active");
    }

    #[test]
    fn duplicate_key_replaces_in_place() {
        let params = QueryParams::new()
            .with("model", "r630")
            .with("cloud", "cloud02")
            .with("model", "r640");
        assert_eq!(params.len(), 2);
        assert_eq!(params.encode(), "model=r640&cloud=cloud02");
    }

    #[test]
    fn percent_encodes_reserved_characters() {
        let params = QueryParams::from([("name", "test host & more"), ("tag", "special=tag")]);
        assert_eq!(params.encode(), "name=test+host+%26+more&tag=special%3Dtag");
    }

    #[test]
    fn empty_mapping_keeps_trailing_question_mark() {
        let params = QueryParams::new();
        assert_eq!(params.append_to("hosts"), "hosts?");
        assert_eq!(params.append_nonempty_to("hosts"), "hosts");
    }

    #[test]
    fn non_string_values_are_displayed() {
        let params = QueryParams::new().with("retired", false).with("limit", 5);
        assert_eq!(params.append_to("hosts"), "hosts?retired=false&limit=5");
    }
}
