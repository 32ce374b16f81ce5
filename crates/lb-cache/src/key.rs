//! Cache key derivation.

/// Identifier of one cache entry: a namespace prefix followed by the request
/// path, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `path` under `prefix`.
    ///
    /// No normalization happens here; byte-identical paths map to the same
    /// key and anything else (including a differing query string) does not.
    pub fn for_path(prefix: &str, path: &str) -> Self {
        let mut key = String::with_capacity(prefix.len() + path.len());
        key.push_str(prefix);
        key.push_str(path);
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
