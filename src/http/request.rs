/// The parsed first line of a request.
///
/// Produced once per transaction by the request reader and never modified
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Request method exactly as sent (e.g. "GET")
    pub method: String,
    /// Path component of the request target, without the query
    pub path: String,
    /// Protocol token (typically "HTTP/1.1")
    pub protocol: String,
    /// "http" unless the target was in absolute form with another scheme
    pub scheme: String,
    /// Everything after the first `?`, or empty
    pub query_string: String,
}

/// Request headers keyed by their CGI form (`HTTP_CONTENT_TYPE`).
///
/// Keeps insertion order; lookups are linear, which is fine for the handful of
/// headers a request carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

/// Builder for constructing RequestLine objects.
pub struct RequestLineBuilder {
    method: Option<String>,
    path: Option<String>,
    protocol: Option<String>,
    scheme: Option<String>,
    query_string: String,
}

impl RequestLineBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            protocol: None,
            scheme: None,
            query_string: String::new(),
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn query_string(mut self, query: impl Into<String>) -> Self {
        self.query_string = query.into();
        self
    }

    pub fn build(self) -> Result<RequestLine, &'static str> {
        Ok(RequestLine {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            protocol: self.protocol.unwrap_or_else(|| "HTTP/1.1".to_string()),
            scheme: self.scheme.unwrap_or_else(|| "http".to_string()),
            query_string: self.query_string,
        })
    }
}

impl Default for RequestLineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a wire header name to its CGI key: `Content-Type` becomes
    /// `HTTP_CONTENT_TYPE`.
    pub fn normalize_key(name: &str) -> String {
        let mut key = String::with_capacity(name.len() + 5);
        key.push_str("HTTP_");
        key.extend(name.trim().chars().map(|c| match c {
            '-' => '_',
            c => c.to_ascii_uppercase(),
        }));
        key
    }

    /// Adds a header by wire name. A repeated name has its value appended
    /// with a comma, as HTTP allows for list-valued fields.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let key = Self::normalize_key(name);
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => {
                existing.push(',');
                existing.push_str(&value);
            }
            None => self.entries.push((key, value)),
        }
    }

    /// Looks up a header by its normalized key (`HTTP_CONNECTION`).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut String> {
        self.entries.last_mut().map(|(_, v)| v)
    }
}
