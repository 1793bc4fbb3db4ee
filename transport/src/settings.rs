use std::time::Duration;

use url::Url;

/// Keys a read-only user is not allowed to send.
const READONLY_FORBIDDEN: [&str; 4] = [
    "extremes",
    "readonly",
    "enable_http_compression",
    "max_execution_time",
];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Query-string parameters in insertion order. Setting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams {
    pairs: Vec<(String, String)>,
}

impl UrlParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        let key = key.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let at = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(at).1)
    }

    /// Overlay `other` on top of these parameters.
    pub fn merge(&mut self, other: &UrlParams) -> &mut Self {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Append the parameters to `url`'s query string.
    pub fn apply_to(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        url.query_pairs_mut().extend_pairs(self.iter());
    }
}

/// Connection-scoped options. Most become query-string parameters on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    database: String,
    https: bool,
    readonly_user: bool,
    enable_http_compression: bool,
    extremes: bool,
    max_execution_time: Option<u64>,
    session_id: Option<String>,
    timeout: Duration,
    engine: UrlParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: "default".to_string(),
            https: false,
            readonly_user: false,
            enable_http_compression: false,
            extremes: false,
            max_execution_time: None,
            session_id: None,
            timeout: DEFAULT_TIMEOUT,
            engine: UrlParams::new(),
        }
    }
}

impl Settings {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn database(&mut self, database: impl Into<String>) -> &mut Self {
        self.database = database.into();
        self
    }

    pub fn https(&mut self, https: bool) -> &mut Self {
        self.https = https;
        self
    }

    /// Mark the connecting user as read-only on the server side.
    pub fn readonly_user(&mut self, readonly_user: bool) -> &mut Self {
        self.readonly_user = readonly_user;
        self
    }

    pub fn enable_http_compression(&mut self, enable: bool) -> &mut Self {
        self.enable_http_compression = enable;
        self
    }

    pub fn extremes(&mut self, extremes: bool) -> &mut Self {
        self.extremes = extremes;
        self
    }

    pub fn max_execution_time(&mut self, seconds: u64) -> &mut Self {
        self.max_execution_time = Some(seconds);
        self
    }

    pub fn session_id(&mut self, session_id: impl Into<String>) -> &mut Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn clear_session(&mut self) -> &mut Self {
        self.session_id = None;
        self
    }

    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Any other engine setting, e.g. `max_threads`.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.engine.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.engine.get(key)
    }

    pub fn get_database(&self) -> &str {
        &self.database
    }

    pub fn is_https(&self) -> bool {
        self.https
    }

    pub fn is_readonly_user(&self) -> bool {
        self.readonly_user
    }

    pub fn is_enable_http_compression(&self) -> bool {
        self.enable_http_compression
    }

    pub fn get_session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    /// The query-string parameters for one request: settings first, then `overrides` on top.
    ///
    /// Read-only users never send keys the server would reject for them, and the `https` key is
    /// never sent.
    pub fn derive_parameters(&self, overrides: &UrlParams) -> UrlParams {
        let mut params = UrlParams::new();
        params.set("database", &self.database);
        if self.enable_http_compression {
            params.set("enable_http_compression", 1);
        }
        if self.extremes {
            params.set("extremes", 1);
        }
        if let Some(seconds) = self.max_execution_time {
            params.set("max_execution_time", seconds);
        }
        if let Some(session_id) = &self.session_id {
            params.set("session_id", session_id);
        }
        params.merge(&self.engine).merge(overrides);

        if self.readonly_user {
            for key in READONLY_FORBIDDEN {
                params.remove(key);
            }
        }
        params.remove("https");
        params
    }
}
