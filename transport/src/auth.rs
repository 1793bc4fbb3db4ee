use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::{errors::Result, settings::UrlParams};

pub const USER_HEADER: &str = "X-ClickHouse-User";
pub const KEY_HEADER: &str = "X-ClickHouse-Key";

/// Where the credentials travel. Exactly one method applies to every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMethod {
    #[default]
    Header,
    /// `user` and `password` query-string parameters.
    QueryString,
    BasicAuth,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }

    /// Attach the credentials to one request's headers or its own query-string parameters.
    pub(crate) fn apply(
        &self,
        method: AuthMethod,
        headers: &mut HeaderMap,
        params: &mut UrlParams,
    ) -> Result<()> {
        match method {
            AuthMethod::Header => {
                headers.insert(USER_HEADER, HeaderValue::from_str(&self.username)?);
                let mut key = HeaderValue::from_str(self.password())?;
                key.set_sensitive(true);
                headers.insert(KEY_HEADER, key);
            }
            AuthMethod::QueryString => {
                params.set("user", &self.username);
                params.set("password", self.password());
            }
            AuthMethod::BasicAuth => {
                let token = STANDARD.encode(format!("{}:{}", self.username, self.password()));
                let mut value = HeaderValue::from_str(&format!("Basic {token}"))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
        }
        Ok(())
    }
}
