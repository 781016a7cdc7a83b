use std::time::Duration;

use super::http_client::{HttpClient, DEFAULT_TIMEOUT};
use crate::protocol::RequestError;

/// Builder for [`HttpClient`].
///
/// ```rust,no_run
/// use booklist_client::BooklistClientBuilder;
///
/// # async fn example() -> Result<(), booklist_client::RequestError> {
/// let client = BooklistClientBuilder::new("http://localhost:3000")
///     .auth("alice", "secret")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct BooklistClientBuilder {
    addr: String,
    auth: Option<AuthMethod>,
    timeout_ms: Option<u64>,
}

enum AuthMethod {
    UsernamePassword { username: String, password: String },
    Token { token: String },
}

impl BooklistClientBuilder {
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_string(),
            auth: None,
            timeout_ms: None,
        }
    }

    /// Log in with username and password during [`BooklistClientBuilder::build`].
    pub fn auth(mut self, username: &str, password: &str) -> Self {
        self.auth = Some(AuthMethod::UsernamePassword {
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    /// Reuse a previously issued session token instead of logging in.
    pub fn auth_with_token(mut self, token: &str) -> Self {
        self.auth = Some(AuthMethod::Token {
            token: token.to_string(),
        });
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    pub async fn build(self) -> Result<HttpClient, RequestError> {
        let timeout = self
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT);
        let mut client = HttpClient::with_timeout(&self.addr, timeout)?;

        match self.auth {
            Some(AuthMethod::UsernamePassword { username, password }) => {
                client.login(&username, &password).await?;
            }
            Some(AuthMethod::Token { token }) => client.set_token(&token),
            None => {}
        }

        Ok(client)
    }
}
