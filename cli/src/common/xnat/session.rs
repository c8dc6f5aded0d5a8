//! # Xnat4tests XNAT Session
//!
//! File: cli/src/common/xnat/session.rs
//!
//! ## Overview
//!
//! An authenticated session against the XNAT REST API. Connecting exchanges
//! the configured credentials for a `JSESSIONID` token via
//! `POST /data/JSESSION`; the token is then sent as a cookie on every
//! request. Sessions are used scoped (acquire, use, `logout()`): the command
//! handlers always log out, including on the error path.
//!
//! ## Architecture
//!
//! Connection failures are classified for the readiness probe:
//! - transport-level failures (refused, reset, dropped) →
//!   `XnatUnreachable` (retryable);
//! - HTTP 404 / 5xx from a Tomcat that is up but still deploying XNAT →
//!   `XnatNotReady` (retryable);
//! - anything else (401 bad credentials, 4xx API errors) → `XnatApi`,
//!   propagated immediately.
//!
use crate::core::config::Config;
use crate::core::error::{Result, Xnat4testsError};
use anyhow::anyhow;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, instrument};

/// An authenticated XNAT session handle.
#[derive(Debug)]
pub struct XnatSession {
    client: reqwest::Client,
    base_uri: String,
    jsessionid: String,
}

impl XnatSession {
    /// Performs a single authenticated handshake against the configured
    /// XNAT endpoint. See the module docs for the error classification.
    #[instrument(skip(cfg), fields(uri = %cfg.xnat_uri()))]
    pub async fn connect(cfg: &Config) -> Result<XnatSession> {
        let base_uri = cfg.xnat_uri();
        debug!("Connecting to {} as '{}'", base_uri, cfg.xnat_user);

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{base_uri}/data/JSESSION"))
            .basic_auth(&cfg.xnat_user, Some(&cfg.xnat_password))
            .send()
            .await
            .map_err(|e| {
                anyhow!(Xnat4testsError::XnatUnreachable {
                    uri: base_uri.clone(),
                    source: e,
                })
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status.is_server_error() {
            // Tomcat answers before the XNAT webapp has finished deploying.
            return Err(anyhow!(Xnat4testsError::XnatNotReady {
                uri: base_uri,
                status: status.as_u16(),
            }));
        }
        if !status.is_success() {
            return Err(anyhow!(Xnat4testsError::XnatApi(format!(
                "authentication against {base_uri} failed with HTTP {status}"
            ))));
        }

        let jsessionid = response.text().await.map_err(|e| {
            anyhow!(Xnat4testsError::XnatUnreachable {
                uri: base_uri.clone(),
                source: e,
            })
        })?;
        info!("Connected to {} as '{}'", base_uri, cfg.xnat_user);

        Ok(XnatSession {
            client,
            base_uri,
            jsessionid,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_uri, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("Cookie", format!("JSESSIONID={}", self.jsessionid))
    }

    async fn send_checked(
        &self,
        builder: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response> {
        let response = builder.send().await.map_err(|e| {
            anyhow!(Xnat4testsError::XnatUnreachable {
                uri: self.base_uri.clone(),
                source: e,
            })
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(Xnat4testsError::XnatApi(format!(
                "{path} returned HTTP {status}: {body}"
            ))));
        }
        Ok(response)
    }

    /// GET returning the decoded JSON body.
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self
            .send_checked(self.request(reqwest::Method::GET, path), path)
            .await?;
        response
            .json()
            .await
            .map_err(|e| anyhow!(Xnat4testsError::XnatApi(format!("{path}: {e}"))))
    }

    /// PUT with an empty body (XNAT's create-by-path idiom, e.g.
    /// `/data/archive/projects/<id>`).
    pub async fn put(&self, path: &str) -> Result<()> {
        self.send_checked(self.request(reqwest::Method::PUT, path), path)
            .await?;
        Ok(())
    }

    /// PUT uploading raw file bytes.
    pub async fn put_file(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
        self.send_checked(self.request(reqwest::Method::PUT, path).body(bytes), path)
            .await?;
        Ok(())
    }

    /// POST with a JSON body.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<()> {
        self.send_checked(self.request(reqwest::Method::POST, path).json(body), path)
            .await?;
        Ok(())
    }

    /// Invalidates the session server-side. Best effort: callers invoke this
    /// on both success and error paths before propagating the result.
    pub async fn logout(self) -> Result<()> {
        debug!("Closing XNAT session against {}", self.base_uri);
        self.send_checked(
            self.request(reqwest::Method::DELETE, "/data/JSESSION"),
            "/data/JSESSION",
        )
        .await?;
        Ok(())
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigSource;
    use tempfile::tempdir;

    /// Connecting to a port nothing listens on is a connection-level
    /// failure, which the probe treats as retryable.
    #[tokio::test]
    async fn test_connect_refused_is_unreachable() {
        let home = tempdir().unwrap();
        let mut cfg =
            Config::load_with_home(home.path(), ConfigSource::Name("default".into())).unwrap();
        // Reserve a port and release it so the connect is refused.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        cfg.xnat_port = listener.local_addr().unwrap().port().to_string();
        drop(listener);

        let err = XnatSession::connect(&cfg).await.unwrap_err();
        let classified = err.downcast_ref::<Xnat4testsError>().unwrap();
        assert!(
            matches!(classified, Xnat4testsError::XnatUnreachable { .. }),
            "unexpected classification: {classified:?}"
        );
        assert!(classified.is_retryable());
    }
}
