//! # Xnat4tests Readiness Probe
//!
//! File: cli/src/common/xnat/probe.rs
//!
//! ## Overview
//!
//! XNAT needs time to get itself ready after its container starts (webapp
//! deployment, first-boot database population). This module gates use of a
//! freshly started instance behind a bounded retry loop: up to
//! `connection_attempts` authenticated handshakes, sleeping
//! `connection_attempt_sleep` seconds between failures.
//!
//! Only the two boot-transient failure classes are retried: the endpoint
//! being unreachable, and the service answering but not ready. Anything else
//! (bad credentials, API errors) propagates immediately. When the budget is
//! exhausted the last transient failure is re-raised as the terminal error,
//! so the caller sees what the endpoint was actually doing. There is no
//! wall-clock deadline: the timeout is purely attempts times sleep.
//!
use crate::common::xnat::session::XnatSession;
use crate::core::config::Config;
use crate::core::error::{Result, Xnat4testsError};
use anyhow::anyhow;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Repeatedly attempts an authenticated connection until XNAT accepts it or
/// the attempt budget is exhausted. Returns the authenticated session.
#[instrument(skip(cfg), fields(uri = %cfg.xnat_uri()))]
pub async fn connect_with_retries(cfg: &Config) -> Result<XnatSession> {
    info!("Attempting to connect to {}", cfg.xnat_uri());

    for attempt in 1..=cfg.connection_attempts {
        match XnatSession::connect(cfg).await {
            Ok(session) => {
                info!("Connected to {} successfully.", cfg.xnat_uri());
                return Ok(session);
            }
            Err(e) => {
                let retryable = e
                    .downcast_ref::<Xnat4testsError>()
                    .is_some_and(Xnat4testsError::is_retryable);
                if !retryable || attempt == cfg.connection_attempts {
                    return Err(e);
                }
                debug!(
                    "Attempt {}/{} to connect to {} failed, retrying: {}",
                    attempt,
                    cfg.connection_attempts,
                    cfg.xnat_uri(),
                    e
                );
                tokio::time::sleep(Duration::from_secs(cfg.connection_attempt_sleep)).await;
            }
        }
    }

    // Only reachable with a zero-attempt budget.
    Err(anyhow!(Xnat4testsError::ConfigValidation(
        "connection_attempts must be at least 1".into()
    )))
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;
    use tokio::net::TcpListener;

    fn probe_config(home: &std::path::Path, port: u16, attempts: u32) -> Config {
        let mut cfg =
            Config::load_with_home(home, ConfigSource::Name("default".into())).unwrap();
        cfg.xnat_port = port.to_string();
        cfg.connection_attempts = attempts;
        cfg.connection_attempt_sleep = 0;
        cfg
    }

    /// An endpoint that accepts and immediately drops every connection is
    /// "unreachable" for the probe: it must try exactly the configured
    /// number of times and then surface the underlying connectivity error.
    #[tokio::test]
    async fn test_bounded_retry_exhaustion_attempts_exactly_n_times() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepts = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepts);
        let server = tokio::spawn(async move {
            loop {
                if let Ok((stream, _)) = listener.accept().await {
                    counter.fetch_add(1, Ordering::SeqCst);
                    drop(stream); // reset the connection before any response
                }
            }
        });

        let home = tempdir().unwrap();
        let cfg = probe_config(home.path(), port, 3);

        let err = connect_with_retries(&cfg).await.unwrap_err();
        server.abort();

        assert!(matches!(
            err.downcast_ref::<Xnat4testsError>(),
            Some(Xnat4testsError::XnatUnreachable { .. })
        ));
        assert_eq!(accepts.load(Ordering::SeqCst), 3);
    }

    /// A refused connection (nothing listening) is likewise retried to
    /// exhaustion and the last failure re-raised.
    #[tokio::test]
    async fn test_refused_connection_reraises_last_error() {
        // Reserve then free a port so nothing is listening on it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let home = tempdir().unwrap();
        let cfg = probe_config(home.path(), port, 2);

        let err = connect_with_retries(&cfg).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Xnat4testsError>(),
            Some(Xnat4testsError::XnatUnreachable { .. })
        ));
    }
}
