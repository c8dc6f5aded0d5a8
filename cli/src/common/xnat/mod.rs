//! # Xnat4tests XNAT Client
//!
//! File: cli/src/common/xnat/mod.rs
//!
//! ## Overview
//!
//! The client side of the fixture: an authenticated REST session
//! (`session`), the bounded-retry readiness probe gating use of a freshly
//! started instance (`probe`), and the one-shot post-launch configuration of
//! the XNAT container service (below).
//!
use crate::core::config::{Config, XNAT_INTERNAL_ROOT};
use crate::core::error::Result;
use serde_json::json;
use tracing::{debug, info, instrument};

pub mod probe;
pub mod session;

pub use probe::connect_with_retries;
pub use session::XnatSession;

/// Registers the local Docker socket with the XNAT container service so it
/// can launch sibling containers, including the path-translation pair that
/// maps the container-internal `/data/xnat` prefix to the host's resolved
/// root directory.
///
/// Runs only immediately after a fresh launch (never after a reuse), and
/// only when the instance reports the container service plugin installed.
/// Failures are not retried; they propagate to the caller of `start`.
#[instrument(skip(session, cfg))]
pub async fn configure_container_service(session: &XnatSession, cfg: &Config) -> Result<()> {
    let plugins = session.get_json("/xapi/plugins").await?;
    if plugins.get("containers").is_none() {
        debug!("Container service plugin not installed, skipping docker server setup.");
        return Ok(());
    }

    info!("Configuring docker server for container service");
    session
        .post_json(
            "/xapi/docker/server",
            &json!({
                "name": "Local socket",
                "host": "unix:///var/run/docker.sock",
                "cert-path": "",
                "swarm-mode": false,
                "path-translation-xnat-prefix": XNAT_INTERNAL_ROOT,
                "path-translation-docker-prefix": cfg.xnat_root_dir.to_string_lossy(),
                "pull-images-on-xnat-init": false,
                "container-user": "",
                "auto-cleanup": true,
                "swarm-constraints": [],
                "ping": true,
            }),
        )
        .await
}
