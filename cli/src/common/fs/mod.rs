//! # Xnat4tests Mount Directory Provisioning
//!
//! File: cli/src/common/fs/mod.rs
//!
//! ## Overview
//!
//! Host-side preparation of the directories mounted into the test-XNAT
//! container. A fresh container provisions a fresh internal Postgres
//! database, so unless the caller asks to keep them, the previous run's
//! mount tree is wiped first. Stale archive contents would otherwise be out
//! of sync with the new database.
//!
//! Recreated directories get mode `rwxrwxr-x` plus the set-group-ID bit so
//! files created inside the container by a different UID inherit the host
//! group and stay accessible from the host.
//!
use crate::core::config::Config;
use crate::core::error::Result;
use anyhow::Context;
use std::fs;
use std::io::ErrorKind;
use tracing::{debug, info};

#[cfg(unix)]
const MOUNT_DIR_MODE: u32 = 0o2775; // rwxrwxr-x + setgid

/// Wipes (unless `keep_mounts`) and recreates every configured mount
/// directory under the XNAT root.
pub fn prepare_mount_dirs(cfg: &Config, keep_mounts: bool) -> Result<()> {
    if !keep_mounts {
        info!(
            "Clearing previous XNAT root directory '{}'",
            cfg.xnat_root_dir.display()
        );
        match fs::remove_dir_all(&cfg.xnat_root_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {} // nothing from a previous run
            Err(e) => {
                return Err(e).with_context(|| {
                    format!(
                        "Failed to clear XNAT root directory '{}'",
                        cfg.xnat_root_dir.display()
                    )
                });
            }
        }
    }

    for mount in &cfg.xnat_mnt_dirs {
        let dpath = mount.host_path(&cfg.xnat_root_dir);
        debug!("Creating mount directory '{}'", dpath.display());
        fs::create_dir_all(&dpath)
            .with_context(|| format!("Failed to create mount directory '{}'", dpath.display()))?;
        set_mount_dir_mode(&dpath)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mount_dir_mode(dpath: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dpath, fs::Permissions::from_mode(MOUNT_DIR_MODE)).with_context(|| {
        format!(
            "Failed to set permissions on mount directory '{}'",
            dpath.display()
        )
    })
}

#[cfg(not(unix))]
fn set_mount_dir_mode(_dpath: &std::path::Path) -> Result<()> {
    Ok(())
}
