//! # Xnat4tests Docker Image Operations
//!
//! File: cli/src/common/docker/images.rs
//!
//! ## Overview
//!
//! Everything image-side: existence/identity queries, pulling the registry
//! image, and building the test-XNAT image from the bundled build-context
//! template.
//!
//! ## Architecture
//!
//! - **`ensure_image`**: the build-if-missing entry point. When rebuilding it
//!   wipes the configured build directory, stages the embedded template files
//!   into it, tars the directory up, and calls the Docker build API with the
//!   profile's `build_args` uppercased to match the template's `ARG` names.
//!   When not rebuilding it checks for a local image and falls back to a full
//!   build if none exists; a missing image is never silently skipped.
//! - **`image_id`**: content identity of a local image, used by the container
//!   lifecycle to detect a running container bound to a stale image.
//! - **`pull_image`**: streams a registry pull to completion (used for the
//!   stock `registry` image, which is pulled rather than built).
//!
//! Build output is captured rather than streamed to stdout: a failed build
//! surfaces as `Xnat4testsError::ImageBuild` carrying the concatenated log,
//! which is what a test suite wants to see in its failure output.
//!
use crate::core::config::Config;
use crate::core::error::{Result, Xnat4testsError};
use anyhow::{anyhow, Context};
use bollard::image::{BuildImageOptions, CreateImageOptions};
use bollard::models::BuildInfo;
use futures_util::stream::StreamExt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use super::connect::connect_docker;

/// Files staged into the build-context directory before every rebuild.
/// Embedded at compile time so the installed binary is self-contained.
const BUILD_CONTEXT_FILES: &[(&str, &str)] = &[
    ("Dockerfile", include_str!("../../../docker-src/Dockerfile")),
    (
        "xnat-conf.properties",
        include_str!("../../../docker-src/xnat-conf.properties"),
    ),
    ("startup.sh", include_str!("../../../docker-src/startup.sh")),
];

/// Checks if a Docker image exists locally by name or ID.
#[instrument(skip(name), fields(image = %name))]
pub async fn image_exists(name: &str) -> Result<bool> {
    Ok(image_id(name).await?.is_some())
}

/// Returns the content ID of a local image, or `None` if no such image.
#[instrument(skip(name), fields(image = %name))]
pub async fn image_id(name: &str) -> Result<Option<String>> {
    let docker = connect_docker().await?;
    match docker.inspect_image(name).await {
        Ok(details) => Ok(details.id),
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {
            debug!("Image '{}' not found locally.", name);
            Ok(None)
        }
        Err(e) => Err(anyhow!(Xnat4testsError::DockerApi { source: e })
            .context(format!("Failed to inspect image '{}'", name))),
    }
}

/// Pulls an image from its default registry, consuming the progress stream
/// to completion. Used for the stock registry image.
#[instrument(skip(name), fields(image = %name))]
pub async fn pull_image(name: &str) -> Result<()> {
    let docker = connect_docker().await?;
    info!("Pulling image '{}'...", name);
    let options = Some(CreateImageOptions {
        from_image: name.to_string(),
        ..Default::default()
    });
    let mut pull_stream = docker.create_image(options, None, None);
    while let Some(progress) = pull_stream.next().await {
        let info = progress
            .map_err(|e| anyhow!(Xnat4testsError::DockerApi { source: e }))
            .with_context(|| format!("Failed to pull image '{}'", name))?;
        if let Some(status) = info.status {
            debug!("Pull status: {}", status);
        }
    }
    info!("Pulled image '{}' successfully.", name);
    Ok(())
}

/// Ensures the configured test-XNAT image exists, rebuilding it from the
/// bundled template unless `rebuild` is false and a matching image is
/// already present locally.
#[instrument(skip(cfg, rebuild), fields(image = %cfg.docker_image))]
pub async fn ensure_image(cfg: &Config, rebuild: bool) -> Result<()> {
    if !rebuild {
        if image_exists(&cfg.docker_image).await? {
            info!("Found existing image '{}', reusing.", cfg.docker_image);
            return Ok(());
        }
        // Reuse was requested but there is nothing to reuse.
        warn!(
            "Image '{}' not found locally, building it despite --reuse-build.",
            cfg.docker_image
        );
    }

    stage_build_context(&cfg.docker_build_dir)?;
    info!(
        "Building image '{}' in '{}'...",
        cfg.docker_image,
        cfg.docker_build_dir.display()
    );

    let docker = connect_docker().await?;
    let tar_gz = create_context_tar(&cfg.docker_build_dir)
        .context("Failed to create build context tarball")?;

    let build_options = BuildImageOptions {
        dockerfile: "Dockerfile".to_string(),
        t: cfg.docker_image.clone(),
        rm: true,
        buildargs: cfg.build_args.as_docker_args(),
        ..Default::default()
    };

    let mut build_stream = docker.build_image(build_options, None, Some(tar_gz.into()));

    // Accumulate the log as we go so a failure can carry the whole build
    // transcript, not just the final error line.
    let mut build_log = String::new();
    while let Some(event) = build_stream.next().await {
        match event {
            Ok(BuildInfo {
                stream: Some(line), ..
            }) => {
                debug!("{}", line.trim_end());
                build_log.push_str(&line);
            }
            Ok(BuildInfo {
                error: Some(err),
                error_detail,
                ..
            }) => {
                let detail = error_detail.and_then(|d| d.message).unwrap_or_default();
                build_log.push_str(&err);
                if !detail.is_empty() {
                    build_log.push('\n');
                    build_log.push_str(&detail);
                }
                return Err(anyhow!(Xnat4testsError::ImageBuild {
                    image: cfg.docker_image.clone(),
                    log: build_log,
                }));
            }
            Ok(_) => {} // status/progress chatter
            Err(e) => {
                return Err(anyhow!(Xnat4testsError::DockerApi { source: e })
                    .context("Failed to process image build stream"));
            }
        }
    }

    info!("Built image '{}' successfully.", cfg.docker_image);
    Ok(())
}

/// Stages the embedded build-context template into `build_dir`, removing any
/// stale copy from a previous run first.
fn stage_build_context(build_dir: &Path) -> Result<()> {
    if build_dir.exists() {
        fs::remove_dir_all(build_dir).with_context(|| {
            format!(
                "Failed to remove stale build directory '{}'",
                build_dir.display()
            )
        })?;
    }
    fs::create_dir_all(build_dir).with_context(|| {
        format!("Failed to create build directory '{}'", build_dir.display())
    })?;
    for (name, content) in BUILD_CONTEXT_FILES {
        fs::write(build_dir.join(name), content)
            .with_context(|| format!("Failed to stage build context file '{name}'"))?;
    }
    Ok(())
}

/// Creates a gzipped TAR archive in memory containing the contents of the
/// build-context directory, as the Docker build API expects.
fn create_context_tar(context_path: &Path) -> Result<Vec<u8>> {
    let mut tar_gz_bytes = Vec::new();
    let enc = flate2::write::GzEncoder::new(&mut tar_gz_bytes, flate2::Compression::default());
    let mut tar_builder = tar::Builder::new(enc);

    tar_builder
        .append_dir_all(".", context_path)
        .with_context(|| {
            format!(
                "Failed to add directory '{}' contents to the tar archive",
                context_path.display()
            )
        })?;

    let encoder = tar_builder
        .into_inner()
        .context("Failed to finalize tar archive structure")?;
    encoder
        .finish()
        .context("Failed to finish gzip compression stream")?;

    Ok(tar_gz_bytes)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tar::Archive;
    use tempfile::tempdir;

    #[test]
    fn test_stage_build_context_writes_template() {
        let tmp = tempdir().unwrap();
        let build_dir = tmp.path().join("build");

        stage_build_context(&build_dir).unwrap();

        let dockerfile = fs::read_to_string(build_dir.join("Dockerfile")).unwrap();
        assert!(dockerfile.contains("ARG XNAT_VER"));
        assert!(dockerfile.contains("ARG JAVA_MX"));
        assert!(build_dir.join("xnat-conf.properties").is_file());
        assert!(build_dir.join("startup.sh").is_file());
    }

    #[test]
    fn test_stage_build_context_replaces_stale_copy() {
        let tmp = tempdir().unwrap();
        let build_dir = tmp.path().join("build");
        fs::create_dir_all(&build_dir).unwrap();
        fs::write(build_dir.join("leftover.txt"), "stale").unwrap();

        stage_build_context(&build_dir).unwrap();

        assert!(!build_dir.join("leftover.txt").exists());
        assert!(build_dir.join("Dockerfile").is_file());
    }

    #[test]
    fn test_create_context_tar_contains_staged_files() {
        let tmp = tempdir().unwrap();
        let build_dir = tmp.path().join("build");
        stage_build_context(&build_dir).unwrap();

        let tar_data = create_context_tar(&build_dir).unwrap();
        assert!(!tar_data.is_empty());

        let mut archive = Archive::new(GzDecoder::new(tar_data.as_slice()));
        let mut found = std::collections::HashSet::new();
        for entry in archive.entries().unwrap() {
            let entry = entry.unwrap();
            found.insert(entry.path().unwrap().to_string_lossy().into_owned());
        }
        assert!(found.contains("Dockerfile"));
        assert!(found.contains("xnat-conf.properties"));
        assert!(found.contains("startup.sh"));
    }
}
