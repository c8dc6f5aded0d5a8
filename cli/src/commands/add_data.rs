//! # Xnat4tests Sample Data Command
//!
//! File: cli/src/commands/add_data.rs
//!
//! ## Overview
//!
//! Seeds sample datasets into a running XNAT instance so test regimes have
//! something to work against. The only dataset currently shipped is
//! `dummydicom`: a project/subject/session hierarchy holding three MR scans
//! (t1w, dwi, fmap) of synthesized DICOM files.
//!
//! Unlike `start`, seeding makes a single connection attempt. If the
//! instance is not up, the error tells the user to run `start` rather than
//! sitting in the readiness probe's retry loop.
//!
use crate::common::xnat::XnatSession;
use crate::core::config::{Config, ConfigSource};
use crate::core::error::Result;
use anyhow::{anyhow, Context};
use tracing::{info, instrument};

/// Identifiers used by the `dummydicom` dataset.
const DUMMY_PROJECT: &str = "dummydicomproject";
const DUMMY_SUBJECT: &str = "dummydicomsubject";
const DUMMY_SESSION: &str = "dummydicomsession";

/// The MR series synthesized for the `dummydicom` dataset, with the number
/// of instances generated per series.
const DUMMY_SERIES: &[(&str, u16)] = &[("t1w", 2), ("dwi", 2), ("fmap", 2)];

/// Handles the `add-data` subcommand.
pub async fn handle_add_data(source: ConfigSource, dataset: &str) -> Result<()> {
    let cfg = Config::load(source)?;
    add_data(&cfg, dataset).await
}

/// Uploads the named sample dataset into the configured XNAT instance.
#[instrument(skip(cfg), fields(uri = %cfg.xnat_uri()))]
pub async fn add_data(cfg: &Config, dataset: &str) -> Result<()> {
    let profile_hint = cfg
        .loaded_from
        .as_ref()
        .map(|p| format!(" --config {}", p.display()))
        .unwrap_or_default();

    let session = XnatSession::connect(cfg).await.with_context(|| {
        format!(
            "XNAT instance not running at {}, run `xnat4tests{} start` to launch it",
            cfg.xnat_uri(),
            profile_hint
        )
    })?;

    let result = upload_dataset(&session, dataset).await;
    let logout = session.logout().await;
    result?;
    logout
}

/// Dispatches a dataset name onto its uploader. Unknown names fail with the
/// list of available datasets.
pub(crate) async fn upload_dataset(session: &XnatSession, dataset: &str) -> Result<()> {
    match dataset {
        "dummydicom" => upload_dummy_dicom(session).await,
        other => Err(anyhow!(
            "Unrecognised dataset '{other}', available datasets: dummydicom"
        )),
    }
}

/// Creates the dummydicom project/subject/session hierarchy and uploads the
/// synthesized scan files, one scan resource per series.
async fn upload_dummy_dicom(session: &XnatSession) -> Result<()> {
    info!(
        "Uploading dummydicom dataset into project '{}'.",
        DUMMY_PROJECT
    );

    session
        .put(&format!("/data/archive/projects/{DUMMY_PROJECT}"))
        .await?;
    session
        .put(&format!(
            "/data/archive/projects/{DUMMY_PROJECT}/subjects/{DUMMY_SUBJECT}\
             ?xsiType=xnat:subjectData&xnat:subjectData/label={DUMMY_SUBJECT}"
        ))
        .await?;
    session
        .put(&format!(
            "/data/archive/projects/{DUMMY_PROJECT}/subjects/{DUMMY_SUBJECT}\
             /experiments/{DUMMY_SESSION}?xsiType=xnat:mrSessionData"
        ))
        .await?;

    for (scan_id, (series, instances)) in DUMMY_SERIES.iter().enumerate() {
        let scan_path = format!(
            "/data/archive/projects/{DUMMY_PROJECT}/subjects/{DUMMY_SUBJECT}\
             /experiments/{DUMMY_SESSION}/scans/{scan_id}"
        );
        session
            .put(&format!(
                "{scan_path}?xsiType=xnat:mrScanData&xnat:mrScanData/type={series}"
            ))
            .await?;

        for instance in 0..*instances {
            let file = dummy_dicom_file(series, instance);
            session
                .put_file(
                    &format!(
                        "{scan_path}/resources/DICOM/files/{series}-{instance}.dcm\
                         ?format=DICOM&inbody=true"
                    ),
                    file,
                )
                .await?;
        }
    }

    info!("dummydicom dataset uploaded.");
    Ok(())
}

/// Synthesizes a minimal DICOM Part-10 file: the 128-byte preamble, the
/// `DICM` magic, a file-meta group declaring explicit-VR little-endian, and
/// a handful of dataset elements identifying the series and instance.
fn dummy_dicom_file(series: &str, instance: u16) -> Vec<u8> {
    // Explicit-VR little-endian transfer syntax.
    const TRANSFER_SYNTAX: &str = "1.2.840.10008.1.2.1";
    // MR Image Storage SOP class.
    const SOP_CLASS: &str = "1.2.840.10008.5.1.4.1.1.4";

    let sop_instance = format!("1.2.3.4.5.{}.{}", series.len(), instance);

    let mut out = vec![0u8; 128];
    out.extend_from_slice(b"DICM");

    // File-meta group, always explicit-VR little-endian.
    let mut meta = Vec::new();
    write_element(&mut meta, 0x0002, 0x0002, b"UI", SOP_CLASS.as_bytes());
    write_element(&mut meta, 0x0002, 0x0003, b"UI", sop_instance.as_bytes());
    write_element(&mut meta, 0x0002, 0x0010, b"UI", TRANSFER_SYNTAX.as_bytes());
    write_element(
        &mut out,
        0x0002,
        0x0000,
        b"UL",
        &(meta.len() as u32).to_le_bytes(),
    );
    out.extend_from_slice(&meta);

    write_element(&mut out, 0x0008, 0x0016, b"UI", SOP_CLASS.as_bytes());
    write_element(&mut out, 0x0008, 0x0018, b"UI", sop_instance.as_bytes());
    write_element(&mut out, 0x0008, 0x0060, b"CS", b"MR");
    write_element(&mut out, 0x0008, 0x103E, b"LO", series.as_bytes());
    write_element(
        &mut out,
        0x0020,
        0x0013,
        b"IS",
        (instance + 1).to_string().as_bytes(),
    );
    out
}

/// Appends one explicit-VR little-endian data element, padding odd-length
/// values as the format requires.
fn write_element(out: &mut Vec<u8>, group: u16, element: u16, vr: &[u8; 2], value: &[u8]) {
    let mut value = value.to_vec();
    if value.len() % 2 != 0 {
        // UI values pad with NUL, text values with space.
        value.push(if vr == b"UI" { 0x00 } else { b' ' });
    }
    out.extend_from_slice(&group.to_le_bytes());
    out.extend_from_slice(&element.to_le_bytes());
    out.extend_from_slice(vr);
    out.extend_from_slice(&(value.len() as u16).to_le_bytes());
    out.extend_from_slice(&value);
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_dicom_has_part10_header() {
        let file = dummy_dicom_file("t1w", 0);
        assert!(file.len() > 132);
        assert!(file[..128].iter().all(|&b| b == 0));
        assert_eq!(&file[128..132], b"DICM");
    }

    #[test]
    fn test_dummy_dicom_instances_differ() {
        assert_ne!(dummy_dicom_file("t1w", 0), dummy_dicom_file("t1w", 1));
        assert_ne!(dummy_dicom_file("t1w", 0), dummy_dicom_file("dwi", 0));
    }

    #[test]
    fn test_elements_are_even_length() {
        let mut buf = Vec::new();
        write_element(&mut buf, 0x0008, 0x0060, b"CS", b"MR");
        let before = buf.len();
        write_element(&mut buf, 0x0008, 0x103E, b"LO", b"odd"); // 3 bytes, padded
        assert_eq!(before % 2, 0);
        assert_eq!(buf.len() % 2, 0);
    }
}
