//! The Fetch-and-Extract Engine (`spec.md` §4.5): streaming download with
//! [`Status`] progress reporting in the shape `avm`'s
//! `DownloadExtractState` already uses, single-pass multi-algorithm hash
//! verification, and (in [`extract`]) path-safe archive unpacking.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::archive::FileHashes;
use crate::error::InstallError;
use crate::{HttpClient, Status};

pub mod extract;

/// Streams `url` into a file named `download` under `dest_dir`, invoking
/// `on_status` after every chunk. Respects cooperative cancellation
/// (`crate::is_cancelled`), stopping early without error so the caller's
/// temp directory cleanup runs normally.
pub async fn download(
    client: &HttpClient,
    url: &str,
    dest_dir: &Path,
    mut on_status: impl FnMut(Status),
) -> Result<PathBuf, InstallError> {
    std::fs::create_dir_all(dest_dir)?;
    let archive_path = dest_dir.join("download");

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| InstallError::Network {
            url: url.to_string(),
            source: e,
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(InstallError::BadStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let total_size = response.content_length();
    let mut downloaded_size = 0u64;
    let mut archive_file = File::create(&archive_path)?;

    on_status(Status::InProgress {
        name: "Downloading".into(),
        progress_ratio: total_size.map(|total| (0, total)),
    });

    while let Some(chunk) = response.chunk().await.map_err(|e| InstallError::Network {
        url: url.to_string(),
        source: e,
    })? {
        archive_file.write_all(&chunk)?;
        downloaded_size += chunk.len() as u64;
        on_status(Status::InProgress {
            name: "Downloading".into(),
            progress_ratio: total_size.map(|total| (downloaded_size, total)),
        });

        if crate::is_cancelled() {
            break;
        }
    }

    Ok(archive_path)
}

/// Verifies every hash the caller supplied against `path` in one streaming
/// pass (`spec.md` §4.5: "computes any hashes the caller supplied over the
/// downloaded bytes in a single pass"). No-op if `hashes.is_empty()`.
pub fn verify_hashes(hashes: &FileHashes, path: &Path) -> Result<(), InstallError> {
    if hashes.is_empty() {
        return Ok(());
    }

    let mut file = File::open(path)?;
    let mut sha1 = hashes.sha1.as_ref().map(|_| Sha1::new());
    let mut sha256 = hashes.sha256.as_ref().map(|_| Sha256::new());
    let mut sha512 = hashes.sha512.as_ref().map(|_| Sha512::new());
    let mut md5 = hashes.md5.as_ref().map(|_| Md5::new());

    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        if let Some(h) = sha1.as_mut() {
            h.update(&buf[..n]);
        }
        if let Some(h) = sha256.as_mut() {
            h.update(&buf[..n]);
        }
        if let Some(h) = sha512.as_mut() {
            h.update(&buf[..n]);
        }
        if let Some(h) = md5.as_mut() {
            h.update(&buf[..n]);
        }
    }

    if let (Some(h), Some(expected)) = (sha1, &hashes.sha1) {
        check_digest("sha1", expected, &h.finalize())?;
    }
    if let (Some(h), Some(expected)) = (sha256, &hashes.sha256) {
        check_digest("sha256", expected, &h.finalize())?;
    }
    if let (Some(h), Some(expected)) = (sha512, &hashes.sha512) {
        check_digest("sha512", expected, &h.finalize())?;
    }
    if let (Some(h), Some(expected)) = (md5, &hashes.md5) {
        check_digest("md5", expected, &h.finalize())?;
    }

    Ok(())
}

fn check_digest(what: &str, expected_hex: &str, actual: &[u8]) -> Result<(), InstallError> {
    let expected = hex::decode(expected_hex)
        .map_err(|_| InstallError::Archive(format!("malformed expected {what} hash")))?;
    if expected != actual {
        return Err(InstallError::HashMismatch {
            what: what.to_string(),
            expected: expected_hex.to_string(),
            actual: hex::encode(actual),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_hashes_accepts_matching_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"hello world").unwrap();

        let digest = Sha256::digest(b"hello world");
        let hashes = FileHashes {
            sha256: Some(hex::encode(digest).into()),
            ..Default::default()
        };
        assert!(verify_hashes(&hashes, &path).is_ok());
    }

    #[test]
    fn verify_hashes_rejects_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"hello world").unwrap();

        let hashes = FileHashes {
            sha256: Some("0".repeat(64).into()),
            ..Default::default()
        };
        let err = verify_hashes(&hashes, &path).unwrap_err();
        assert!(matches!(err, InstallError::HashMismatch { .. }));
    }

    #[test]
    fn empty_hashes_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"hello world").unwrap();
        assert!(verify_hashes(&FileHashes::default(), &path).is_ok());
    }
}
