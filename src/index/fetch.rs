//! The Index Fetcher (`spec.md` §4.3): resolves `indexURL` (a local path
//! or a remote URL) to the raw JSON document, caching remote fetches in
//! the Install Cache under a TTL. Grounded on the same
//! lock-then-recheck-then-fetch shape `avm`'s install protocol uses,
//! applied here to one shared index file instead of a per-tag directory.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha1::{Digest, Sha1};

use crate::cache::lock::FileLock;
use crate::cache::CacheLayout;
use crate::error::InstallError;
use crate::HttpClient;

/// `sha1(indexURL)`, used as the cache subdirectory name. The exact
/// algorithm is unspecified by the source system as long as it is
/// stable; SHA-1 keeps this consistent with [`crate::archive::InstallKey`].
pub fn url_hash(index_url: &str) -> String {
    hex::encode(Sha1::digest(index_url.as_bytes()))
}

fn is_local_path(index_url: &str) -> bool {
    !index_url.contains("://")
}

/// Returns the raw index JSON bytes for `index_url`. Local paths are read
/// directly with no caching; remote URLs are fetched through the `v0`
/// index cache with the given TTL (`ttl_secs == 0` forces an
/// unconditional fetch). Filesystem and lock operations run through
/// [`crate::spawn_blocking`], matching `spec.md` §5's note that blocking
/// work stays off the single-threaded reactor.
pub async fn fetch_index(
    client: &HttpClient,
    index_url: &str,
    ttl_secs: u64,
    layout: &CacheLayout,
) -> Result<Vec<u8>, InstallError> {
    if is_local_path(index_url) {
        let path = std::path::PathBuf::from(index_url);
        return crate::spawn_blocking(move || Ok(std::fs::read(&path)?))
            .await
            .map_err(InstallError::from);
    }

    let hash = url_hash(index_url);
    let index_path = layout.index_json(&hash);
    let fetched_at_path = layout.index_fetched_at(&hash);

    if ttl_secs > 0 {
        if let Some(bytes) = read_fresh(&index_path, &fetched_at_path, ttl_secs).await? {
            return Ok(bytes);
        }
    }

    let lock_path = layout.index_lock(&hash);
    let _lock = {
        let lock_path = lock_path.clone();
        crate::spawn_blocking(move || FileLock::acquire(&lock_path).map_err(Into::into))
            .await
            .map_err(InstallError::from)?
    };

    if ttl_secs > 0 {
        if let Some(bytes) = read_fresh(&index_path, &fetched_at_path, ttl_secs).await? {
            return Ok(bytes);
        }
    }

    let response =
        client
            .get(index_url)
            .send()
            .await
            .map_err(|e| InstallError::Network {
                url: index_url.to_string(),
                source: e,
            })?;
    let status = response.status();
    if !status.is_success() {
        return Err(InstallError::BadStatus {
            url: index_url.to_string(),
            status: status.as_u16(),
        });
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| InstallError::Network {
            url: index_url.to_string(),
            source: e,
        })?
        .to_vec();

    let write_bytes = bytes.clone();
    crate::spawn_blocking(move || {
        if let Some(parent) = index_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = index_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &write_bytes)?;
        std::fs::rename(&tmp_path, &index_path)?;
        std::fs::write(&fetched_at_path, epoch_now().to_string())?;
        Ok(())
    })
    .await
    .map_err(InstallError::from)?;

    Ok(bytes)
}

async fn read_fresh(
    index_path: &std::path::Path,
    fetched_at_path: &std::path::Path,
    ttl_secs: u64,
) -> Result<Option<Vec<u8>>, InstallError> {
    let index_path = index_path.to_path_buf();
    let fetched_at_path = fetched_at_path.to_path_buf();
    crate::spawn_blocking(move || try_read_fresh(&index_path, &fetched_at_path, ttl_secs))
        .await
        .map_err(InstallError::from)
}

fn try_read_fresh(
    index_path: &std::path::Path,
    fetched_at_path: &std::path::Path,
    ttl_secs: u64,
) -> anyhow::Result<Option<Vec<u8>>> {
    let fetched_at = match std::fs::read_to_string(fetched_at_path) {
        Ok(s) => s.trim().parse::<u64>().unwrap_or(0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let age = epoch_now().saturating_sub(fetched_at);
    if age < ttl_secs {
        match std::fs::read(index_path) {
            Ok(bytes) => return Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(None)
}

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_hash_is_stable_sha1() {
        let h1 = url_hash("https://example.com/index.json");
        let h2 = url_hash("https://example.com/index.json");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 40);
    }

    #[test]
    fn local_path_detection() {
        assert!(is_local_path("/tmp/index.json"));
        assert!(is_local_path("relative/index.json"));
        assert!(!is_local_path("https://example.com/index.json"));
    }

    #[tokio::test]
    async fn fetch_index_reads_local_path_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, b"{}").unwrap();

        let client = HttpClient::new();
        let layout = CacheLayout::new(dir.path().join("cache"));
        let bytes = fetch_index(&client, path.to_str().unwrap(), 86400, &layout)
            .await
            .unwrap();
        assert_eq!(bytes, b"{}");
    }

    #[test]
    fn try_read_fresh_returns_none_when_stale() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path().to_path_buf());
        let hash = "deadbeef";
        std::fs::create_dir_all(layout.index_dir(hash)).unwrap();
        std::fs::write(layout.index_json(hash), b"{}").unwrap();
        std::fs::write(layout.index_fetched_at(hash), "1").unwrap();

        let result = try_read_fresh(&layout.index_json(hash), &layout.index_fetched_at(hash), 10)
            .unwrap();
        assert!(result.is_none());
    }
}
