//! The Install Cache (`spec.md` §4.6): the on-disk `v0` layout, the
//! atomic-install protocol, and lookup/clear operations. `avm` has no
//! analogous shared cache (each tool directory is tag-addressed, not
//! content-addressed), so the layout itself is new; the download/extract
//! steps it delegates to reuse [`crate::io`] exactly as `avm`'s
//! `DownloadExtractState` reuses `blocking::extract_archive`.

pub mod lock;

use std::path::{Path, PathBuf};

use crate::archive::{ArchiveType, FileHashes, InstallKey};
use crate::error::InstallError;
use crate::io;
use crate::{HttpClient, Status};
use lock::FileLock;

const SCHEMA: &str = "v0";

/// Path builder over the cache root `R` (`spec.md` §3's `CacheLayout`).
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: PathBuf) -> CacheLayout {
        CacheLayout { root }
    }

    fn versioned(&self) -> PathBuf {
        self.root.join(SCHEMA)
    }

    pub fn jdks_dir(&self) -> PathBuf {
        self.versioned().join("jdks")
    }

    pub fn jdk_root(&self, key: InstallKey) -> PathBuf {
        self.jdks_dir().join(key.to_hex())
    }

    pub fn jdk_partial(&self, key: InstallKey) -> PathBuf {
        self.jdks_dir().join(format!("{key}.partial"))
    }

    pub fn jdk_lock(&self, key: InstallKey) -> PathBuf {
        self.jdks_dir().join(format!("{key}.lock"))
    }

    pub fn pkgs_dir(&self) -> PathBuf {
        self.versioned().join("pkgs")
    }

    pub fn pkg_root(&self, key: InstallKey) -> PathBuf {
        self.pkgs_dir().join(key.to_hex())
    }

    pub fn pkg_partial(&self, key: InstallKey) -> PathBuf {
        self.pkgs_dir().join(format!("{key}.partial"))
    }

    pub fn pkg_lock(&self, key: InstallKey) -> PathBuf {
        self.pkgs_dir().join(format!("{key}.lock"))
    }

    pub fn index_root(&self) -> PathBuf {
        self.versioned().join("index")
    }

    pub fn index_dir(&self, url_hash: &str) -> PathBuf {
        self.index_root().join(url_hash)
    }

    pub fn index_json(&self, url_hash: &str) -> PathBuf {
        self.index_dir(url_hash).join("index.json")
    }

    pub fn index_fetched_at(&self, url_hash: &str) -> PathBuf {
        self.index_dir(url_hash).join("fetched-at")
    }

    pub fn index_lock(&self, url_hash: &str) -> PathBuf {
        self.index_root().join(format!("{url_hash}.lock"))
    }

    pub fn files_dir(&self) -> PathBuf {
        self.versioned().join("files")
    }

    pub fn file_dir(&self, name_hash: &str) -> PathBuf {
        self.files_dir().join(name_hash)
    }

    pub fn file_partial(&self, name_hash: &str) -> PathBuf {
        self.files_dir().join(format!("{name_hash}.partial"))
    }

    pub fn file_lock(&self, name_hash: &str) -> PathBuf {
        self.files_dir().join(format!("{name_hash}.lock"))
    }
}

/// `clear_cache` scopes from `spec.md` §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    Jdks,
    Index,
    Files,
    Pkgs,
    All,
}

pub struct InstallCache {
    layout: CacheLayout,
}

impl InstallCache {
    pub fn new(layout: CacheLayout) -> InstallCache {
        InstallCache { layout }
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Shared protocol behind `cache_jdk`/`cache_package` (`spec.md`
    /// §4.6): stat, lock, re-stat, clear stale `.partial`, fetch, extract
    /// with the strip-one rule, publish, unlock.
    #[allow(clippy::too_many_arguments)]
    pub async fn install_archive(
        &self,
        client: &HttpClient,
        url: &str,
        archive_type: ArchiveType,
        hashes: &FileHashes,
        root: &Path,
        partial: &Path,
        lock_path: &Path,
        mut on_status: impl FnMut(Status) + Send,
    ) -> Result<PathBuf, InstallError> {
        if root.exists() {
            return Ok(root.to_path_buf());
        }

        let _lock = {
            let lock_path = lock_path.to_path_buf();
            crate::spawn_blocking(move || FileLock::acquire(&lock_path).map_err(Into::into))
                .await
                .map_err(InstallError::from)?
        };

        if root.exists() {
            return Ok(root.to_path_buf());
        }

        if partial.exists() {
            let partial = partial.to_path_buf();
            crate::spawn_blocking(move || Ok(std::fs::remove_dir_all(&partial)?))
                .await
                .map_err(InstallError::from)?;
        }

        let result = self
            .do_install_archive(client, url, archive_type, hashes, root, partial, &mut on_status)
            .await;

        let partial = partial.to_path_buf();
        let _ = crate::spawn_blocking(move || Ok(std::fs::remove_dir_all(&partial)?)).await;
        result
    }

    async fn do_install_archive(
        &self,
        client: &HttpClient,
        url: &str,
        archive_type: ArchiveType,
        hashes: &FileHashes,
        root: &Path,
        partial: &Path,
        on_status: &mut (dyn FnMut(Status) + Send),
    ) -> Result<PathBuf, InstallError> {
        let archive_path = io::download(client, url, partial, &mut *on_status).await?;

        on_status(Status::InProgress {
            name: "Extracting".into(),
            progress_ratio: None,
        });

        let hashes = hashes.clone();
        let root = root.to_path_buf();
        let partial = partial.to_path_buf();
        crate::spawn_blocking(move || {
            io::verify_hashes(&hashes, &archive_path)?;

            let extracted_dir = partial.join("extracted");
            io::extract::extract(archive_type, &archive_path, &extracted_dir)?;
            let lifted = io::extract::strip_one(&extracted_dir)?;

            if let Some(parent) = root.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::rename(&lifted, &root)?;
            Ok(root)
        })
        .await
        .map_err(InstallError::from)
    }

    /// Shared protocol behind `cache_file`: downloads a single artifact
    /// (no extraction) under `files/<nameHash>/<filename>`.
    pub async fn install_file(
        &self,
        client: &HttpClient,
        url: &str,
        filename: &str,
        hashes: &FileHashes,
        name_hash: &str,
        mut on_status: impl FnMut(Status) + Send,
    ) -> Result<PathBuf, InstallError> {
        let dir = self.layout.file_dir(name_hash);
        let final_path = dir.join(filename);
        if final_path.exists() {
            return Ok(final_path);
        }

        let lock_path = self.layout.file_lock(name_hash);
        let _lock = {
            let lock_path = lock_path.clone();
            crate::spawn_blocking(move || FileLock::acquire(&lock_path).map_err(Into::into))
                .await
                .map_err(InstallError::from)?
        };

        if final_path.exists() {
            return Ok(final_path);
        }

        let partial = self.layout.file_partial(name_hash);
        if partial.exists() {
            let cleanup = partial.clone();
            crate::spawn_blocking(move || Ok(std::fs::remove_dir_all(&cleanup)?))
                .await
                .map_err(InstallError::from)?;
        }

        let result: Result<PathBuf, InstallError> = async {
            let archive_path = io::download(client, url, &partial, &mut on_status).await?;

            let hashes = hashes.clone();
            let dir = dir.clone();
            let final_path = final_path.clone();
            crate::spawn_blocking(move || {
                io::verify_hashes(&hashes, &archive_path)?;
                std::fs::create_dir_all(&dir)?;
                std::fs::rename(&archive_path, &final_path)?;
                Ok(final_path)
            })
            .await
            .map_err(InstallError::from)
        }
        .await;

        let cleanup = partial.clone();
        let _ = crate::spawn_blocking(move || Ok(std::fs::remove_dir_all(&cleanup)?)).await;
        result
    }

    /// `listInstalled()` (`spec.md` §4.6): enumerates `jdks/`, skipping
    /// `.partial`/`.lock` siblings.
    pub fn list_installed(&self) -> std::io::Result<Vec<(InstallKey, PathBuf)>> {
        list_keyed_dirs(&self.layout.jdks_dir())
    }

    pub fn list_installed_packages(&self) -> std::io::Result<Vec<(InstallKey, PathBuf)>> {
        list_keyed_dirs(&self.layout.pkgs_dir())
    }

    /// `clearCache(scope)`: best-effort recursive delete, refusing to
    /// remove an install whose lock is held.
    pub fn clear(&self, scope: CacheScope) -> Vec<(PathBuf, std::io::Error)> {
        match scope {
            CacheScope::All => {
                let mut errors = Vec::new();
                for s in [
                    CacheScope::Jdks,
                    CacheScope::Index,
                    CacheScope::Files,
                    CacheScope::Pkgs,
                ] {
                    errors.extend(self.clear(s));
                }
                errors
            }
            CacheScope::Jdks => clear_keyed_scope(&self.layout.jdks_dir()),
            CacheScope::Pkgs => clear_keyed_scope(&self.layout.pkgs_dir()),
            CacheScope::Index => clear_flat_scope(&self.layout.index_root()),
            CacheScope::Files => clear_flat_scope(&self.layout.files_dir()),
        }
    }
}

fn list_keyed_dirs(dir: &Path) -> std::io::Result<Vec<(InstallKey, PathBuf)>> {
    let mut out = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
        Err(e) => return Err(e),
    };
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(".partial") || name.ends_with(".lock") {
            continue;
        }
        if let Some(key) = InstallKey::from_hex(&name) {
            if entry.path().is_dir() {
                out.push((key, entry.path()));
            }
        }
    }
    Ok(out)
}

/// Clears a directory of `<key>/`, `<key>.partial/`, `<key>.lock` triples,
/// skipping any `<key>` whose lock is currently held.
fn clear_keyed_scope(dir: &Path) -> Vec<(PathBuf, std::io::Error)> {
    let mut errors = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return errors,
        Err(e) => {
            errors.push((dir.to_path_buf(), e));
            return errors;
        }
    };

    let mut keys: Vec<String> = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        let bare = name
            .strip_suffix(".partial")
            .or_else(|| name.strip_suffix(".lock"))
            .unwrap_or(&name);
        if InstallKey::from_hex(bare).is_some() && !keys.contains(&bare.to_string()) {
            keys.push(bare.to_string());
        }
    }

    for key in keys {
        let lock_path = dir.join(format!("{key}.lock"));
        match lock::is_locked(&lock_path) {
            Ok(true) => continue,
            Ok(false) => {}
            Err(e) => {
                errors.push((lock_path, e));
                continue;
            }
        }

        for suffix_path in [
            dir.join(&key),
            dir.join(format!("{key}.partial")),
            dir.join(format!("{key}.lock")),
        ] {
            if let Err(e) = remove_path(&suffix_path) {
                errors.push((suffix_path, e));
            }
        }
    }

    errors
}

fn clear_flat_scope(dir: &Path) -> Vec<(PathBuf, std::io::Error)> {
    let mut errors = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return errors,
        Err(e) => {
            errors.push((dir.to_path_buf(), e));
            return errors;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if let Err(e) = remove_path(&path) {
            errors.push((path, e));
        }
    }
    errors
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_builds_v0_paths() {
        let layout = CacheLayout::new(PathBuf::from("/cache"));
        let key = InstallKey::for_url(ArchiveType::Tgz, "https://example.com/a.tar.gz");
        assert_eq!(
            layout.jdk_root(key),
            PathBuf::from(format!("/cache/v0/jdks/{key}"))
        );
        assert_eq!(
            layout.jdk_lock(key),
            PathBuf::from(format!("/cache/v0/jdks/{key}.lock"))
        );
        assert_eq!(layout.index_json("abc"), PathBuf::from("/cache/v0/index/abc/index.json"));
    }

    #[test]
    fn list_installed_skips_partial_and_lock_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path().to_path_buf());
        let key = InstallKey::for_url(ArchiveType::Tgz, "https://example.com/a.tar.gz");

        std::fs::create_dir_all(layout.jdk_root(key)).unwrap();
        std::fs::create_dir_all(layout.jdk_partial(key)).unwrap();
        std::fs::write(layout.jdk_lock(key), b"").unwrap();

        let cache = InstallCache::new(layout);
        let installed = cache.list_installed().unwrap();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].0, key);
    }

    #[test]
    fn clear_jdks_removes_key_triple() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path().to_path_buf());
        let key = InstallKey::for_url(ArchiveType::Zip, "https://example.com/a.zip");

        std::fs::create_dir_all(layout.jdk_root(key)).unwrap();
        std::fs::write(layout.jdk_lock(key), b"").unwrap();

        let cache = InstallCache::new(layout.clone());
        let errors = cache.clear(CacheScope::Jdks);
        assert!(errors.is_empty());
        assert!(!layout.jdk_root(key).exists());
        assert!(!layout.jdk_lock(key).exists());
    }

    #[test]
    fn clear_jdks_skips_locked_install() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path().to_path_buf());
        let key = InstallKey::for_url(ArchiveType::Zip, "https://example.com/b.zip");

        std::fs::create_dir_all(layout.jdk_root(key)).unwrap();
        let held = FileLock::acquire(&layout.jdk_lock(key)).unwrap();

        let cache = InstallCache::new(layout.clone());
        let errors = cache.clear(CacheScope::Jdks);
        assert!(errors.is_empty());
        assert!(layout.jdk_root(key).exists());

        drop(held);
    }
}
