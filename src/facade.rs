//! The Public Operations Façade (`spec.md` §4.7): `java_home`, `java_env`,
//! `cache_jdk`, `cache_file`, `cache_package`, `list_vendors`,
//! `list_jdks`, `clear_cache`, composed from the Index Fetcher, Index
//! Model, Resolver, and Install Cache. Thin by design, per `spec.md` §9.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use smol_str::SmolStr;

use crate::archive::{ArchiveType, FileHashes, InstallKey};
use crate::cache::{CacheLayout, CacheScope, InstallCache};
use crate::config::ResolvedConfig;
use crate::error::{CjdkError, ConfigError};
use crate::index::{self, IndexModel};
use crate::{resolver, HttpClient, Status};

pub struct Facade {
    client: HttpClient,
    cache: InstallCache,
}

impl Facade {
    pub fn new(client: HttpClient, cache_dir: PathBuf) -> Facade {
        Facade {
            client,
            cache: InstallCache::new(CacheLayout::new(cache_dir)),
        }
    }

    pub fn layout(&self) -> &CacheLayout {
        self.cache.layout()
    }

    async fn fetch_index_model(&self, config: &ResolvedConfig) -> Result<IndexModel, CjdkError> {
        let bytes = index::fetch::fetch_index(
            &self.client,
            &config.index_url,
            config.index_ttl_secs,
            self.cache.layout(),
        )
        .await?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| crate::error::InstallError::Archive(e.to_string()))?;
        let model = IndexModel::build(&value).map_err(crate::error::InstallError::from)?;
        Ok(model)
    }

    /// Resolves `config` against the index and ensures the JDK is
    /// installed, returning the Java home. Shared by [`Facade::java_home`]
    /// and [`Facade::cache_jdk`] — the "two operations, one core" design
    /// from `spec.md` §9.
    pub async fn cache_jdk(
        &self,
        config: &ResolvedConfig,
        mut on_status: impl FnMut(Status) + Send,
    ) -> Result<PathBuf, CjdkError> {
        let index = self.fetch_index_model(config).await?;
        let descriptor = resolver::resolve(
            &config.vendor,
            &config.version_expr,
            &config.os,
            &config.arch,
            &index,
        )?;

        let key = InstallKey::for_descriptor(&descriptor);
        let layout = self.cache.layout();
        let mut hashes = FileHashes::default();
        hashes.sha1 = descriptor.sha1.clone();

        let path = self
            .cache
            .install_archive(
                &self.client,
                &descriptor.url,
                descriptor.archive_type,
                &hashes,
                &layout.jdk_root(key),
                &layout.jdk_partial(key),
                &layout.jdk_lock(key),
                &mut on_status,
            )
            .await?;
        Ok(path)
    }

    pub async fn java_home(
        &self,
        config: &ResolvedConfig,
        on_status: impl FnMut(Status) + Send,
    ) -> Result<PathBuf, CjdkError> {
        self.cache_jdk(config, on_status).await
    }

    /// Scoped mutation of `JAVA_HOME`/`PATH`, restored when the returned
    /// guard is dropped (`spec.md` §5 `java_env` / §8 property 6).
    pub async fn java_env(
        &self,
        config: &ResolvedConfig,
        on_status: impl FnMut(Status) + Send,
    ) -> Result<JavaEnvGuard, CjdkError> {
        let java_home = self.cache_jdk(config, on_status).await?;
        Ok(JavaEnvGuard::enter(java_home))
    }

    pub async fn cache_file(
        &self,
        url: &str,
        filename: &str,
        hashes: &FileHashes,
        on_status: impl FnMut(Status) + Send,
    ) -> Result<PathBuf, CjdkError> {
        let name_hash = index::fetch::url_hash(url);
        let path = self
            .cache
            .install_file(&self.client, url, filename, hashes, &name_hash, on_status)
            .await?;
        Ok(path)
    }

    pub async fn cache_package(
        &self,
        url: &str,
        archive_type: Option<ArchiveType>,
        hashes: &FileHashes,
        on_status: impl FnMut(Status) + Send,
    ) -> Result<PathBuf, CjdkError> {
        let archive_type = match archive_type.or_else(|| ArchiveType::infer_from_url(url)) {
            Some(t) => t,
            None => {
                return Err(CjdkError::Config(ConfigError::UnknownArchiveType(
                    url.to_string(),
                )))
            }
        };

        let key = InstallKey::for_url(archive_type, url);
        let layout = self.cache.layout();
        let path = self
            .cache
            .install_archive(
                &self.client,
                url,
                archive_type,
                hashes,
                &layout.pkg_root(key),
                &layout.pkg_partial(key),
                &layout.pkg_lock(key),
                on_status,
            )
            .await?;
        Ok(path)
    }

    pub async fn list_vendors(&self, config: &ResolvedConfig) -> Result<Vec<SmolStr>, CjdkError> {
        let index = self.fetch_index_model(config).await?;
        Ok(index.vendors(&config.os, &config.arch))
    }

    pub fn list_jdks(&self) -> std::io::Result<Vec<(InstallKey, PathBuf)>> {
        self.cache.list_installed()
    }

    pub fn clear_cache(&self, scope: CacheScope) -> Vec<(PathBuf, std::io::Error)> {
        self.cache.clear(scope)
    }
}

static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn path_separator() -> &'static str {
    if cfg!(windows) {
        ";"
    } else {
        ":"
    }
}

/// RAII scope owning the prior `JAVA_HOME`/`PATH` values, restoring them
/// unconditionally on drop (`spec.md` §9 "Scoped environment mutation").
pub struct JavaEnvGuard {
    _lock: MutexGuard<'static, ()>,
    java_home: PathBuf,
    prior_java_home: Option<String>,
    prior_path: Option<String>,
}

impl JavaEnvGuard {
    fn enter(java_home: PathBuf) -> JavaEnvGuard {
        let lock = ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let prior_java_home = std::env::var("JAVA_HOME").ok();
        let prior_path = std::env::var("PATH").ok();

        let bin = java_home.join("bin");
        let new_path = match &prior_path {
            Some(existing) => format!("{}{}{}", bin.display(), path_separator(), existing),
            None => bin.display().to_string(),
        };
        // SAFETY: serialized by `ENV_MUTEX`, held for the lifetime of this guard.
        unsafe {
            std::env::set_var("JAVA_HOME", &java_home);
            std::env::set_var("PATH", new_path);
        }

        JavaEnvGuard {
            _lock: lock,
            java_home,
            prior_java_home,
            prior_path,
        }
    }

    pub fn java_home(&self) -> &std::path::Path {
        &self.java_home
    }
}

impl Drop for JavaEnvGuard {
    fn drop(&mut self) {
        // SAFETY: serialized by `ENV_MUTEX`, held for the lifetime of this guard.
        unsafe {
            match &self.prior_java_home {
                Some(v) => std::env::set_var("JAVA_HOME", v),
                None => std::env::remove_var("JAVA_HOME"),
            }
            match &self.prior_path {
                Some(v) => std::env::set_var("PATH", v),
                None => std::env::remove_var("PATH"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn java_env_guard_restores_prior_values_on_drop() {
        let _serialize = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        // SAFETY: serialized by `ENV_MUTEX`, held across both calls.
        unsafe {
            std::env::set_var("JAVA_HOME", "/prior/jdk");
            std::env::set_var("PATH", "/usr/bin");
        }
        drop(_serialize);

        {
            let guard = JavaEnvGuard::enter(PathBuf::from("/cache/jdks/abc"));
            assert_eq!(std::env::var("JAVA_HOME").unwrap(), "/cache/jdks/abc");
            assert!(std::env::var("PATH").unwrap().starts_with("/cache/jdks/abc/bin"));
            drop(guard);
        }

        assert_eq!(std::env::var("JAVA_HOME").unwrap(), "/prior/jdk");
        assert_eq!(std::env::var("PATH").unwrap(), "/usr/bin");
    }

    #[test]
    fn java_env_guard_removes_vars_that_were_previously_unset() {
        let _serialize = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        // SAFETY: serialized by `ENV_MUTEX`, held across this call.
        unsafe {
            std::env::remove_var("JAVA_HOME");
        }
        drop(_serialize);

        let guard = JavaEnvGuard::enter(PathBuf::from("/cache/jdks/xyz"));
        drop(guard);
        assert!(std::env::var("JAVA_HOME").is_err());
    }
}
