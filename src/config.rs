//! The configuration table from `spec.md` §6, split into a pure
//! environment-ingestion function and a single defaulting function, per
//! the design note in `spec.md` §9 ("Dynamic-typed config bag: replace
//! with a single configuration struct... Defaults are applied in one
//! place; env ingestion is a separate pure function"). Grounded in `avm`'s
//! `Config`/`load_config` split (`src/lib.rs`, `src/cli/mod.rs`), simplified
//! since this system has no on-disk config file, only env vars and CLI
//! flags.

use std::path::PathBuf;

use smol_str::SmolStr;

use crate::error::ConfigError;
use crate::version::VersionExpression;

const DEFAULT_VENDOR: &str = "adoptium";
const DEFAULT_INDEX_URL: &str = "https://github.com/coursier/jvm-index/raw/master/index.json";
const DEFAULT_INDEX_TTL: u64 = 86_400;

/// Raw values read from `CJDK_*` environment variables. An empty value is
/// treated as unset, per `spec.md` §6. This function performs no
/// defaulting and no validation beyond what's needed to parse the value at
/// all.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverlay {
    pub vendor: Option<SmolStr>,
    pub version: Option<SmolStr>,
    pub cache_dir: Option<PathBuf>,
    pub index_url: Option<SmolStr>,
    pub index_ttl: Option<u64>,
    pub os: Option<SmolStr>,
    pub arch: Option<SmolStr>,
    pub hide_progress_bars: Option<bool>,
}

impl ConfigOverlay {
    pub fn from_env() -> ConfigOverlay {
        ConfigOverlay {
            vendor: env_str("CJDK_VENDOR"),
            version: env_str("CJDK_VERSION"),
            cache_dir: env_str("CJDK_CACHE_DIR").map(PathBuf::from),
            index_url: env_str("CJDK_INDEX_URL"),
            index_ttl: env_str("CJDK_INDEX_TTL").and_then(|s| s.parse().ok()),
            os: env_str("CJDK_OS"),
            arch: env_str("CJDK_ARCH"),
            hide_progress_bars: env_str("CJDK_HIDE_PROGRESS_BARS")
                .map(|s| matches!(s.as_str(), "1" | "yes" | "true")),
        }
    }
}

fn env_str(key: &str) -> Option<SmolStr> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => Some(SmolStr::new(v)),
        _ => None,
    }
}

/// Values explicitly supplied by a caller (CLI flags or keyword
/// arguments), which take precedence over the environment per `spec.md`
/// §6. `jdk` is the `vendor:version` shorthand and is mutually exclusive
/// with `vendor`/`version`.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub vendor: Option<SmolStr>,
    pub version: Option<SmolStr>,
    pub jdk: Option<SmolStr>,
    pub cache_dir: Option<PathBuf>,
    pub index_url: Option<SmolStr>,
    pub index_ttl: Option<u64>,
    pub os: Option<SmolStr>,
    pub arch: Option<SmolStr>,
    pub hide_progress_bars: Option<bool>,
}

/// The single, fully-defaulted configuration the rest of the crate
/// operates on.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub vendor: SmolStr,
    pub version_expr: VersionExpression,
    pub cache_dir: PathBuf,
    pub index_url: SmolStr,
    pub index_ttl_secs: u64,
    pub os: SmolStr,
    pub arch: SmolStr,
    pub hide_progress_bars: bool,
}

/// Applies `overrides` (highest precedence), then `overlay` (environment),
/// then built-in defaults, in that order, all in this one function.
/// `default_cache_dir` and `default_os`/`default_arch` are supplied by the
/// caller (the CLI layer uses platform discovery for these; the core
/// never reads env or the platform directly for them, per `spec.md` §9).
pub fn resolve(
    overrides: &ConfigOverrides,
    overlay: &ConfigOverlay,
    default_cache_dir: PathBuf,
    default_os: Option<&str>,
    default_arch: Option<&str>,
) -> Result<ResolvedConfig, ConfigError> {
    if overrides.jdk.is_some() && (overrides.vendor.is_some() || overrides.version.is_some()) {
        return Err(ConfigError::JdkAndVendorBothSet);
    }

    let (vendor, version) = match &overrides.jdk {
        Some(jdk) => split_jdk_shorthand(jdk),
        None => (None, None),
    };

    let vendor = overrides
        .vendor
        .clone()
        .or(vendor)
        .or_else(|| overlay.vendor.clone())
        .unwrap_or_else(|| SmolStr::new(DEFAULT_VENDOR));

    let version_str = overrides
        .version
        .clone()
        .or(version)
        .or_else(|| overlay.version.clone())
        .unwrap_or_default();
    let version_expr = VersionExpression::parse(&version_str);

    let cache_dir = overrides
        .cache_dir
        .clone()
        .or_else(|| overlay.cache_dir.clone())
        .unwrap_or(default_cache_dir);

    let index_url = overrides
        .index_url
        .clone()
        .or_else(|| overlay.index_url.clone())
        .unwrap_or_else(|| SmolStr::new(DEFAULT_INDEX_URL));

    let index_ttl_secs = overrides
        .index_ttl
        .or(overlay.index_ttl)
        .unwrap_or(DEFAULT_INDEX_TTL);

    let os = overrides
        .os
        .clone()
        .or_else(|| overlay.os.clone())
        .or_else(|| default_os.map(SmolStr::new))
        .ok_or_else(|| ConfigError::Other("no 'os' given and host OS is unrecognized".into()))?;

    let arch = overrides
        .arch
        .clone()
        .or_else(|| overlay.arch.clone())
        .or_else(|| default_arch.map(SmolStr::new))
        .ok_or_else(|| {
            ConfigError::Other("no 'arch' given and host architecture is unrecognized".into())
        })?;

    let hide_progress_bars = overrides
        .hide_progress_bars
        .or(overlay.hide_progress_bars)
        .unwrap_or(false);

    Ok(ResolvedConfig {
        vendor,
        version_expr,
        cache_dir,
        index_url,
        index_ttl_secs,
        os,
        arch,
        hide_progress_bars,
    })
}

/// Splits a `vendor:version` shorthand. A bare string with no `:` is taken
/// as the vendor alone (version defaults downstream).
fn split_jdk_shorthand(jdk: &str) -> (Option<SmolStr>, Option<SmolStr>) {
    match jdk.split_once(':') {
        Some((vendor, version)) => (Some(SmolStr::new(vendor)), Some(SmolStr::new(version))),
        None => (Some(SmolStr::new(jdk)), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_overrides() -> ConfigOverrides {
        ConfigOverrides::default()
    }

    #[test]
    fn defaults_vendor_to_adoptium() {
        let resolved = resolve(
            &empty_overrides(),
            &ConfigOverlay::default(),
            PathBuf::from("/cache"),
            Some("linux"),
            Some("amd64"),
        )
        .unwrap();
        assert_eq!(resolved.vendor, "adoptium");
        assert_eq!(resolved.version_expr, VersionExpression::Any);
    }

    #[test]
    fn jdk_shorthand_splits_vendor_and_version() {
        let overrides = ConfigOverrides {
            jdk: Some("temurin:17.0.3".into()),
            ..Default::default()
        };
        let resolved = resolve(
            &overrides,
            &ConfigOverlay::default(),
            PathBuf::from("/cache"),
            Some("linux"),
            Some("amd64"),
        )
        .unwrap();
        assert_eq!(resolved.vendor, "temurin");
        assert_eq!(resolved.version_expr.to_string(), "17.0.3");
    }

    #[test]
    fn jdk_and_vendor_both_set_is_an_error() {
        let overrides = ConfigOverrides {
            jdk: Some("temurin:17".into()),
            vendor: Some("zulu".into()),
            ..Default::default()
        };
        let err = resolve(
            &overrides,
            &ConfigOverlay::default(),
            PathBuf::from("/cache"),
            Some("linux"),
            Some("amd64"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::JdkAndVendorBothSet));
    }

    #[test]
    fn cli_overrides_take_precedence_over_env() {
        let overrides = ConfigOverrides {
            vendor: Some("zulu".into()),
            ..Default::default()
        };
        let overlay = ConfigOverlay {
            vendor: Some("temurin".into()),
            ..Default::default()
        };
        let resolved = resolve(
            &overrides,
            &overlay,
            PathBuf::from("/cache"),
            Some("linux"),
            Some("amd64"),
        )
        .unwrap();
        assert_eq!(resolved.vendor, "zulu");
    }

    #[test]
    fn ttl_zero_is_kept_not_treated_as_unset() {
        let overrides = ConfigOverrides {
            index_ttl: Some(0),
            ..Default::default()
        };
        let resolved = resolve(
            &overrides,
            &ConfigOverlay::default(),
            PathBuf::from("/cache"),
            Some("linux"),
            Some("amd64"),
        )
        .unwrap();
        assert_eq!(resolved.index_ttl_secs, 0);
    }
}
