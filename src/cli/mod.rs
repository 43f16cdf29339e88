//! The CLI surface (`spec.md` §6): `ls`, `ls-vendors`, `cache`,
//! `java-home`, `exec`, `cache-file`, `cache-package`, `clear-cache`, laid
//! out the way `avm`'s `cli/tool/*.rs` lays out one module per
//! subcommand, minus the multi-tool plugin indirection this system
//! doesn't need (there is exactly one resource kind: a JDK).

use std::path::PathBuf;

use directories::ProjectDirs;
use smol_str::SmolStr;

use crate::config::{ConfigOverlay, ConfigOverrides, ResolvedConfig};
use crate::error::CjdkError;
use crate::facade::Facade;
use crate::{platform, HttpClient};

mod cache_cmd;
mod cache_file;
mod cache_package;
mod clear_cache;
mod exec;
mod java_home;
mod ls;
mod ls_vendors;
mod progress;

pub fn command() -> clap::Command {
    clap::Command::new("cjdk")
        .about("Per-user cache and launcher for Java runtime distributions")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(ls::command())
        .subcommand(ls_vendors::command())
        .subcommand(cache_cmd::command())
        .subcommand(java_home::command())
        .subcommand(exec::command())
        .subcommand(cache_file::command())
        .subcommand(cache_package::command())
        .subcommand(clear_cache::command())
}

pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", "cjdk")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".cjdk-cache"))
}

/// Shared `vendor`/`version`/`jdk`/`cache-dir`/`index-url`/`index-ttl`/
/// `os`/`arch`/`hide-progress-bars` flags (`spec.md` §6), attached to
/// every subcommand that resolves a JDK.
pub fn add_jdk_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        clap::Arg::new("jdk")
            .long("jdk")
            .value_name("VENDOR:VERSION")
            .help("Shorthand for --vendor/--version; mutually exclusive with both"),
    )
    .arg(
        clap::Arg::new("vendor")
            .long("vendor")
            .help("JDK vendor, e.g. 'temurin' (default 'adoptium')"),
    )
    .arg(
        clap::Arg::new("version")
            .long("version")
            .help("Version expression, e.g. '17+', '17.0.3', or empty for any"),
    )
    .arg(
        clap::Arg::new("cache-dir")
            .long("cache-dir")
            .value_name("DIR")
            .help("Overrides the cache base directory"),
    )
    .arg(
        clap::Arg::new("index-url")
            .long("index-url")
            .value_name("URL")
            .help("Overrides the index URL or local path"),
    )
    .arg(
        clap::Arg::new("index-ttl")
            .long("index-ttl")
            .value_name("SECONDS")
            .help("Index cache TTL in seconds; 0 forces a fetch"),
    )
    .arg(clap::Arg::new("os").long("os").help("Overrides the host OS"))
    .arg(
        clap::Arg::new("arch")
            .long("arch")
            .help("Overrides the host architecture"),
    )
    .arg(
        clap::Arg::new("hide-progress-bars")
            .long("hide-progress-bars")
            .action(clap::ArgAction::SetTrue),
    )
}

/// The `--sha1`/`--sha256`/`--sha512`/`--md5` flags shared by
/// `cache-file`/`cache-package` (`spec.md` §4.5).
pub fn hash_args() -> [clap::Arg; 4] {
    [
        clap::Arg::new("sha1").long("sha1").value_name("HEX"),
        clap::Arg::new("sha256").long("sha256").value_name("HEX"),
        clap::Arg::new("sha512").long("sha512").value_name("HEX"),
        clap::Arg::new("md5").long("md5").value_name("HEX"),
    ]
}

pub fn hashes_from_args(args: &clap::ArgMatches) -> crate::archive::FileHashes {
    crate::archive::FileHashes {
        sha1: args.get_one::<String>("sha1").map(SmolStr::new),
        sha256: args.get_one::<String>("sha256").map(SmolStr::new),
        sha512: args.get_one::<String>("sha512").map(SmolStr::new),
        md5: args.get_one::<String>("md5").map(SmolStr::new),
    }
}

pub fn cache_dir_arg() -> clap::Arg {
    clap::Arg::new("cache-dir")
        .long("cache-dir")
        .value_name("DIR")
        .help("Overrides the cache base directory")
}

/// Resolves just `cacheDir` (CLI flag > `CJDK_CACHE_DIR` > platform
/// default), for subcommands that don't resolve a JDK at all
/// (`ls`, `clear-cache`, `cache-file`, `cache-package`).
pub fn resolve_cache_dir(args: &clap::ArgMatches) -> PathBuf {
    args.get_one::<String>("cache-dir")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("CJDK_CACHE_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(default_cache_dir)
}

fn overrides_from_args(args: &clap::ArgMatches) -> ConfigOverrides {
    ConfigOverrides {
        vendor: args.get_one::<String>("vendor").map(SmolStr::new),
        version: args.get_one::<String>("version").map(SmolStr::new),
        jdk: args.get_one::<String>("jdk").map(SmolStr::new),
        cache_dir: args.get_one::<String>("cache-dir").map(PathBuf::from),
        index_url: args.get_one::<String>("index-url").map(SmolStr::new),
        index_ttl: args
            .get_one::<String>("index-ttl")
            .and_then(|s| s.parse().ok()),
        os: args.get_one::<String>("os").map(SmolStr::new),
        arch: args.get_one::<String>("arch").map(SmolStr::new),
        hide_progress_bars: args.get_flag("hide-progress-bars").then_some(true),
    }
}

pub fn resolve_config(args: &clap::ArgMatches) -> Result<ResolvedConfig, CjdkError> {
    let overrides = overrides_from_args(args);
    let overlay = ConfigOverlay::from_env();
    crate::config::resolve(
        &overrides,
        &overlay,
        default_cache_dir(),
        platform::current_os(),
        platform::current_arch(),
    )
    .map_err(Into::into)
}

pub fn build_facade(config: &ResolvedConfig) -> Facade {
    Facade::new(HttpClient::new(), config.cache_dir.clone())
}

/// Dispatches to the matched subcommand, returning the process exit code
/// on success (`exec`'s own child status; `0` for everything else).
/// Failures propagate as [`CjdkError`] for `spec.md` §6's exit-code map.
pub async fn run(matches: &clap::ArgMatches) -> Result<i32, CjdkError> {
    match matches.subcommand() {
        Some((ls::CMD, args)) => ls::run(args),
        Some((ls_vendors::CMD, args)) => ls_vendors::run(args).await,
        Some((cache_cmd::CMD, args)) => cache_cmd::run(args).await,
        Some((java_home::CMD, args)) => java_home::run(args).await,
        Some((exec::CMD, args)) => exec::run(args).await,
        Some((cache_file::CMD, args)) => cache_file::run(args).await,
        Some((cache_package::CMD, args)) => cache_package::run(args).await,
        Some((clear_cache::CMD, args)) => clear_cache::run(args),
        _ => unreachable!("clap enforces subcommand_required"),
    }
}
