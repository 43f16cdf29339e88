//! `clear-cache`: best-effort sweep of a cache scope, skipping any
//! install whose lock is currently held (`spec.md` §8 property around
//! not clearing an in-use install).

use crate::cache::CacheScope;
use crate::error::CjdkError;
use crate::facade::Facade;

pub const CMD: &str = "clear-cache";

pub fn command() -> clap::Command {
    clap::Command::new(CMD)
        .about("Remove cached JDKs, packages, files, or index entries")
        .arg(super::cache_dir_arg())
        .arg(
            clap::Arg::new("scope")
                .long("scope")
                .value_name("SCOPE")
                .value_parser(["jdks", "index", "files", "pkgs", "all"])
                .default_value("all"),
        )
}

pub fn run(args: &clap::ArgMatches) -> Result<i32, CjdkError> {
    let cache_dir = super::resolve_cache_dir(args);
    let facade = Facade::new(crate::HttpClient::new(), cache_dir);

    let scope = match args.get_one::<String>("scope").map(String::as_str) {
        Some("jdks") => CacheScope::Jdks,
        Some("index") => CacheScope::Index,
        Some("files") => CacheScope::Files,
        Some("pkgs") => CacheScope::Pkgs,
        _ => CacheScope::All,
    };

    let errors = facade.clear_cache(scope);
    for (path, err) in &errors {
        log::warn!("failed to remove {}: {err}", path.display());
    }
    Ok(if errors.is_empty() { 0 } else { 1 })
}
