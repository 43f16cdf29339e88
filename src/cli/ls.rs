//! `ls`: lists installed JDKs (`spec.md` §6), mirroring the shape of
//! `avm`'s `cli/tool/list.rs`.

use crate::cache::{CacheLayout, InstallCache};
use crate::error::{CjdkError, InstallError};

pub const CMD: &str = "ls";

pub fn command() -> clap::Command {
    clap::Command::new(CMD)
        .about("List installed JDKs")
        .arg(super::cache_dir_arg())
}

pub fn run(args: &clap::ArgMatches) -> Result<i32, CjdkError> {
    let cache_dir = super::resolve_cache_dir(args);
    let cache = InstallCache::new(CacheLayout::new(cache_dir));
    for (key, path) in cache.list_installed().map_err(InstallError::from)? {
        println!("{key}\t{}", path.display());
    }
    Ok(0)
}
