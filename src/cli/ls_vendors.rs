//! `ls-vendors`: lists vendors available for the configured `(os, arch)`.

use crate::error::CjdkError;

pub const CMD: &str = "ls-vendors";

pub fn command() -> clap::Command {
    super::add_jdk_args(clap::Command::new(CMD).about("List vendors available in the index"))
}

pub async fn run(args: &clap::ArgMatches) -> Result<i32, CjdkError> {
    let config = super::resolve_config(args)?;
    let facade = super::build_facade(&config);
    for vendor in facade.list_vendors(&config).await? {
        println!("{vendor}");
    }
    Ok(0)
}
