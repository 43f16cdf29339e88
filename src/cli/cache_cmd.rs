//! `cache`: ensures the resolved JDK is installed and prints its Java
//! home, without preparing an environment (that's `exec`/`java_env`).

use crate::error::CjdkError;

use super::progress::ProgressReporter;

pub const CMD: &str = "cache";

pub fn command() -> clap::Command {
    super::add_jdk_args(clap::Command::new(CMD).about("Download and cache a JDK"))
}

pub async fn run(args: &clap::ArgMatches) -> Result<i32, CjdkError> {
    let config = super::resolve_config(args)?;
    let facade = super::build_facade(&config);
    let mut reporter = ProgressReporter::new(config.hide_progress_bars);
    let path = facade
        .cache_jdk(&config, |s| reporter.report(s))
        .await?;
    println!("{}", path.display());
    Ok(0)
}
