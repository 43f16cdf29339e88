//! `java-home`: resolves and installs the configured JDK, printing its
//! Java home. Shares the resolve-and-install core with `cache` (`spec.md`
//! §9's "two operations, one core").

use crate::error::CjdkError;

use super::progress::ProgressReporter;

pub const CMD: &str = "java-home";

pub fn command() -> clap::Command {
    super::add_jdk_args(clap::Command::new(CMD).about("Print the Java home of the configured JDK"))
}

pub async fn run(args: &clap::ArgMatches) -> Result<i32, CjdkError> {
    let config = super::resolve_config(args)?;
    let facade = super::build_facade(&config);
    let mut reporter = ProgressReporter::new(config.hide_progress_bars);
    let path = facade
        .java_home(&config, |s| reporter.report(s))
        .await?;
    println!("{}", path.display());
    Ok(0)
}
