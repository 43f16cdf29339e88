//! `exec`: resolves and installs the configured JDK, then runs a child
//! process with `JAVA_HOME`/`PATH` prepared via the `java_env` scope
//! (`spec.md` §5), returning the child's exit status per `spec.md` §6.

use crate::error::CjdkError;

use super::progress::ProgressReporter;

pub const CMD: &str = "exec";

pub fn command() -> clap::Command {
    super::add_jdk_args(
        clap::Command::new(CMD)
            .about("Run a command with JAVA_HOME and PATH prepared for the configured JDK")
            .trailing_var_arg(true)
            .arg(
                clap::Arg::new("command")
                    .required(true)
                    .num_args(1..)
                    .value_name("COMMAND"),
            ),
    )
}

pub async fn run(args: &clap::ArgMatches) -> Result<i32, CjdkError> {
    let config = super::resolve_config(args)?;
    let facade = super::build_facade(&config);
    let mut reporter = ProgressReporter::new(config.hide_progress_bars);

    let guard = facade.java_env(&config, |s| reporter.report(s)).await?;

    let words: Vec<String> = args
        .get_many::<String>("command")
        .expect("command is required")
        .cloned()
        .collect();
    let (program, rest) = words.split_first().expect("clap enforces num_args(1..)");

    let status = std::process::Command::new(program)
        .args(rest)
        .status()
        .map_err(crate::error::InstallError::Io)?;

    drop(guard);
    Ok(status.code().unwrap_or(1))
}
