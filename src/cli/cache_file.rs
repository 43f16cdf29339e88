//! `cache-file`: downloads and caches a single, unextracted file
//! (`spec.md` §4.4's "plain file" path, no archive handling).

use crate::archive::FileHashes;
use crate::error::CjdkError;

use super::progress::ProgressReporter;

pub const CMD: &str = "cache-file";

pub fn command() -> clap::Command {
    clap::Command::new(CMD)
        .about("Download and cache a single file")
        .arg(super::cache_dir_arg())
        .arg(clap::Arg::new("url").required(true).value_name("URL"))
        .arg(
            clap::Arg::new("filename")
                .long("filename")
                .required(true)
                .value_name("NAME"),
        )
        .args(super::hash_args())
        .arg(
            clap::Arg::new("hide-progress-bars")
                .long("hide-progress-bars")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(args: &clap::ArgMatches) -> Result<i32, CjdkError> {
    let cache_dir = super::resolve_cache_dir(args);
    let facade = crate::facade::Facade::new(crate::HttpClient::new(), cache_dir);

    let url = args.get_one::<String>("url").expect("url is required");
    let filename = args
        .get_one::<String>("filename")
        .expect("filename is required");
    let hashes: FileHashes = super::hashes_from_args(args);
    let hide_progress_bars = args.get_flag("hide-progress-bars");
    let mut reporter = ProgressReporter::new(hide_progress_bars);

    let path = facade
        .cache_file(url, filename, &hashes, |s| reporter.report(s))
        .await?;
    println!("{}", path.display());
    Ok(0)
}
