//! `cache-package`: downloads, verifies, and extracts an arbitrary
//! archive outside the JDK namespace (`spec.md` §4.4's "package" path).

use crate::archive::{ArchiveType, FileHashes};
use crate::error::CjdkError;

use super::progress::ProgressReporter;

pub const CMD: &str = "cache-package";

pub fn command() -> clap::Command {
    clap::Command::new(CMD)
        .about("Download, verify, and extract an archive")
        .arg(super::cache_dir_arg())
        .arg(clap::Arg::new("url").required(true).value_name("URL"))
        .arg(
            clap::Arg::new("archive-type")
                .long("archive-type")
                .value_name("TYPE")
                .value_parser(["tgz", "tbz2", "txz", "zip", "tar"]),
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
    let archive_type = args
        .get_one::<String>("archive-type")
        .map(|s| ArchiveType::parse(s).expect("value_parser restricts to known types"));
    let hashes: FileHashes = super::hashes_from_args(args);
    let hide_progress_bars = args.get_flag("hide-progress-bars");
    let mut reporter = ProgressReporter::new(hide_progress_bars);

    let path = facade
        .cache_package(url, archive_type, &hashes, |s| reporter.report(s))
        .await?;
    println!("{}", path.display());
    Ok(0)
}
