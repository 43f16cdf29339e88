//! `spec.md` §8 property 2 / scenario 4: two installers racing the same
//! archive contend on one `.lock` file and only one of them ever
//! downloads. `mockito` stands in for the archive's HTTP endpoint, the
//! same way `mindstorm38-portablemc`'s `tests/download.rs` mocks its
//! download URLs, since the Install Cache's fetch step always issues a
//! real `reqwest` GET with no local-path shortcut of its own.

use std::io::Write;

use cjdk::archive::{ArchiveType, FileHashes, InstallKey};
use cjdk::cache::CacheLayout;
use cjdk::cache::InstallCache;
use cjdk::HttpClient;

fn build_tgz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut tar_bytes = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut tar_bytes);
        for (path, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.finish().unwrap();
    }

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&tar_bytes).unwrap();
    encoder.finish().unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn only_one_download_occurs_under_lock_contention() {
    let mut server = mockito::Server::new();
    let archive_bytes = build_tgz(&[("jdk-17.0.1/release", b"JAVA_VERSION=\"17.0.1\"\n")]);

    let mock = server
        .mock("GET", "/jdk.tar.gz")
        .with_status(200)
        .with_body(archive_bytes)
        .expect(1)
        .create();

    let url = format!("{}/jdk.tar.gz", server.url());
    let dir = tempfile::tempdir().unwrap();
    let layout = CacheLayout::new(dir.path().to_path_buf());
    let cache = InstallCache::new(layout.clone());
    let client = HttpClient::new();

    let key = InstallKey::for_url(ArchiveType::Tgz, &url);
    let root = layout.jdk_root(key);
    let partial = layout.jdk_partial(key);
    let lock = layout.jdk_lock(key);
    let hashes = FileHashes::default();

    let first = cache.install_archive(
        &client,
        &url,
        ArchiveType::Tgz,
        &hashes,
        &root,
        &partial,
        &lock,
        |_| {},
    );
    let second = cache.install_archive(
        &client,
        &url,
        ArchiveType::Tgz,
        &hashes,
        &root,
        &partial,
        &lock,
        |_| {},
    );

    let (first_path, second_path) = tokio::join!(first, second);
    let first_path = first_path.unwrap();
    let second_path = second_path.unwrap();

    assert_eq!(first_path, root);
    assert_eq!(second_path, root);
    assert!(root.join("release").is_file());

    // Fails if the mock was hit more or fewer than once.
    mock.assert();
}
