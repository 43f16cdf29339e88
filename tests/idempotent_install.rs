//! `spec.md` §2 module 11 / §4 Resolver: the full resolve → install →
//! re-install idempotence path, against a real local index file (the
//! Index Fetcher's local-path branch, exercised without a server) and a
//! `mockito`-mocked archive endpoint (the Install Cache's fetch step has
//! no local-path branch of its own, only `reqwest` over HTTP).

use std::io::Write;

use cjdk::config::ResolvedConfig;
use cjdk::facade::Facade;
use cjdk::version::VersionExpression;
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

#[tokio::test]
async fn resolve_install_reinstall_is_idempotent_against_local_index() {
    let mut server = mockito::Server::new();
    let archive_bytes = build_tgz(&[("jdk-21.0.2+13/release", b"JAVA_VERSION=\"21.0.2\"\n")]);

    let mock = server
        .mock("GET", "/temurin-21.tar.gz")
        .with_status(200)
        .with_body(archive_bytes)
        .expect(1)
        .create();

    let archive_url = format!("{}/temurin-21.tar.gz", server.url());

    let index_dir = tempfile::tempdir().unwrap();
    let index_path = index_dir.path().join("index.json");
    std::fs::write(
        &index_path,
        serde_json::json!({
            "linux": {
                "amd64": {
                    "temurin": {
                        "21.0.2": archive_url,
                    }
                }
            }
        })
        .to_string(),
    )
    .unwrap();

    let cache_dir = tempfile::tempdir().unwrap();
    let config = ResolvedConfig {
        vendor: "temurin".into(),
        version_expr: VersionExpression::parse("21.0.2"),
        cache_dir: cache_dir.path().to_path_buf(),
        index_url: index_path.to_str().unwrap().into(),
        index_ttl_secs: 86_400,
        os: "linux".into(),
        arch: "amd64".into(),
        hide_progress_bars: true,
    };

    let facade = Facade::new(HttpClient::new(), cache_dir.path().to_path_buf());

    let first = facade.cache_jdk(&config, |_| {}).await.unwrap();
    assert!(first.join("release").is_file());

    let second = facade.cache_jdk(&config, |_| {}).await.unwrap();
    assert_eq!(first, second);

    // The re-install sees the already-populated root and never re-downloads.
    mock.assert();
}
