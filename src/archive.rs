//! Archive descriptors and the content-addressed [`InstallKey`], the
//! identity `spec.md` §3/§8 property 3 is built around.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use smol_str::SmolStr;

/// The archive kinds named in `spec.md` §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveType {
    Tgz,
    Tbz2,
    Txz,
    Zip,
    Tar,
}

impl ArchiveType {
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveType::Tgz => "tgz",
            ArchiveType::Tbz2 => "tbz2",
            ArchiveType::Txz => "txz",
            ArchiveType::Zip => "zip",
            ArchiveType::Tar => "tar",
        }
    }

    pub fn parse(s: &str) -> Option<ArchiveType> {
        match s {
            "tgz" => Some(ArchiveType::Tgz),
            "tbz2" => Some(ArchiveType::Tbz2),
            "txz" => Some(ArchiveType::Txz),
            "zip" => Some(ArchiveType::Zip),
            "tar" => Some(ArchiveType::Tar),
            _ => None,
        }
    }

    /// Infers the archive type from a URL's suffix, per `spec.md` §3 (used
    /// when the URL has no `<type>+` prefix).
    pub fn infer_from_url(url: &str) -> Option<ArchiveType> {
        let url = url.split(['?', '#']).next().unwrap_or(url);
        if url.ends_with(".tar.gz") || url.ends_with(".tgz") {
            Some(ArchiveType::Tgz)
        } else if url.ends_with(".tar.bz2") || url.ends_with(".tbz2") {
            Some(ArchiveType::Tbz2)
        } else if url.ends_with(".tar.xz") || url.ends_with(".txz") {
            Some(ArchiveType::Txz)
        } else if url.ends_with(".zip") {
            Some(ArchiveType::Zip)
        } else if url.ends_with(".tar") {
            Some(ArchiveType::Tar)
        } else {
            None
        }
    }
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits an index URL string into an optional forced `<type>+` prefix and
/// the remaining URL, then resolves the archive type (forced prefix wins
/// over suffix inference).
pub fn split_type_prefix(raw_url: &str) -> anyhow::Result<(ArchiveType, SmolStr)> {
    if let Some(idx) = raw_url.find('+') {
        let (prefix, rest) = raw_url.split_at(idx);
        if let Some(archive_type) = ArchiveType::parse(prefix) {
            return Ok((archive_type, SmolStr::new(&rest[1..])));
        }
    }

    let archive_type = ArchiveType::infer_from_url(raw_url).ok_or_else(|| {
        anyhow::anyhow!("unknown archive type from url '{raw_url}'")
    })?;
    Ok((archive_type, SmolStr::new(raw_url)))
}

/// `{ vendor, version, os, arch, url, archiveType, sha1? }` from `spec.md`
/// §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveDescriptor {
    pub vendor: SmolStr,
    pub version: SmolStr,
    pub os: SmolStr,
    pub arch: SmolStr,
    pub url: SmolStr,
    pub archive_type: ArchiveType,
    pub sha1: Option<SmolStr>,
}

/// Content-addressed identity of a materialized install: the lowercase hex
/// SHA-1 of `"<archiveType>+<url>"`. Two descriptors with the same URL and
/// type collide deterministically and share one install, per `spec.md`
/// §3/§8 property 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstallKey([u8; 20]);

impl InstallKey {
    pub fn for_url(archive_type: ArchiveType, url: &str) -> InstallKey {
        let canonical = format!("{archive_type}+{url}");
        let digest = Sha1::digest(canonical.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        InstallKey(bytes)
    }

    pub fn for_descriptor(d: &ArchiveDescriptor) -> InstallKey {
        InstallKey::for_url(d.archive_type, &d.url)
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Reconstructs a key from the hex directory name under `jdks/`/`pkgs/`.
    pub fn from_hex(s: &str) -> Option<InstallKey> {
        let decoded = hex::decode(s).ok()?;
        let bytes: [u8; 20] = decoded.try_into().ok()?;
        Some(InstallKey(bytes))
    }
}

impl fmt::Display for InstallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// User-supplied hashes for `cache_file`/`cache_package`/`cache_jdk`
/// verification (`spec.md` §4.5).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHashes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha1: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha512: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<SmolStr>,
}

impl FileHashes {
    pub fn is_empty(&self) -> bool {
        self.sha1.is_none() && self.sha256.is_none() && self.sha512.is_none() && self.md5.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_key_is_deterministic_sha1_of_type_plus_url() {
        let key = InstallKey::for_url(ArchiveType::Tgz, "https://example.com/jdk.tar.gz");
        let expected = Sha1::digest(b"tgz+https://example.com/jdk.tar.gz");
        assert_eq!(key.to_hex(), hex::encode(expected));
    }

    #[test]
    fn same_url_and_type_collide() {
        let a = InstallKey::for_url(ArchiveType::Zip, "https://example.com/a.zip");
        let b = InstallKey::for_url(ArchiveType::Zip, "https://example.com/a.zip");
        assert_eq!(a, b);
    }

    #[test]
    fn type_prefix_forces_archive_type() {
        let (t, rest) = split_type_prefix("zip+https://example.com/file.bin").unwrap();
        assert_eq!(t, ArchiveType::Zip);
        assert_eq!(rest, "https://example.com/file.bin");
    }

    #[test]
    fn infers_type_from_suffix_without_prefix() {
        let (t, rest) = split_type_prefix("https://example.com/jdk.tar.gz").unwrap();
        assert_eq!(t, ArchiveType::Tgz);
        assert_eq!(rest, "https://example.com/jdk.tar.gz");
    }

    #[test]
    fn unknown_suffix_is_an_error() {
        assert!(split_type_prefix("https://example.com/jdk.exe").is_err());
    }

    #[test]
    fn install_key_hex_round_trips() {
        let key = InstallKey::for_url(ArchiveType::Tar, "https://example.com/a.tar");
        let round_tripped = InstallKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key, round_tripped);
    }
}
