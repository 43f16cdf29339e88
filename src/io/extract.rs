//! Archive extraction with the path-safety rules and strip-one-directory
//! rule from `spec.md` §4.5. Generalizes `avm`'s
//! `blocking::extract_archive` (which only handles `Zip`/`TarGz` and
//! trusts every entry) to all five archive kinds and to the zip-slip /
//! tar-slip defenses a shared multi-vendor download cache needs.

use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use xz2::read::XzDecoder;

use crate::archive::ArchiveType;
use crate::error::InstallError;

/// Rejects entries whose resolved path would escape the extraction root:
/// absolute paths, `..` components, and (via `Component::Prefix`) Windows
/// drive letters.
fn check_safe_relative_path(path: &Path) -> Result<(), InstallError> {
    for component in path.components() {
        match component {
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(InstallError::PathEscape {
                    entry: path.display().to_string(),
                });
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(())
}

fn extract_tar<R: Read>(reader: R, dest: &Path) -> Result<(), InstallError> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_unpack_xattrs(false);

    for entry in archive
        .entries()
        .map_err(|e| InstallError::Archive(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| InstallError::Archive(e.to_string()))?;
        let path = entry
            .path()
            .map_err(|e| InstallError::Archive(e.to_string()))?
            .into_owned();
        check_safe_relative_path(&path)?;

        let entry_type = entry.header().entry_type();
        if entry_type.is_symlink() || entry_type.is_hard_link() {
            if let Some(link_name) = entry
                .link_name()
                .map_err(|e| InstallError::Archive(e.to_string()))?
            {
                check_safe_relative_path(&link_name)?;
            }
        }

        let unpacked = entry
            .unpack_in(dest)
            .map_err(|e| InstallError::Archive(e.to_string()))?;
        if !unpacked {
            return Err(InstallError::PathEscape {
                entry: path.display().to_string(),
            });
        }
    }
    Ok(())
}

fn extract_zip(archive_file: File, dest: &Path) -> Result<(), InstallError> {
    let mut archive =
        zip::ZipArchive::new(archive_file).map_err(|e| InstallError::Archive(e.to_string()))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| InstallError::Archive(e.to_string()))?;
        let relative = file.enclosed_name().ok_or_else(|| InstallError::PathEscape {
            entry: file.name().to_string(),
        })?;
        let out_path = dest.join(&relative);

        if file.is_dir() {
            std::fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out_file = File::create(&out_path)?;
            std::io::copy(&mut file, &mut out_file)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))?;
            }
        }
    }
    Ok(())
}

/// Unpacks `archive_path` (of kind `archive_type`) into `extraction_root`,
/// which must already exist and be empty.
pub fn extract(
    archive_type: ArchiveType,
    archive_path: &Path,
    extraction_root: &Path,
) -> Result<(), InstallError> {
    std::fs::create_dir_all(extraction_root)?;
    let file = File::open(archive_path)?;

    match archive_type {
        ArchiveType::Tgz => extract_tar(GzDecoder::new(file), extraction_root),
        ArchiveType::Tbz2 => extract_tar(BzDecoder::new(file), extraction_root),
        ArchiveType::Txz => extract_tar(XzDecoder::new(file), extraction_root),
        ArchiveType::Tar => extract_tar(file, extraction_root),
        ArchiveType::Zip => extract_zip(file, extraction_root),
    }
}

/// Applies the strip-one rule from `spec.md` §4.5: if `extraction_root`
/// has exactly one top-level entry and it is a directory, the install
/// root is that directory's contents; otherwise it's `extraction_root`
/// as-is. Returns the path that should be renamed into place.
pub fn strip_one(extraction_root: &Path) -> std::io::Result<PathBuf> {
    let entries: Vec<_> = std::fs::read_dir(extraction_root)?
        .take(2)
        .collect::<Result<Vec<_>, _>>()?;

    if entries.len() == 1 && entries[0].path().is_dir() {
        Ok(entries[0].path())
    } else {
        Ok(extraction_root.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_parent_dir_component() {
        assert!(check_safe_relative_path(Path::new("../evil")).is_err());
        assert!(check_safe_relative_path(Path::new("a/../../evil")).is_err());
    }

    #[test]
    fn rejects_absolute_path() {
        assert!(check_safe_relative_path(Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn accepts_ordinary_relative_path() {
        assert!(check_safe_relative_path(Path::new("bin/java")).is_ok());
    }

    #[test]
    fn strip_one_lifts_single_top_level_directory() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("jdk-17.0.3+7");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(inner.join("release"), b"JAVA_VERSION=17").unwrap();

        let lifted = strip_one(dir.path()).unwrap();
        assert_eq!(lifted, inner);
    }

    #[test]
    fn strip_one_keeps_flat_archive_with_two_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();
        std::fs::write(dir.path().join("release"), b"JAVA_VERSION=17").unwrap();

        let lifted = strip_one(dir.path()).unwrap();
        assert_eq!(lifted, dir.path());
    }

    #[test]
    fn strip_one_keeps_single_top_level_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("single-file"), b"contents").unwrap();

        let lifted = strip_one(dir.path()).unwrap();
        assert_eq!(lifted, dir.path());
    }
}
