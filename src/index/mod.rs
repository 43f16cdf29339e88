//! The Index Model (`spec.md` §4.2): an in-memory `(os, arch, vendor) ->
//! ordered list of (version, ArchiveDescriptor)` view built deterministically
//! from the raw JSON document, applying the vendor suffix-merge,
//! dedup-by-greatest-raw-vendor, and per-vendor ascending sort
//! transforms.

pub mod fetch;

use std::collections::HashMap;

use serde_json::Value;
use smol_str::SmolStr;

use crate::archive::{self, ArchiveDescriptor};
use crate::vendor;
use crate::version::{Version, VersionExpression};

type Key = (SmolStr, SmolStr, SmolStr);

#[derive(Debug, Default)]
pub struct IndexModel {
    // Keyed by (os, arch, canonical vendor); values are sorted ascending
    // by Version Algebra and hold the original (merged) version string
    // alongside the descriptor, since expression matching operates on
    // strings, not the parsed Version.
    entries: HashMap<Key, Vec<(SmolStr, ArchiveDescriptor)>>,
}

impl IndexModel {
    /// Builds the model from `index[os][arch][vendor][version] = url`.
    pub fn build(raw: &Value) -> anyhow::Result<IndexModel> {
        // (os, arch, canonical_vendor, merged_version) -> (raw_vendor, descriptor)
        let mut staged: HashMap<(SmolStr, SmolStr, SmolStr, SmolStr), (SmolStr, ArchiveDescriptor)> =
            HashMap::new();

        let os_map = raw
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("index root must be an object"))?;
        for (os, arch_map) in os_map {
            let arch_map = arch_map
                .as_object()
                .ok_or_else(|| anyhow::anyhow!("index[{os}] must be an object"))?;
            for (arch, vendor_map) in arch_map {
                let vendor_map = vendor_map
                    .as_object()
                    .ok_or_else(|| anyhow::anyhow!("index[{os}][{arch}] must be an object"))?;
                for (raw_vendor, version_map) in vendor_map {
                    let version_map = version_map.as_object().ok_or_else(|| {
                        anyhow::anyhow!("index[{os}][{arch}][{raw_vendor}] must be an object")
                    })?;
                    let merged = vendor::merge_vendor(raw_vendor);

                    for (raw_version, url_value) in version_map {
                        let raw_url = url_value.as_str().ok_or_else(|| {
                            anyhow::anyhow!(
                                "index[{os}][{arch}][{raw_vendor}][{raw_version}] must be a string"
                            )
                        })?;
                        let (archive_type, clean_url) = archive::split_type_prefix(raw_url)?;

                        let merged_version = match &merged.version_suffix {
                            Some(suffix) => SmolStr::new(format!("{raw_version}-{suffix}")),
                            None => SmolStr::new(raw_version),
                        };

                        let descriptor = ArchiveDescriptor {
                            vendor: merged.canonical.clone(),
                            version: merged_version.clone(),
                            os: SmolStr::new(os),
                            arch: SmolStr::new(arch),
                            url: clean_url,
                            archive_type,
                            sha1: None,
                        };

                        let key = (
                            SmolStr::new(os),
                            SmolStr::new(arch),
                            merged.canonical.clone(),
                            merged_version,
                        );
                        let raw_vendor = SmolStr::new(raw_vendor);
                        staged
                            .entry(key)
                            .and_modify(|(kept_raw_vendor, kept_descriptor)| {
                                if raw_vendor > *kept_raw_vendor {
                                    *kept_raw_vendor = raw_vendor.clone();
                                    *kept_descriptor = descriptor.clone();
                                }
                            })
                            .or_insert((raw_vendor, descriptor));
                    }
                }
            }
        }

        let mut entries: HashMap<Key, Vec<(SmolStr, ArchiveDescriptor)>> = HashMap::new();
        for ((os, arch, vendor, version), (_raw_vendor, descriptor)) in staged {
            entries
                .entry((os, arch, vendor))
                .or_default()
                .push((version, descriptor));
        }
        for ((_, _, vendor), versions) in entries.iter_mut() {
            versions.sort_by(|(a, _), (b, _)| {
                Version::normalized_for_vendor(a, vendor).compare(&Version::normalized_for_vendor(b, vendor))
            });
        }

        Ok(IndexModel { entries })
    }

    /// Sorted, unique list of vendors available for `(os, arch)`.
    pub fn vendors(&self, os: &str, arch: &str) -> Vec<SmolStr> {
        let mut vendors: Vec<SmolStr> = self
            .entries
            .keys()
            .filter(|(o, a, _)| o == os && a == arch)
            .map(|(_, _, v)| v.clone())
            .collect();
        vendors.sort();
        vendors.dedup();
        vendors
    }

    /// Sorted (ascending, Version Algebra) list of versions for one
    /// vendor.
    pub fn versions(&self, os: &str, arch: &str, vendor: &str) -> Vec<SmolStr> {
        self.entries
            .get(&(SmolStr::new(os), SmolStr::new(arch), SmolStr::new(vendor)))
            .map(|v| v.iter().map(|(version, _)| version.clone()).collect())
            .unwrap_or_default()
    }

    /// Returns the greatest version matching `expr` for `(os, arch,
    /// vendor)`, or `None` if the vendor is unknown or nothing matches.
    pub fn select(
        &self,
        os: &str,
        arch: &str,
        vendor: &str,
        expr: &VersionExpression,
    ) -> Option<ArchiveDescriptor> {
        let versions = self
            .entries
            .get(&(SmolStr::new(os), SmolStr::new(arch), SmolStr::new(vendor)))?;

        versions
            .iter()
            .filter(|(version, _)| expr.matches(version, vendor))
            .next_back()
            .map(|(_, descriptor)| descriptor.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> Value {
        serde_json::json!({
            "linux": {
                "amd64": {
                    "temurin": {
                        "17.0.3": "https://example.com/temurin-17.0.3.tar.gz",
                        "11.0.18": "https://example.com/temurin-11.0.18.tar.gz"
                    },
                    "ibm-semeru-openj9-java17": {
                        "17.0.5": "https://example.com/semeru17.tar.gz"
                    },
                    "ibm-semeru-openj9-java11": {
                        "11.0.18": "tgz+https://example.com/semeru11.tar.gz"
                    }
                }
            }
        })
    }

    #[test]
    fn builds_vendor_list_sorted_and_unique() {
        let model = IndexModel::build(&sample_index()).unwrap();
        let vendors = model.vendors("linux", "amd64");
        assert_eq!(vendors, vec!["ibm-semeru-openj9", "temurin"]);
    }

    #[test]
    fn semeru_family_merges_with_suffixed_versions() {
        let model = IndexModel::build(&sample_index()).unwrap();
        let versions = model.versions("linux", "amd64", "ibm-semeru-openj9");
        assert_eq!(versions.len(), 2);
        assert!(versions.iter().any(|v| v == "17.0.5-java17"));
        assert!(versions.iter().any(|v| v == "11.0.18-java11"));
    }

    #[test]
    fn select_returns_greatest_match() {
        let model = IndexModel::build(&sample_index()).unwrap();
        let descriptor = model
            .select(
                "linux",
                "amd64",
                "temurin",
                &VersionExpression::parse("17.0.3"),
            )
            .unwrap();
        assert_eq!(descriptor.version, "17.0.3");
        assert_eq!(descriptor.url, "https://example.com/temurin-17.0.3.tar.gz");
    }

    #[test]
    fn select_on_unknown_vendor_returns_none() {
        let model = IndexModel::build(&sample_index()).unwrap();
        assert!(model
            .select("linux", "amd64", "nonexistent", &VersionExpression::Any)
            .is_none());
    }

    #[test]
    fn versions_are_sorted_ascending() {
        let model = IndexModel::build(&sample_index()).unwrap();
        let versions = model.versions("linux", "amd64", "temurin");
        assert_eq!(versions, vec!["11.0.18", "17.0.3"]);
    }
}
