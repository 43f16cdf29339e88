//! The Resolver (`spec.md` §4.4): turns `(vendor, version-expression, os,
//! arch)` plus an [`IndexModel`] into a single `ArchiveDescriptor`, or a
//! structured [`JdkNotFoundError`]. Pure and deterministic, grounded on
//! the same shape as `avm`'s `general_tool.rs` version-filter-then-pick
//! flow, generalized to the vendor-then-version two-stage lookup `spec.md`
//! requires.

use crate::archive::ArchiveDescriptor;
use crate::error::JdkNotFoundError;
use crate::index::IndexModel;
use crate::version::VersionExpression;

pub fn resolve(
    vendor: &str,
    expr: &VersionExpression,
    os: &str,
    arch: &str,
    index: &IndexModel,
) -> Result<ArchiveDescriptor, JdkNotFoundError> {
    let not_found = || JdkNotFoundError {
        vendor: vendor.into(),
        expr: expr.to_string().into(),
        os: os.into(),
        arch: arch.into(),
    };

    if !index.vendors(os, arch).iter().any(|v| v == vendor) {
        return Err(not_found());
    }

    index.select(os, arch, vendor, expr).ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> IndexModel {
        let raw = serde_json::json!({
            "linux": {
                "amd64": {
                    "temurin": {
                        "17.0.3": "https://example.com/temurin-17.0.3.tar.gz",
                        "11.0.18": "https://example.com/temurin-11.0.18.tar.gz"
                    }
                }
            }
        });
        IndexModel::build(&raw).unwrap()
    }

    #[test]
    fn resolves_greatest_matching_version() {
        let index = sample_index();
        let descriptor = resolve(
            "temurin",
            &VersionExpression::Any,
            "linux",
            "amd64",
            &index,
        )
        .unwrap();
        assert_eq!(descriptor.version, "17.0.3");
    }

    #[test]
    fn unknown_vendor_is_jdk_not_found() {
        let index = sample_index();
        let err = resolve(
            "nonexistent",
            &VersionExpression::Any,
            "linux",
            "amd64",
            &index,
        )
        .unwrap_err();
        assert_eq!(err.vendor, "nonexistent");
    }

    #[test]
    fn no_matching_version_is_jdk_not_found() {
        let index = sample_index();
        let expr = VersionExpression::parse("99");
        let err = resolve("temurin", &expr, "linux", "amd64", &index).unwrap_err();
        assert_eq!(err.vendor, "temurin");
    }
}
