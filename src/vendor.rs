//! Vendor-name normalization rules applied by the Index Model (`spec.md`
//! §4.2, transform 1). Kept as a small data table, the way `avm`'s
//! `liberica.rs` keeps its DTO os/arch/bitness correspondences as a fixed
//! `Vec<(&'static str, &'static str, u32)>` rather than a hardcoded match.

use smol_str::SmolStr;

/// A vendor-prefix merge rule: any index vendor key starting with `prefix`
/// is rewritten to `canonical`, and the stripped suffix becomes a trailing
/// dashed version component.
pub struct VendorMergeRule {
    pub prefix: &'static str,
    pub canonical: &'static str,
}

/// At minimum the `ibm-semeru-openj9-java*` family named in `spec.md`
/// §3/§4.2. Additional prefixes can be appended here without touching the
/// merge logic itself.
pub const MERGE_RULES: &[VendorMergeRule] = &[VendorMergeRule {
    prefix: "ibm-semeru-openj9-java",
    canonical: "ibm-semeru-openj9",
}];

/// Outcome of matching a raw index vendor key against [`MERGE_RULES`].
pub struct MergedVendor {
    pub canonical: SmolStr,
    /// The suffix stripped off the raw vendor key (e.g. `"java17"`),
    /// `None` when no rule matched.
    pub version_suffix: Option<SmolStr>,
}

/// Applies the suffix-merge rules to one raw vendor key from the index.
/// Vendor keys that match no rule pass through unchanged.
pub fn merge_vendor(raw_vendor: &str) -> MergedVendor {
    for rule in MERGE_RULES {
        if let Some(suffix) = raw_vendor.strip_prefix(rule.prefix) {
            if !suffix.is_empty() {
                return MergedVendor {
                    canonical: SmolStr::new(rule.canonical),
                    version_suffix: Some(SmolStr::new(format!("{}{suffix}", rule_suffix_sep(rule, suffix)))),
                };
            }
        }
    }
    MergedVendor {
        canonical: SmolStr::new(raw_vendor),
        version_suffix: None,
    }
}

/// `ibm-semeru-openj9-java17` strips to suffix `17`; `spec.md` wants the
/// merged version component to read `java17`, so we re-prepend the part of
/// the prefix after the canonical name (`"java"`) ahead of the numeric
/// suffix. This keeps the rule table generic instead of hardcoding the
/// `"java"` word at the call site.
fn rule_suffix_sep(rule: &VendorMergeRule, _suffix: &str) -> &'static str {
    debug_assert!(rule.prefix.starts_with(rule.canonical));
    // Skip the dash separating `canonical` from the rest of `prefix`: the
    // caller already re-joins this with a dash against the raw version.
    &rule.prefix[rule.canonical.len() + 1..]
}
