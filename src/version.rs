//! Version Algebra: parsing and vendor-aware comparison of JDK version
//! strings, and the small expression language (`exact`, `atLeast`, `any`)
//! used to select among them.

use std::cmp::Ordering;
use std::fmt;

use smol_str::SmolStr;

/// One component of a parsed [`Version`]: either a run of ASCII digits or a
/// run of anything else, split at `.`/`-` boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionComponent {
    Numeric(u64),
    Text(SmolStr),
}

impl VersionComponent {
    fn rank(&self) -> u8 {
        match self {
            VersionComponent::Numeric(_) => 1,
            VersionComponent::Text(_) => 0,
        }
    }
}

impl Ord for VersionComponent {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (VersionComponent::Numeric(a), VersionComponent::Numeric(b)) => a.cmp(b),
            (VersionComponent::Text(a), VersionComponent::Text(b)) => a.cmp(b),
            // Numeric outranks string when types differ.
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for VersionComponent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionComponent::Numeric(n) => write!(f, "{n}"),
            VersionComponent::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A version string split into numeric/string components. `.` and `-` are
/// treated as equivalent separators. Comparison never looks at the
/// original string, only at this component sequence, so normalization
/// (the `1.` strip) happens before a `Version` is built, not inside
/// `Ord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(Vec<VersionComponent>);

impl Version {
    pub fn components(&self) -> &[VersionComponent] {
        &self.0
    }

    /// Splits `s` on `.` and `-`, turning each run of digits into a
    /// [`VersionComponent::Numeric`] and everything else into a
    /// [`VersionComponent::Text`]. Empty input parses to a single empty
    /// text component, which compares less than any non-empty version.
    pub fn parse(s: &str) -> Version {
        if s.is_empty() {
            return Version(vec![VersionComponent::Text(SmolStr::new(""))]);
        }

        let mut components = Vec::new();
        for part in s.split(['.', '-']) {
            components.push(split_alnum_run(part));
        }
        Version(components.into_iter().flatten().collect())
    }

    /// Strips a leading `1.` component pair (i.e. the leading numeric `1`
    /// component) unless `vendor` contains `graalvm`, per `spec.md` §3.
    pub fn normalized_for_vendor(s: &str, vendor: &str) -> Version {
        let v = Version::parse(s);
        if vendor.to_ascii_lowercase().contains("graalvm") {
            return v;
        }
        if v.0.first() == Some(&VersionComponent::Numeric(1)) && v.0.len() > 1 {
            Version(v.0[1..].to_vec())
        } else {
            v
        }
    }

    /// Total order used throughout the resolver: component-wise, numeric
    /// vs numeric by magnitude, string vs string lexicographically,
    /// numeric outranks string on type mismatch, shorter prefix is less
    /// than its extension.
    pub fn compare(&self, other: &Version) -> Ordering {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            let ord = a.cmp(b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.0.len().cmp(&other.0.len())
    }

    /// `true` iff `self` is `prefix` followed immediately by a component
    /// boundary (i.e. `prefix` is a strict or non-strict leading run of
    /// `self`'s components).
    pub fn starts_with(&self, prefix: &Version) -> bool {
        if prefix.0.len() > self.0.len() {
            return false;
        }
        self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Splits one `.`/`-`-delimited chunk into alternating digit/non-digit
/// runs, e.g. `"0_352"` -> `[Numeric(0), Text("_"), Numeric(352)]`.
fn split_alnum_run(part: &str) -> Vec<VersionComponent> {
    if part.is_empty() {
        return vec![VersionComponent::Text(SmolStr::new(""))];
    }

    let mut out = Vec::new();
    let mut chars = part.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        let is_digit = c.is_ascii_digit();
        let mut end = start + c.len_utf8();
        chars.next();
        while let Some(&(idx, c2)) = chars.peek() {
            if c2.is_ascii_digit() == is_digit {
                end = idx + c2.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let run = &part[start..end];
        if is_digit {
            // A run of digits too long for u64 is vanishingly unlikely in
            // practice (JDK build numbers); saturate rather than panic.
            out.push(VersionComponent::Numeric(run.parse().unwrap_or(u64::MAX)));
        } else {
            out.push(VersionComponent::Text(SmolStr::new(run)));
        }
    }
    out
}

/// One of the three selector shapes from `spec.md` §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionExpression {
    Exact(SmolStr),
    AtLeast(SmolStr),
    Any,
}

impl VersionExpression {
    /// Trailing `+` -> `AtLeast`; empty -> `Any`; otherwise `Exact`. Dots
    /// and dashes are left untouched; normalization happens at compare
    /// time in [`VersionExpression::matches`].
    pub fn parse(s: &str) -> VersionExpression {
        if s.is_empty() {
            return VersionExpression::Any;
        }
        if let Some(stripped) = s.strip_suffix('+') {
            return VersionExpression::AtLeast(SmolStr::new(stripped));
        }
        VersionExpression::Exact(SmolStr::new(s))
    }

    pub fn matches(&self, candidate: &str, vendor: &str) -> bool {
        match self {
            VersionExpression::Any => true,
            VersionExpression::AtLeast(v) => {
                if v.is_empty() {
                    return true;
                }
                let want = Version::normalized_for_vendor(v, vendor);
                let have = Version::normalized_for_vendor(candidate, vendor);
                have.compare(&want) != Ordering::Less
            }
            VersionExpression::Exact(v) => {
                let want = Version::normalized_for_vendor(v, vendor);
                let have = Version::normalized_for_vendor(candidate, vendor);
                have == want || have.starts_with(&want)
            }
        }
    }
}

impl fmt::Display for VersionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionExpression::Any => Ok(()),
            VersionExpression::AtLeast(v) => write!(f, "{v}+"),
            VersionExpression::Exact(v) => write!(f, "{v}"),
        }
    }
}
