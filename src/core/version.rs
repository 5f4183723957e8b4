use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("invalid semver version '{0}'")]
    InvalidVersion(String),
    #[error("invalid version constraint '{0}'")]
    InvalidConstraint(String),
}

pub type VersionResult<T> = std::result::Result<T, VersionError>;

/// A declared package version. Must parse as full semver; the raw text is
/// kept because it is what gets written into the emitted descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub raw: String,
    pub semver: semver::Version,
}

impl Version {
    pub fn parse(raw: impl Into<String>) -> VersionResult<Self> {
        let raw = raw.into();
        let semver = semver::Version::parse(&raw)
            .map_err(|_| VersionError::InvalidVersion(raw.clone()))?;
        Ok(Self { raw, semver })
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Pinned,
    Ranged,
}

/// A version constraint on a requirement edge. Either an exact pin
/// (`"0.1.0"`) or a range: Conan bracket syntax (`"[>=0.1.0 <2]"`) or a bare
/// range expression (`">=0.1.0"`, `"^0.1"`). The raw text is preserved
/// verbatim for emission; pinned-policy compatibility compares it textually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub raw: String,
    pub kind: ConstraintKind,
    pub req: semver::VersionReq,
    pub pin: Option<semver::Version>,
}

impl Constraint {
    pub fn parse(raw: impl Into<String>) -> VersionResult<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.contains("||") {
            return Err(VersionError::InvalidConstraint(raw));
        }

        if let Some(inner) = strip_brackets(trimmed) {
            let req = parse_range(inner).ok_or(VersionError::InvalidConstraint(raw.clone()))?;
            return Ok(Self {
                raw,
                kind: ConstraintKind::Ranged,
                req,
                pin: None,
            });
        }

        if let Ok(version) = semver::Version::parse(trimmed) {
            let req = semver::VersionReq::parse(&format!("={trimmed}"))
                .map_err(|_| VersionError::InvalidConstraint(raw.clone()))?;
            return Ok(Self {
                raw,
                kind: ConstraintKind::Pinned,
                req,
                pin: Some(version),
            });
        }

        let req = parse_range(trimmed).ok_or(VersionError::InvalidConstraint(raw.clone()))?;
        Ok(Self {
            raw,
            kind: ConstraintKind::Ranged,
            req,
            pin: None,
        })
    }

    pub fn is_pinned(&self) -> bool {
        self.kind == ConstraintKind::Pinned
    }

    pub fn matches(&self, version: &semver::Version) -> bool {
        self.req.matches(version)
    }

    /// Whether some version could satisfy both constraints at once. A pin is
    /// a single-point range.
    pub fn overlaps(&self, other: &Constraint) -> bool {
        match (req_interval(&self.req), req_interval(&other.req)) {
            (Some(a), Some(b)) => a.intersects(&b),
            _ => false,
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn strip_brackets(raw: &str) -> Option<&str> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;
    Some(inner.trim())
}

/// Conan bracket contents are whitespace-separated comparators; semver wants
/// them comma-separated. Bare expressions may already use commas.
fn parse_range(expr: &str) -> Option<semver::VersionReq> {
    let normalized = if expr.contains(',') {
        expr.to_string()
    } else {
        expr.split_whitespace().collect::<Vec<_>>().join(", ")
    };
    if normalized.is_empty() {
        return None;
    }
    semver::VersionReq::parse(&normalized).ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Bound {
    Unbounded,
    Included(semver::Version),
    Excluded(semver::Version),
}

/// The contiguous interval a conjunction of comparators admits. Every semver
/// comparator admits one interval, and intersecting intervals stays an
/// interval, so a whole `VersionReq` reduces to one of these.
#[derive(Debug, Clone)]
struct Interval {
    lo: Bound,
    hi: Bound,
}

impl Interval {
    fn unbounded() -> Self {
        Self {
            lo: Bound::Unbounded,
            hi: Bound::Unbounded,
        }
    }

    fn intersect(&self, other: &Interval) -> Option<Interval> {
        let lo = tighter_lo(&self.lo, &other.lo).clone();
        let hi = tighter_hi(&self.hi, &other.hi).clone();
        let out = Interval { lo, hi };
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }

    fn intersects(&self, other: &Interval) -> bool {
        self.intersect(other).is_some()
    }

    fn is_empty(&self) -> bool {
        match (&self.lo, &self.hi) {
            (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
            (Bound::Included(lo), Bound::Excluded(hi)) => lo >= hi,
            (Bound::Excluded(lo), Bound::Included(hi)) => lo >= hi,
            (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
            _ => false,
        }
    }
}

fn tighter_lo<'a>(a: &'a Bound, b: &'a Bound) -> &'a Bound {
    match (a, b) {
        (Bound::Unbounded, _) => b,
        (_, Bound::Unbounded) => a,
        (Bound::Included(va), Bound::Included(vb)) | (Bound::Excluded(va), Bound::Excluded(vb)) => {
            if va >= vb {
                a
            } else {
                b
            }
        }
        (Bound::Included(va), Bound::Excluded(vb)) => {
            if va > vb {
                a
            } else {
                b
            }
        }
        (Bound::Excluded(va), Bound::Included(vb)) => {
            if vb > va {
                b
            } else {
                a
            }
        }
    }
}

fn tighter_hi<'a>(a: &'a Bound, b: &'a Bound) -> &'a Bound {
    match (a, b) {
        (Bound::Unbounded, _) => b,
        (_, Bound::Unbounded) => a,
        (Bound::Included(va), Bound::Included(vb)) | (Bound::Excluded(va), Bound::Excluded(vb)) => {
            if va <= vb {
                a
            } else {
                b
            }
        }
        (Bound::Included(va), Bound::Excluded(vb)) => {
            if va < vb {
                a
            } else {
                b
            }
        }
        (Bound::Excluded(va), Bound::Included(vb)) => {
            if vb < va {
                b
            } else {
                a
            }
        }
    }
}

fn req_interval(req: &semver::VersionReq) -> Option<Interval> {
    let mut interval = Interval::unbounded();
    for comparator in &req.comparators {
        interval = interval.intersect(&comparator_interval(comparator))?;
    }
    Some(interval)
}

fn comparator_interval(comp: &semver::Comparator) -> Interval {
    let floor = floor_version(comp);
    match comp.op {
        semver::Op::Exact | semver::Op::Wildcard => match (comp.minor, comp.patch) {
            (Some(_), Some(_)) => Interval {
                lo: Bound::Included(floor.clone()),
                hi: Bound::Included(floor),
            },
            (Some(minor), None) => Interval {
                lo: Bound::Included(floor),
                hi: Bound::Excluded(plain(comp.major, minor + 1, 0)),
            },
            _ => Interval {
                lo: Bound::Included(floor),
                hi: Bound::Excluded(plain(comp.major + 1, 0, 0)),
            },
        },
        semver::Op::Greater => match (comp.minor, comp.patch) {
            (Some(_), Some(_)) => Interval {
                lo: Bound::Excluded(floor),
                hi: Bound::Unbounded,
            },
            (Some(minor), None) => Interval {
                lo: Bound::Included(plain(comp.major, minor + 1, 0)),
                hi: Bound::Unbounded,
            },
            _ => Interval {
                lo: Bound::Included(plain(comp.major + 1, 0, 0)),
                hi: Bound::Unbounded,
            },
        },
        semver::Op::GreaterEq => Interval {
            lo: Bound::Included(floor),
            hi: Bound::Unbounded,
        },
        semver::Op::Less => Interval {
            lo: Bound::Unbounded,
            hi: Bound::Excluded(floor),
        },
        semver::Op::LessEq => match (comp.minor, comp.patch) {
            (Some(_), Some(_)) => Interval {
                lo: Bound::Unbounded,
                hi: Bound::Included(floor),
            },
            (Some(minor), None) => Interval {
                lo: Bound::Unbounded,
                hi: Bound::Excluded(plain(comp.major, minor + 1, 0)),
            },
            _ => Interval {
                lo: Bound::Unbounded,
                hi: Bound::Excluded(plain(comp.major + 1, 0, 0)),
            },
        },
        semver::Op::Tilde => match (comp.minor, comp.patch) {
            (Some(minor), _) => Interval {
                lo: Bound::Included(floor),
                hi: Bound::Excluded(plain(comp.major, minor + 1, 0)),
            },
            _ => Interval {
                lo: Bound::Included(floor),
                hi: Bound::Excluded(plain(comp.major + 1, 0, 0)),
            },
        },
        semver::Op::Caret => {
            let hi = if comp.major > 0 {
                plain(comp.major + 1, 0, 0)
            } else {
                match (comp.minor, comp.patch) {
                    (Some(minor), Some(patch)) if minor == 0 => plain(0, 0, patch + 1),
                    (Some(minor), _) => plain(0, minor + 1, 0),
                    _ => plain(1, 0, 0),
                }
            };
            Interval {
                lo: Bound::Included(floor),
                hi: Bound::Excluded(hi),
            }
        }
        // semver::Op is non_exhaustive; anything new is treated as the loose
        // interval so overlap checks stay conservative.
        _ => Interval::unbounded(),
    }
}

fn floor_version(comp: &semver::Comparator) -> semver::Version {
    let mut version = plain(comp.major, comp.minor.unwrap_or(0), comp.patch.unwrap_or(0));
    version.pre = comp.pre.clone();
    version
}

fn plain(major: u64, minor: u64, patch: u64) -> semver::Version {
    semver::Version::new(major, minor, patch)
}

#[cfg(test)]
mod tests {
    use crate::core::version::{Constraint, ConstraintKind, Version};

    fn constraint(raw: &str) -> Constraint {
        Constraint::parse(raw).expect("parse constraint")
    }

    #[test]
    fn plain_version_parses_as_pin() {
        let pin = constraint("0.1.0");
        assert_eq!(pin.kind, ConstraintKind::Pinned);
        assert_eq!(pin.pin.as_ref().map(|v| v.to_string()), Some("0.1.0".into()));
        assert!(pin.matches(&semver::Version::new(0, 1, 0)));
        assert!(!pin.matches(&semver::Version::new(0, 1, 1)));
    }

    #[test]
    fn bracket_expression_parses_as_range() {
        let range = constraint("[>=0.1.0]");
        assert_eq!(range.kind, ConstraintKind::Ranged);
        assert!(range.matches(&semver::Version::new(0, 1, 0)));
        assert!(range.matches(&semver::Version::new(3, 0, 0)));
    }

    #[test]
    fn bracket_expression_with_two_comparators() {
        let range = constraint("[>=0.1.0 <0.2]");
        assert!(range.matches(&semver::Version::new(0, 1, 5)));
        assert!(!range.matches(&semver::Version::new(0, 2, 0)));
    }

    #[test]
    fn bare_range_expressions_parse() {
        assert_eq!(constraint(">=0.1.0").kind, ConstraintKind::Ranged);
        assert_eq!(constraint("^0.1").kind, ConstraintKind::Ranged);
        assert_eq!(constraint("~1.2.3").kind, ConstraintKind::Ranged);
        assert_eq!(constraint("1.2.*").kind, ConstraintKind::Ranged);
    }

    #[test]
    fn garbage_and_unions_are_rejected() {
        assert!(Constraint::parse("").is_err());
        assert!(Constraint::parse("not a version").is_err());
        assert!(Constraint::parse("[>=0.1.0 || >=2.0.0]").is_err());
        assert!(Constraint::parse("[]").is_err());
    }

    #[test]
    fn identical_pins_overlap() {
        assert!(constraint("0.1.0").overlaps(&constraint("0.1.0")));
    }

    #[test]
    fn distinct_pins_are_disjoint() {
        assert!(!constraint("0.1.0").overlaps(&constraint("0.2.0")));
    }

    #[test]
    fn pin_inside_range_overlaps() {
        assert!(constraint("0.1.0").overlaps(&constraint("[>=0.1.0]")));
        assert!(constraint("[>=0.1.0]").overlaps(&constraint("0.1.0")));
    }

    #[test]
    fn pin_below_range_is_disjoint() {
        assert!(!constraint("0.0.9").overlaps(&constraint("[>=0.1.0]")));
    }

    #[test]
    fn open_ranges_overlap() {
        assert!(constraint("[>=0.1.0]").overlaps(&constraint("[>=2.0.0]")));
        assert!(constraint("[<1.0.0]").overlaps(&constraint("[>=0.5.0]")));
    }

    #[test]
    fn touching_exclusive_bounds_are_disjoint() {
        assert!(!constraint("[<1.0.0]").overlaps(&constraint("[>=1.0.0]")));
        assert!(!constraint("[<=1.0.0]").overlaps(&constraint("[>1.0.0]")));
    }

    #[test]
    fn touching_inclusive_bounds_overlap() {
        assert!(constraint("[<=1.0.0]").overlaps(&constraint("[>=1.0.0]")));
    }

    #[test]
    fn caret_intervals_respect_zero_major() {
        assert!(constraint("^0.1").overlaps(&constraint("[>=0.1.5]")));
        assert!(!constraint("^0.1").overlaps(&constraint("[>=0.2.0]")));
        assert!(!constraint("^0.0.3").overlaps(&constraint("0.0.4")));
    }

    #[test]
    fn tilde_interval_stays_within_minor() {
        assert!(constraint("~1.2.3").overlaps(&constraint("1.2.9")));
        assert!(!constraint("~1.2.3").overlaps(&constraint("1.3.0")));
    }

    #[test]
    fn greater_on_partial_version_skips_whole_prefix() {
        // >1.2 means beyond every 1.2.x, so 1.2.9 is outside it.
        assert!(!constraint(">1.2").overlaps(&constraint("1.2.9")));
        assert!(constraint(">1.2").overlaps(&constraint("1.3.0")));
    }

    #[test]
    fn wildcard_overlaps_its_prefix_only() {
        assert!(constraint("1.2.*").overlaps(&constraint("1.2.7")));
        assert!(!constraint("1.2.*").overlaps(&constraint("1.3.0")));
    }

    #[test]
    fn version_requires_full_semver() {
        assert!(Version::parse("0.1.0").is_ok());
        assert!(Version::parse("0.1").is_err());
        assert!(Version::parse("one").is_err());
    }
}
