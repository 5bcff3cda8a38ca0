//! Version ordering for `min_version` checks.
//!
//! Package managers report versions like `1.18.0-6ubuntu14.4` or
//! `2:8.1.2-1ubuntu2`. Comparison here is deliberately simple: an optional
//! numeric epoch (`N:` prefix), then the numeric runs of the remainder
//! compared segment by segment. Non-numeric suffixes are kept for display
//! but do not participate in ordering.

use std::cmp::Ordering;
use std::fmt;

/// A parsed package version.
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    segments: Vec<u64>,
    raw: String,
}

impl Version {
    /// Parse a version string. Never fails; a string with no digits
    /// compares below every versioned release.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        let (epoch, rest) = match s.split_once(':') {
            Some((e, rest)) => match e.parse::<u64>() {
                Ok(epoch) => (epoch, rest),
                Err(_) => (0, s),
            },
            None => (0, s),
        };

        let mut segments = Vec::new();
        let mut current: Option<u64> = None;
        for ch in rest.chars() {
            if let Some(d) = ch.to_digit(10) {
                current = Some(
                    current
                        .unwrap_or(0)
                        .saturating_mul(10)
                        .saturating_add(u64::from(d)),
                );
            } else if let Some(seg) = current.take() {
                segments.push(seg);
            }
        }
        if let Some(seg) = current {
            segments.push(seg);
        }

        Self {
            epoch,
            segments,
            raw: s.to_string(),
        }
    }

    /// The original version string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.epoch != other.epoch {
            return self.epoch.cmp(&other.epoch);
        }
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            if a != b {
                return a.cmp(&b);
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_ordering() {
        assert!(Version::parse("1.18.0") < Version::parse("1.20.1"));
        assert!(Version::parse("2.0") > Version::parse("1.99.99"));
        assert_eq!(Version::parse("1.18"), Version::parse("1.18.0"));
    }

    #[test]
    fn test_distro_suffixes_ignored() {
        assert_eq!(
            Version::parse("1.18.0-6ubuntu14").cmp(&Version::parse("1.18.0-6ubuntu14.0")),
            // "ubuntu14" contributes its numeric run, so pad-with-zero applies
            std::cmp::Ordering::Equal
        );
        assert!(Version::parse("8.1.2-1ubuntu2") >= Version::parse("8.1"));
    }

    #[test]
    fn test_epoch_dominates() {
        assert!(Version::parse("2:1.0") > Version::parse("1:9.9"));
        assert!(Version::parse("1:0.1") > Version::parse("99.0"));
    }

    #[test]
    fn test_no_digits_sorts_lowest() {
        assert!(Version::parse("unknown") < Version::parse("0.0.1"));
    }

    #[test]
    fn test_oversized_numeric_run_saturates() {
        // 25 digits exceeds u64; the segment clamps instead of overflowing.
        let huge = Version::parse("9999999999999999999999999.1");
        assert!(huge > Version::parse("1.0"));
        assert_eq!(huge, Version::parse("9999999999999999999999998.1"));
    }

    #[test]
    fn test_display_preserves_raw() {
        assert_eq!(Version::parse(" 1.2.3 ").to_string(), "1.2.3");
    }
}
