use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Version assigned to a slot of a content-addressed line.
///
/// Textual form is `"<major>.<minor>"` and doubles as the slot directory
/// name. Ordering is lexicographic on `(major, minor)`, so `"0.10"` sorts
/// after `"0.9"` even though the strings do not.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    /// The version given to the first save into an empty line.
    pub const INITIAL: Self = Self { major: 0, minor: 1 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Same major line, next minor.
    pub fn bump_minor(&self) -> Self {
        Self {
            major: self.major,
            minor: self.minor + 1,
        }
    }

    /// Next major line. Minor restarts at 1, so `0.2` becomes `1.1`.
    pub fn bump_major(&self) -> Self {
        Self {
            major: self.major + 1,
            minor: 1,
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({}.{})", self.major, self.minor)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidVersion(s.to_string());
        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        let version = Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        };
        // Only the canonical spelling names a slot: "01.1" and "+1.1" do not.
        if version.to_string() != s {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

impl TryFrom<String> for Version {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_is_zero_one() {
        assert_eq!(Version::INITIAL.to_string(), "0.1");
        assert_eq!(Version::default(), Version::INITIAL);
    }

    #[test]
    fn bump_minor_keeps_major() {
        let v = Version::new(3, 4).bump_minor();
        assert_eq!(v, Version::new(3, 5));
    }

    #[test]
    fn bump_major_restarts_minor() {
        assert_eq!(Version::new(0, 2).bump_major(), Version::new(1, 1));
        assert_eq!(Version::new(4, 17).bump_major(), Version::new(5, 1));
    }

    #[test]
    fn ordering_is_numeric_not_textual() {
        assert!(Version::new(0, 9) < Version::new(0, 10));
        assert!(Version::new(0, 99) < Version::new(1, 1));
    }

    #[test]
    fn parse_display_agree() {
        let v: Version = "12.3".parse().unwrap();
        assert_eq!(v, Version::new(12, 3));
        assert_eq!(v.to_string(), "12.3");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "1", "1.", ".1", "a.b", "1.2.3", "-1.0", "01.1", "1.01", "+1.1", " 1.1"] {
            assert!(bad.parse::<Version>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn serde_uses_textual_form() {
        let json = serde_json::to_string(&Version::new(2, 7)).unwrap();
        assert_eq!(json, "\"2.7\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Version::new(2, 7));
    }

    mod laws {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bumps_move_forward(major in 0u32..1000, minor in 0u32..1000) {
                let v = Version::new(major, minor);
                prop_assert!(v.bump_minor() > v);
                prop_assert!(v.bump_major() > v);
                prop_assert!(v.bump_major() > Version::new(major, u32::MAX));
            }
        }
    }
}
