//! Sitemap entry model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relative priority of a URL within a site, in `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Deserialize)]
#[serde(try_from = "f64")]
pub struct Priority(f64);

impl Priority {
    /// Priority assumed by crawlers when none is given.
    pub const DEFAULT: Self = Self(0.5);

    /// Create a priority, rejecting values outside `[0.0, 1.0]` and NaN.
    pub fn new(value: f64) -> Result<Self, InvalidPriority> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidPriority(value))
        }
    }

    /// Raw value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for Priority {
    type Error = InvalidPriority;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority outside of `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("priority must be between 0.0 and 1.0, got {0}")]
pub struct InvalidPriority(pub f64);

/// How frequently the page is likely to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    /// Name as written in `<changefreq>`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeFrequency {
    type Err = UnknownChangeFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            other => Err(UnknownChangeFrequency(other.to_owned())),
        }
    }
}

/// Change frequency name that is not part of the sitemap protocol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown change frequency {0:?}")]
pub struct UnknownChangeFrequency(pub String);

/// A single `<url>` record of a sitemap page.
///
/// Built once with the `with_*` methods and never modified afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    location: String,
    priority: Option<Priority>,
    change_frequency: Option<ChangeFrequency>,
    last_modified: Option<DateTime<Utc>>,
}

impl Entry {
    /// Create an entry for an absolute URL with no optional metadata.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            priority: None,
            change_frequency: None,
            last_modified: None,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_change_frequency(mut self, change_frequency: ChangeFrequency) -> Self {
        self.change_frequency = Some(change_frequency);
        self
    }

    #[must_use]
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Absolute URL of the resource.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Priority set by the caller, if any.
    #[must_use]
    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    /// Priority a crawler applies: the explicit one or [`Priority::DEFAULT`].
    #[must_use]
    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }

    #[must_use]
    pub fn change_frequency(&self) -> Option<ChangeFrequency> {
        self.change_frequency
    }

    #[must_use]
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_bounds() {
        assert!(Priority::new(0.0).is_ok());
        assert!(Priority::new(1.0).is_ok());
        assert_eq!(Priority::new(1.5), Err(InvalidPriority(1.5)));
        assert!(Priority::new(-0.1).is_err());
        assert!(Priority::new(f64::NAN).is_err());
    }

    #[test]
    fn test_priority_display() {
        assert_eq!(Priority::DEFAULT.to_string(), "0.5");
        assert_eq!(Priority::new(0.25).unwrap().to_string(), "0.25");
        assert_eq!(Priority::new(1.0).unwrap().to_string(), "1");
    }

    #[test]
    fn test_priority_deserialize_rejects_out_of_range() {
        #[derive(Deserialize)]
        struct Wrapper {
            priority: Priority,
        }

        let ok: Wrapper = toml::from_str("priority = 0.8").unwrap();
        assert_eq!(ok.priority.value(), 0.8);

        let err = toml::from_str::<Wrapper>("priority = 2.0");
        assert!(err.is_err());
    }

    #[test]
    fn test_change_frequency_round_trips_through_str() {
        for freq in [
            ChangeFrequency::Always,
            ChangeFrequency::Hourly,
            ChangeFrequency::Daily,
            ChangeFrequency::Weekly,
            ChangeFrequency::Monthly,
            ChangeFrequency::Yearly,
            ChangeFrequency::Never,
        ] {
            assert_eq!(freq.as_str().parse::<ChangeFrequency>(), Ok(freq));
        }
        assert_eq!(
            "fortnightly".parse::<ChangeFrequency>(),
            Err(UnknownChangeFrequency("fortnightly".to_owned()))
        );
    }

    #[test]
    fn test_entry_effective_priority_defaults() {
        let entry = Entry::new("http://x/a");
        assert_eq!(entry.priority(), None);
        assert_eq!(entry.effective_priority(), Priority::DEFAULT);

        let entry = entry.with_priority(Priority::new(0.9).unwrap());
        assert_eq!(entry.effective_priority().value(), 0.9);
    }
}
