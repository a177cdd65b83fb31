//! Consent record and cookie categories.
//!
//! A [`ConsentRecord`] is the visitor's whole decision: one flag per
//! [`Category`] plus the moment it was saved. Records are replaced wholesale,
//! never edited in place.
//!
//! The stored form is a JSON object:
//!
//! ```json
//! {"essential":true,"analytics":false,"marketing":false,"timestamp":"2026-10-19T09:30:00.000Z"}
//! ```
//!
//! Timestamps are written in UTC with millisecond precision and read back from
//! any RFC 3339 string.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use time::OffsetDateTime;

/// Cookie categories a visitor can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Strictly necessary cookies. Always granted.
    Essential,
    Analytics,
    Marketing,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Essential, Category::Analytics, Category::Marketing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Essential => "essential",
            Category::Analytics => "analytics",
            Category::Marketing => "marketing",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown cookie category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "essential" => Ok(Category::Essential),
            "analytics" => Ok(Category::Analytics),
            "marketing" => Ok(Category::Marketing),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// A visitor's consent decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    #[serde(default = "essential_granted", deserialize_with = "strict_true")]
    pub essential: bool,
    #[serde(default, deserialize_with = "strict_true")]
    pub analytics: bool,
    #[serde(default, deserialize_with = "strict_true")]
    pub marketing: bool,
    /// Set by `ConsentManager::save_consent`; `None` on records that were never saved.
    #[serde(
        default,
        with = "iso_millis::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<OffsetDateTime>,
}

fn essential_granted() -> bool {
    true
}

/// A flag is granted only by a literal `true`; any other JSON value reads as `false`.
fn strict_true<'de, D: serde::Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(matches!(serde_json::Value::deserialize(d)?, serde_json::Value::Bool(true)))
}

impl ConsentRecord {
    /// Creates an unsaved record. Essential cookies are always granted.
    pub fn new(analytics: bool, marketing: bool) -> Self {
        Self {
            essential: true,
            analytics,
            marketing,
            timestamp: None,
        }
    }

    /// Every category granted.
    pub fn accept_all() -> Self {
        Self::new(true, true)
    }

    /// Only essential cookies granted.
    pub fn reject_all() -> Self {
        Self::new(false, false)
    }

    /// Returns whether `category` is granted by this record.
    pub fn allows(&self, category: Category) -> bool {
        match category {
            Category::Essential => true,
            Category::Analytics => self.analytics,
            Category::Marketing => self.marketing,
        }
    }

    /// Returns the moment this record stops being valid.
    ///
    /// `None` for records that were never saved, and for timestamps so far in
    /// the future that `timestamp + expiry` is not representable.
    pub fn expires_at(&self, expiry: time::Duration) -> Option<OffsetDateTime> {
        self.timestamp.and_then(|ts| ts.checked_add(expiry))
    }

    /// A record is expired once `now` is strictly past `timestamp + expiry`.
    /// Records without an expiry moment never expire.
    pub fn is_expired(&self, now: OffsetDateTime, expiry: time::Duration) -> bool {
        self.expires_at(expiry).is_some_and(|at| now > at)
    }

    /// Sets the timestamp, truncated to milliseconds so it survives a round trip through storage.
    pub(crate) fn stamp(&mut self, now: OffsetDateTime) {
        let now = now.to_offset(time::UtcOffset::UTC);
        self.timestamp = Some(now.replace_millisecond(now.millisecond()).unwrap_or(now));
    }
}

/// Serde helpers writing `YYYY-MM-DDTHH:MM:SS.mmmZ` and reading any RFC 3339 timestamp.
pub(crate) mod iso_millis {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::format_description::well_known::Rfc3339;
    use time::macros::format_description;
    use time::{OffsetDateTime, UtcOffset};

    pub fn format(ts: OffsetDateTime) -> Result<String, time::error::Format> {
        ts.to_offset(UtcOffset::UTC).format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ))
    }

    pub fn parse(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
        OffsetDateTime::parse(s, &Rfc3339)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(ts: &Option<OffsetDateTime>, s: S) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => {
                    let formatted = format(*ts).map_err(serde::ser::Error::custom)?;
                    s.serialize_some(&formatted)
                }
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<OffsetDateTime>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => parse(&raw).map(Some).map_err(de::Error::custom),
                None => Ok(None),
            }
        }
    }
}
