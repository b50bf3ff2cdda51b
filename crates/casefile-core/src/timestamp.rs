//! Fixed-format UTC timestamps.
//!
//! Evidence is hashed and persisted using a single representation:
//! RFC 3339, UTC, `Z` suffix, exactly six fractional digits. Anything finer
//! than a microsecond is truncated on the way in, so a value that has been
//! through storage hashes identically to the value before it.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer, de};

/// Truncate to microsecond precision.
pub fn normalize(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

/// The current time, already normalised.
pub fn now() -> DateTime<Utc> { normalize(Utc::now()) }

pub fn format(dt: DateTime<Utc>) -> String {
  normalize(dt).to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
  DateTime::parse_from_rfc3339(s).map(|dt| normalize(dt.with_timezone(&Utc)))
}

/// `#[serde(with = "crate::timestamp")]` adapter.
pub fn serialize<S: Serializer>(
  dt: &DateTime<Utc>,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(&format(*dt))
}

pub fn deserialize<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
  let s = String::deserialize(deserializer)?;
  parse(&s).map_err(de::Error::custom)
}

/// Adapter for optional timestamps.
pub mod option {
  use chrono::{DateTime, Utc};
  use serde::{Deserialize, Deserializer, Serializer, de};

  pub fn serialize<S: Serializer>(
    dt: &Option<DateTime<Utc>>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match dt {
      Some(dt) => serializer.serialize_some(&super::format(*dt)),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<DateTime<Utc>>, D::Error> {
    Option::<String>::deserialize(deserializer)?
      .map(|s| super::parse(&s).map_err(de::Error::custom))
      .transpose()
  }
}
