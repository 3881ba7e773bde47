// Raffle Draw Engine - Utility Functions
use chrono::Utc;
use rand::RngCore;

use crate::state::UnixTimestamp;

/// Current wall-clock time in milliseconds
pub fn now() -> UnixTimestamp {
    Utc::now().timestamp_millis()
}

/// Generate an identifier for a new draw
pub fn new_draw_id() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("draw-{}", hex::encode(bytes))
}

/// Quote a field for delimited text if it contains the delimiter, a quote or a line break.
pub fn escape_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Serde adapter rendering millisecond timestamps as RFC 3339 strings.
pub mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        match Utc.timestamp_millis_opt(*ts).single() {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => Err(ser::Error::custom("timestamp out of range")),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.timestamp_millis())
            .map_err(de::Error::custom)
    }
}

/// Optional variant of [`rfc3339_millis`]
pub mod rfc3339_millis_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => super::rfc3339_millis::serialize(ts, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "super::rfc3339_millis")] i64);

        let wrapper = Option::<Wrapper>::deserialize(deserializer)?;
        Ok(wrapper.map(|Wrapper(ts)| ts))
    }
}
