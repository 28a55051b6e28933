use chrono::NaiveDateTime;
use model::Gender;
use serde::{Deserialize, Deserializer};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub(crate) fn timestamp<'de, D>(de: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(de)?;
    NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT)
        .map_err(serde::de::Error::custom)
}

/// Empty cells and the `\N` marker used by some exports become `None`.
pub(crate) fn optional_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(de)?;
    Ok(text.filter(|text| !text.is_empty() && text != "\\N"))
}

pub(crate) fn optional_int<'de, D>(de: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(de)?;
    Ok(text.and_then(|text| text.trim().parse().ok()))
}

pub(crate) fn optional_float<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(de)?;
    Ok(text.and_then(|text| text.trim().parse().ok()))
}

/// Gender arrives as a numeric code; anything unparseable counts as
/// "other", not as a malformed row.
pub(crate) fn gender_code<'de, D>(de: D) -> Result<Gender, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(de)?;
    let code = text.and_then(|text| text.trim().parse::<i64>().ok());
    Ok(Gender::from_code(code))
}
