use serde::{Deserialize, Deserializer};

/// Form booleans as browsers send them: `"true"` in any case is true,
/// anything else is false.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().eq_ignore_ascii_case("true"))
}
