use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Treats `?department_id=` the same as an absent parameter.
pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub fn deserialize_optional_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i32>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Filter {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        department_id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_i32")]
        year: Option<i32>,
    }

    #[test]
    fn empty_strings_are_none() {
        let f: Filter = serde_json::from_str(r#"{"department_id":"","year":""}"#).unwrap();
        assert!(f.department_id.is_none());
        assert!(f.year.is_none());
    }

    #[test]
    fn values_parse() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"department_id":"{}","year":"2"}}"#, id);
        let f: Filter = serde_json::from_str(&json).unwrap();
        assert_eq!(f.department_id, Some(id));
        assert_eq!(f.year, Some(2));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<Filter>(r#"{"year":"second"}"#).is_err());
    }
}
