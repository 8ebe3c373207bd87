use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in patch payloads. Use with `#[serde(default)]`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_some")]
        topic_id: Option<Option<i32>>,
    }

    #[test]
    fn test_absent_null_and_value() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.topic_id, None);

        let null: Patch = serde_json::from_str(r#"{"topic_id": null}"#).unwrap();
        assert_eq!(null.topic_id, Some(None));

        let value: Patch = serde_json::from_str(r#"{"topic_id": 4}"#).unwrap();
        assert_eq!(value.topic_id, Some(Some(4)));
    }
}
