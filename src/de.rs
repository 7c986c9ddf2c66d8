use serde::{Deserialize, Deserializer};

/// Decode a field where `null` means the same as a missing value.
///
/// Combine with `#[serde(default)]` so absent fields are handled as well.
pub(crate) fn null_as_default<'de, D, T>(input: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(input)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Request {
        #[serde(deserialize_with = "null_as_default")]
        name: String,
        #[serde(deserialize_with = "null_as_default")]
        tags: Vec<String>,
        #[serde(deserialize_with = "null_as_default")]
        headers: BTreeMap<String, String>,
    }

    #[test]
    fn null_and_missing_fields_default() {
        let request: Request =
            serde_json::from_str(r#"{"name": null, "tags": null}"#).unwrap();

        assert_eq!(request.name, "");
        assert!(request.tags.is_empty());
        assert!(request.headers.is_empty());
    }

    #[test]
    fn present_fields_are_kept() {
        let request: Request =
            serde_json::from_str(r#"{"name": "a", "tags": ["b"], "headers": {"c": "d"}}"#)
                .unwrap();

        assert_eq!(request.name, "a");
        assert_eq!(request.tags, vec!["b".to_string()]);
        assert_eq!(request.headers["c"], "d");
    }

    #[test]
    fn wrong_types_are_still_rejected() {
        let _ = serde_json::from_str::<Request>(r#"{"tags": "not a list"}"#)
            .expect_err("expected a type error");
    }
}
