use indexmap::IndexMap;
use url::form_urlencoded;

use super::settings::SettingsState;

/// Parses a `location.search` string (leading `?` optional) into ordered key/value pairs.
/// Later duplicates win.
pub fn parse(search: &str) -> IndexMap<String, String> {
    let search = search.strip_prefix('?').unwrap_or(search);
    form_urlencoded::parse(search.as_bytes())
        .into_owned()
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Flat `key=value` encoding of every setting
pub fn serialize(state: &SettingsState) -> String {
    serialize_pairs(state.iter().map(|(k, v)| (k.as_str(), v.to_string())))
}

pub fn serialize_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, &value);
    }
    serializer.finish()
}

/// `path?query`, or the bare path when the query is empty
pub fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::settings::{SettingDescriptor, SettingDescriptors};

    #[test]
    fn test_parse_strips_question_mark() {
        let params = parse("?force=12&blend=lighter&trails=true");
        assert_eq!(params.get("force").map(String::as_str), Some("12"));
        assert_eq!(params.get("blend").map(String::as_str), Some("lighter"));
        assert_eq!(params.get("trails").map(String::as_str), Some("true"));
        assert!(parse("").is_empty());
        assert!(parse("?").is_empty());
    }

    #[test]
    fn test_parse_decodes() {
        let params = parse("color=%2369d2e7&name=hello+world");
        assert_eq!(params.get("color").map(String::as_str), Some("#69d2e7"));
        assert_eq!(params.get("name").map(String::as_str), Some("hello world"));
    }

    #[test]
    fn test_serialize_then_resolve_is_stable() {
        let descriptors = SettingDescriptors::new()
            .add("force", SettingDescriptor::number(7.5).min(2.0).max(30.0))
            .add("decay", SettingDescriptor::number(0.96))
            .add("trails", SettingDescriptor::boolean(false))
            .add("label", SettingDescriptor::text("sand & sea"))
            .add("tint", SettingDescriptor::color("#ff4e50"));

        let state = descriptors.resolve(None).unwrap();
        let query = serialize(&state);
        let again = descriptors.resolve(Some(&parse(&query))).unwrap();

        assert_eq!(state, again);
    }

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("/", ""), "/");
        assert_eq!(with_query("/sketch", "a=1"), "/sketch?a=1");
    }
}
