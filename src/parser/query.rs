//! Query-string decoding and canonical encoding.

use std::collections::{BTreeMap, HashMap};

/// Decode a query string with form-urlencoded rules.
///
/// Repeated keys keep the last value; pairs with an empty key are dropped.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Encode parameters sorted by key, so equal maps always encode the same way.
pub fn sorted_query_string(params: &HashMap<String, String>) -> String {
    let sorted: BTreeMap<&str, &str> = params
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(sorted)
        .finish()
}
