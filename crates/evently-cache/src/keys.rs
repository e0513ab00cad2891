//! Cache key generation.
//!
//! Keys are plain strings so they stay readable in `redis-cli`:
//!
//! - list reads: `<model>_list:<digest of the filter set>`
//! - detail reads: `<model>_detail_<id>`
//! - GraphQL operations: `gql_<sha256 of the operation signature>`

use std::collections::BTreeSet;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Query parameters that page or format a list without filtering it.
pub const EXCLUDED_LIST_PARAMS: &[&str] = &["page", "page_size", "format"];

/// Operation name used for unnamed GraphQL operations.
///
/// Not a legal GraphQL name, so it cannot collide with a real operation.
pub const ANONYMOUS_OPERATION: &str = "<anonymous>";

const GRAPHQL_NAMESPACE: &str = "gql_";

/// Key for a filtered list read of `model`.
///
/// Control parameters are dropped and the remaining pairs form a set, so
/// parameter order and exact repeats never change the key.
pub fn list_key<I, K, V>(model: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let filters: BTreeSet<(String, String)> = params
        .into_iter()
        .filter(|(name, _)| !EXCLUDED_LIST_PARAMS.contains(&name.as_ref()))
        .map(|(name, value)| (name.as_ref().to_owned(), value.as_ref().to_owned()))
        .collect();

    format!("{model}_list:{}", hash_filters(&filters))
}

/// Key for a single-entity read.
pub fn detail_key(model: &str, id: &str) -> String {
    format!("{model}_detail_{id}")
}

/// Key for a GraphQL operation.
pub fn gql_key(operation_name: Option<&str>, variables: &Value, query: &str) -> String {
    let operation = operation_name
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS_OPERATION);
    let variables = canonical_json(variables).to_string();

    let mut hasher = Sha256::new();
    for part in ["graphql", operation, variables.as_str(), query] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }

    format!("{GRAPHQL_NAMESPACE}{}", hex::encode(hasher.finalize()))
}

/// Pattern matching every list key of `model`.
pub fn list_pattern(model: &str) -> String {
    format!("{model}_list:*")
}

/// Pattern matching every cached GraphQL operation.
pub fn gql_pattern() -> String {
    format!("{GRAPHQL_NAMESPACE}*")
}

/// Prepends a deployment namespace to a key or pattern.
pub fn namespaced(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}:{key}")
    }
}

/// Short digest of a filter set, stable across processes.
pub fn hash_filters(filters: &BTreeSet<(String, String)>) -> String {
    // A BTreeSet serializes in sorted order, which makes the encoding canonical.
    let encoded = serde_json::to_vec(filters).unwrap_or_default();
    let digest = Sha256::digest(&encoded);
    hex::encode(&digest[..16])
}

/// Returns `value` with every object's keys sorted, recursively.
pub fn canonical_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonical_json(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_json).collect()),
        other => other.clone(),
    }
}

/// Glob match where `*` stands for any run of characters.
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return key.is_empty();
    };
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };

    let middle: Vec<&str> = parts.collect();
    let Some((last, inner)) = middle.split_last() else {
        // No wildcard at all.
        return rest.is_empty();
    };

    for segment in inner {
        if segment.is_empty() {
            continue;
        }
        match rest.find(segment) {
            Some(at) => rest = &rest[at + segment.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}

/// The parts of a GraphQL request that decide its cached result.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationSignature {
    pub operation_name: Option<String>,
    pub variables: Value,
    pub query: String,
}

impl OperationSignature {
    pub fn new(operation_name: Option<String>, variables: Value, query: impl Into<String>) -> Self {
        Self {
            operation_name,
            variables,
            query: query.into(),
        }
    }

    pub fn key(&self) -> String {
        gql_key(self.operation_name.as_deref(), &self.variables, &self.query)
    }
}
