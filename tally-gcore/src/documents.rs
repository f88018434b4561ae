//! Readers for the upstream JSON documents.

use std::time::Duration;

use serde_json::Value;
use tally_core::{Credential, JobId, ProductType, TallyError};

fn first_str<'a>(doc: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| doc.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Token and lifetime from a login answer.
///
/// The token is read from `access`, then `access_token`; the lifetime from a
/// positive numeric `expires_in`, falling back to `default_valid_for`.
pub(crate) fn credential_from_login(
    doc: &Value,
    default_valid_for: Duration,
) -> Result<Credential, TallyError> {
    let token = first_str(doc, &["access", "access_token"])
        .ok_or_else(|| TallyError::protocol("login", "no access token in login answer"))?;
    let valid_for = doc
        .get("expires_in")
        .and_then(Value::as_f64)
        .filter(|s| s.is_finite() && *s > 0.0)
        .map_or(default_valid_for, Duration::from_secs_f64);
    Ok(Credential::issued_now(token, valid_for))
}

/// Feature identifiers of `product` from the feature catalog.
///
/// The catalog is an array, or an object wrapping one under `results`, `data`
/// or `items`. Items name their product under `product_name_en`,
/// `productNameEn` or `product`.
pub(crate) fn feature_ids_for(doc: &Value, product: ProductType) -> Result<Vec<u64>, TallyError> {
    let items = match doc {
        Value::Array(items) => items,
        Value::Object(_) => ["results", "data", "items"]
            .iter()
            .find_map(|k| doc.get(*k).and_then(Value::as_array))
            .ok_or_else(|| TallyError::protocol("features", "feature catalog is not a list"))?,
        _ => return Err(TallyError::protocol("features", "feature catalog is not a list")),
    };
    let mut ids: Vec<u64> = items
        .iter()
        .filter(|it| {
            first_str(it, &["product_name_en", "productNameEn", "product"])
                .is_some_and(|name| product.matches_upstream_name(name))
        })
        .filter_map(|it| it.get("id").and_then(Value::as_u64))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Job identifier from a submission answer (`uuid`, `id` or `file_uuid`).
pub(crate) fn job_id_from_submission(doc: &Value) -> Result<JobId, TallyError> {
    ["uuid", "id", "file_uuid"]
        .iter()
        .find_map(|k| match doc.get(*k) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(JobId::new(s.trim())),
            Some(Value::Number(n)) => Some(JobId::new(n.to_string())),
            _ => None,
        })
        .ok_or_else(|| TallyError::protocol("generate", "submission answer carries no job identifier"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn feature_ids_are_matched_sorted_and_deduplicated() {
        let doc = json!([
            {"id": 30, "product_name_en": "Cloud"},
            {"id": 10, "productNameEn": "CLOUD"},
            {"id": 30, "product": "cloud"},
            {"id": 5, "product_name_en": "CDN"},
            {"id": "x", "product_name_en": "Cloud"}
        ]);
        assert_eq!(feature_ids_for(&doc, ProductType::Cloud).unwrap(), vec![10, 30]);
        assert_eq!(feature_ids_for(&doc, ProductType::Waap).unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn wrapped_catalog_is_accepted() {
        let doc = json!({"results": [{"id": 1, "product_name_en": "WAAP"}]});
        assert_eq!(feature_ids_for(&doc, ProductType::Waap).unwrap(), vec![1]);
        assert!(feature_ids_for(&json!({"count": 0}), ProductType::Waap).is_err());
    }

    #[test]
    fn job_id_fallbacks() {
        assert_eq!(job_id_from_submission(&json!({"uuid": "a"})).unwrap().as_str(), "a");
        assert_eq!(job_id_from_submission(&json!({"id": 42})).unwrap().as_str(), "42");
        assert_eq!(job_id_from_submission(&json!({"file_uuid": "f"})).unwrap().as_str(), "f");
        assert!(matches!(
            job_id_from_submission(&json!({"detail": "ok"})),
            Err(TallyError::Protocol { .. })
        ));
    }

    #[test]
    fn login_lifetime_falls_back_to_default() {
        let c = credential_from_login(&json!({"access": "t"}), Duration::from_secs(1800)).unwrap();
        assert_eq!(c.valid_for(), Duration::from_secs(1800));
        let c = credential_from_login(&json!({"access_token": "t", "expires_in": 300}), Duration::ZERO)
            .unwrap();
        assert_eq!(c.valid_for(), Duration::from_secs(300));
        assert_eq!(c.token(), "t");
    }
}
