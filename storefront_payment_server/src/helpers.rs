use std::collections::HashMap;

use actix_web::web;
use log::*;
use serde_json::Value;
use storefront_payment_engine::db_types::OrderStatusType;

use crate::errors::ServerError;

/// Field names that may carry the NETS transaction reference, in order of preference.
const NETS_REFERENCE_FIELDS: [&str; 5] = ["txn_retrieval_ref", "txnRetrievalRef", "txn_id", "txnId", "reference"];
const NETS_RESPONSE_CODE_FIELDS: [&str; 2] = ["response_code", "responseCode"];
const NETS_TXN_STATUS_FIELDS: [&str; 3] = ["txn_status", "txnStatus", "status"];
const NETS_SUCCESS_STATUSES: [&str; 4] = ["successful", "success", "completed", "2"];

/// A NETS callback, flattened from the query string and the body. Body fields win over query fields.
///
/// NETS is not consistent about field names or value types, so every value is kept as a string and empty values are
/// treated as absent.
#[derive(Debug, Clone, Default)]
pub struct NetsNotification {
    fields: HashMap<String, String>,
}

impl NetsNotification {
    pub fn from_parts(query: &str, content_type: &str, body: &[u8]) -> Result<Self, ServerError> {
        let mut fields = parse_form(query)?;
        if !body.is_empty() {
            let body_fields = if content_type.starts_with("application/x-www-form-urlencoded") {
                let text = std::str::from_utf8(body).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
                parse_form(text)?
            } else {
                parse_json_object(body)?
            };
            fields.extend(body_fields);
        }
        fields.retain(|_, v| !v.trim().is_empty());
        Ok(Self { fields })
    }

    fn first_of(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.fields.get(*name)).map(|s| s.as_str())
    }

    pub fn reference(&self) -> Option<&str> {
        self.first_of(&NETS_REFERENCE_FIELDS)
    }

    pub fn is_success(&self) -> bool {
        let response_code = self.first_of(&NETS_RESPONSE_CODE_FIELDS).map(str::trim).unwrap_or_default();
        let txn_status = self.first_of(&NETS_TXN_STATUS_FIELDS).map(|s| s.trim().to_lowercase()).unwrap_or_default();
        response_code == "00" || NETS_SUCCESS_STATUSES.contains(&txn_status.as_str())
    }

    /// NETS only ever tells us whether a payment went through, so anything short of success is a failure.
    pub fn outcome(&self) -> OrderStatusType {
        if self.is_success() {
            OrderStatusType::Successful
        } else {
            OrderStatusType::Failed
        }
    }
}

fn parse_form(s: &str) -> Result<HashMap<String, String>, ServerError> {
    if s.is_empty() {
        return Ok(HashMap::new());
    }
    web::Query::<HashMap<String, String>>::from_query(s)
        .map(web::Query::into_inner)
        .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))
}

fn parse_json_object(body: &[u8]) -> Result<HashMap<String, String>, ServerError> {
    let value = serde_json::from_slice::<Value>(body).map_err(|e| {
        debug!("💻️ NETS notification body is not valid JSON. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })?;
    let Value::Object(map) = value else {
        return Err(ServerError::InvalidRequestBody("Expected a JSON object".into()));
    };
    let fields = map
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            Value::Number(n) => Some((k, n.to_string())),
            Value::Bool(b) => Some((k, b.to_string())),
            _ => None,
        })
        .collect();
    Ok(fields)
}

/// Treat empty strings as missing values.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
