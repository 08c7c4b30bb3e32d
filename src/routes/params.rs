use chrono::{DateTime, NaiveDateTime};
use std::collections::HashMap;
use url::form_urlencoded;

use crate::assets::AssetCode;
use crate::error::{AppError, AppResult};

const TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// `/rpc` parameters from a query string or a JSON object body; later duplicates win.
#[derive(Debug, Default)]
pub(crate) struct RpcParams(HashMap<String, String>);

impl RpcParams {
    pub(crate) fn parse(raw: Option<&str>) -> Self {
        let values = raw
            .map(|raw| {
                form_urlencoded::parse(raw.as_bytes())
                    .map(|(key, value)| (key.into_owned(), value.trim().to_string()))
                    .collect()
            })
            .unwrap_or_default();
        Self(values)
    }

    /// Strings and numbers are both accepted; `null` counts as absent.
    pub(crate) fn from_json(body: serde_json::Value) -> AppResult<Self> {
        let serde_json::Value::Object(fields) = body else {
            return Err(AppError::bad_request("Request body must be a JSON object"));
        };
        let mut values = HashMap::with_capacity(fields.len());
        for (key, value) in fields {
            let value = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::String(value) => value.trim().to_string(),
                serde_json::Value::Number(value) => value.to_string(),
                _ => {
                    return Err(AppError::bad_request(format!(
                        "Parameter '{key}' must be a string or a number"
                    )))
                }
            };
            values.insert(key, value);
        }
        Ok(Self(values))
    }

    pub(crate) fn required(&self, name: &str) -> AppResult<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::bad_request(format!("Required parameter '{name}' not provided")))
    }

    /// Like [`RpcParams::required`] but an empty value is accepted.
    pub(crate) fn present(&self, name: &str) -> AppResult<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::bad_request(format!("Required parameter '{name}' not provided")))
    }

    pub(crate) fn required_i64(&self, name: &str) -> AppResult<i64> {
        let raw = self.required(name)?;
        raw.parse::<i64>().map_err(|_| {
            AppError::bad_request(format!("Parameter '{name}' must be an integer, got '{raw}'"))
        })
    }

    pub(crate) fn required_asset(&self, name: &str) -> AppResult<AssetCode> {
        self.required(name)?
            .parse::<AssetCode>()
            .map_err(|err| AppError::bad_request(err.to_string()))
    }

    pub(crate) fn required_time(&self, name: &str) -> AppResult<NaiveDateTime> {
        let raw = self.required(name)?;
        parse_time(raw).ok_or_else(|| {
            AppError::bad_request(format!(
                "Parameter '{name}' must be a timestamp like 2016-03-24 16:05:00, got '{raw}'"
            ))
        })
    }
}

/// Naive values are UTC. RFC3339 offsets are converted to UTC.
pub(crate) fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|value| value.naive_utc())
        })
}
