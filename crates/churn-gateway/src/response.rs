//! Response envelopes shared by every entry point.

use std::collections::BTreeMap;

use churn_core::constants::MODEL_VERSION;
use churn_core::types::RawRecord;
use churn_model::inference::Prediction;
use serde::{Deserialize, Serialize};

const CONTENT_TYPE_JSON: &str = "application/json";

/// Serverless-style response: status, headers and a JSON string body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaResponse {
    /// HTTP status code
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// Serialized JSON body
    pub body: String,
}

impl LambdaResponse {
    fn json<T: Serialize>(status_code: u16, body: &T) -> Self {
        let body = serde_json::to_string(body).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize response body: {}", e);
            r#"{"error":"Internal server error","code":"PREDICTION_FAILED"}"#.to_string()
        });
        Self {
            status_code,
            headers: default_headers(),
            body,
        }
    }

    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Parse the body back into JSON
    pub fn body_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string()),
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
    ])
}

/// Probability pair in the success body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    /// Probability the customer stays
    pub stay_probability: f64,
    /// Probability the customer churns
    pub churn_probability: f64,
}

/// Success body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 1 for churn, 0 for stay
    pub prediction: u8,
    /// `"Will Churn"` or `"Will Stay"`
    pub prediction_label: String,
    /// Class probabilities
    pub confidence: Confidence,
    /// Record the prediction was made from
    pub input_data: RawRecord,
    /// Encoding contract version
    pub model_version: String,
}

impl PredictionResult {
    /// Build from a prediction and the record it came from
    #[must_use]
    pub fn new(prediction: &Prediction, input: RawRecord) -> Self {
        Self {
            prediction: prediction.label,
            prediction_label: prediction.label_text().to_string(),
            confidence: Confidence {
                stay_probability: prediction.stay_probability,
                churn_probability: prediction.churn_probability,
            },
            input_data: input,
            model_version: MODEL_VERSION.to_string(),
        }
    }
}

/// Machine-readable cause of an internal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Classifier or manifest could not be loaded
    ArtifactUnavailable,
    /// Wrapped body was not a JSON object
    MalformedBody,
    /// Encoding or classification failed
    PredictionFailed,
}

impl ErrorCode {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ArtifactUnavailable => "ARTIFACT_UNAVAILABLE",
            Self::MalformedBody => "MALFORMED_BODY",
            Self::PredictionFailed => "PREDICTION_FAILED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize)]
struct ValidationBody<'a> {
    error: String,
    missing_fields: &'a [String],
}

#[derive(Serialize)]
struct InternalBody {
    error: &'static str,
    code: ErrorCode,
}

/// 200 with the prediction and the echoed input
#[must_use]
pub fn success(prediction: &Prediction, input: RawRecord) -> LambdaResponse {
    LambdaResponse::json(200, &PredictionResult::new(prediction, input))
}

/// 400 listing the missing required fields
#[must_use]
pub fn validation_failure(missing: &[String]) -> LambdaResponse {
    LambdaResponse::json(
        400,
        &ValidationBody {
            error: format!("Missing required fields: {missing:?}"),
            missing_fields: missing,
        },
    )
}

/// 500 with a generic message; `detail` only goes to the log
#[must_use]
pub fn internal_failure(code: ErrorCode, detail: &str) -> LambdaResponse {
    tracing::error!(code = %code, "Error in prediction: {}", detail);
    LambdaResponse::json(
        500,
        &InternalBody {
            error: "Internal server error",
            code,
        },
    )
}
