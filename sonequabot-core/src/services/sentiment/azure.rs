//! src/services/sentiment/azure.rs
//!
//! Azure Cognitive Services Text Analytics (v3.0) sentiment client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use sonequabot_common::models::{SentimentScores, TextSentiment};

use crate::Error;
use super::SentimentClassifier;

const SENTIMENT_PATH: &str = "text/analytics/v3.0/sentiment";
/// Longest document the service accepts, in characters.
const MAX_DOCUMENT_CHARS: usize = 5120;

#[derive(Debug, Clone)]
pub struct AzureTextAnalyticsConfig {
    /// e.g. `https://my-resource.cognitiveservices.azure.com`
    pub endpoint: String,
    pub subscription_key: String,
    /// ISO 639-1 hint, e.g. `it`.
    pub language: String,
    pub timeout: Duration,
}

impl AzureTextAnalyticsConfig {
    pub fn new(endpoint: &str, subscription_key: &str, language: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            subscription_key: subscription_key.to_string(),
            language: language.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentResponse {
    #[serde(default)]
    documents: Vec<DocumentSentiment>,
    #[serde(default)]
    errors: Vec<DocumentError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentSentiment {
    sentiment: String,
    confidence_scores: ConfidenceScores,
}

#[derive(Debug, Deserialize)]
struct ConfidenceScores {
    positive: f64,
    neutral: f64,
    negative: f64,
}

#[derive(Debug, Deserialize)]
struct DocumentError {
    id: String,
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

pub struct AzureTextAnalyticsClassifier {
    http: reqwest::Client,
    config: AzureTextAnalyticsConfig,
}

impl AzureTextAnalyticsClassifier {
    pub fn new(config: AzureTextAnalyticsConfig) -> Result<Self, Error> {
        if config.endpoint.trim().is_empty() || config.subscription_key.trim().is_empty() {
            return Err(Error::Config("Azure Text Analytics needs an endpoint and a key".into()));
        }
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn sentiment_url(&self) -> Result<url::Url, Error> {
        let base = format!("{}/", self.config.endpoint.trim_end_matches('/'));
        Ok(url::Url::parse(&base)?.join(SENTIMENT_PATH)?)
    }
}

/// Reads the single-document answer into scores.
pub fn parse_response(body: &str) -> Result<SentimentScores, Error> {
    let resp: SentimentResponse = serde_json::from_str(body)?;
    if let Some(doc_err) = resp.errors.first() {
        return Err(Error::Classifier(format!(
            "document {} rejected: {} ({})",
            doc_err.id, doc_err.error.message, doc_err.error.code
        )));
    }
    let doc = resp
        .documents
        .into_iter()
        .next()
        .ok_or_else(|| Error::Classifier("response contained no documents".into()))?;
    let sentiment: TextSentiment = doc.sentiment.parse().map_err(Error::Classifier)?;
    Ok(SentimentScores::new(
        doc.confidence_scores.positive,
        doc.confidence_scores.neutral,
        doc.confidence_scores.negative,
        sentiment,
    ))
}

#[async_trait]
impl SentimentClassifier for AzureTextAnalyticsClassifier {
    async fn classify(&self, text: &str) -> Result<SentimentScores, Error> {
        let document: String = text.chars().take(MAX_DOCUMENT_CHARS).collect();
        let body = json!({
            "documents": [
                { "id": "1", "language": self.config.language, "text": document }
            ]
        });

        let resp = self
            .http
            .post(self.sentiment_url()?)
            .header("Ocp-Apim-Subscription-Key", &self.config.subscription_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text_body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Classifier(format!("HTTP {} => {}", status, text_body)));
        }
        debug!("(AzureTextAnalytics) << {}", text_body);
        parse_response(&text_body)
    }

    fn name(&self) -> &str {
        "azure-text-analytics"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BODY: &str = r#"{
        "documents": [{
            "id": "1",
            "sentiment": "positive",
            "confidenceScores": { "positive": 0.91, "neutral": 0.07, "negative": 0.02 },
            "sentences": [],
            "warnings": []
        }],
        "errors": [],
        "modelVersion": "2020-04-01"
    }"#;

    #[test]
    fn parses_scores_and_label() {
        let s = parse_response(OK_BODY).unwrap();
        assert_eq!(s, SentimentScores::new(0.91, 0.07, 0.02, TextSentiment::Positive));
    }

    #[test]
    fn mixed_label_is_kept() {
        let body = OK_BODY.replace("\"positive\",", "\"mixed\",");
        assert_eq!(parse_response(&body).unwrap().sentiment, TextSentiment::Mixed);
    }

    #[test]
    fn document_errors_become_classifier_errors() {
        let body = r#"{"documents":[],"errors":[{"id":"1","error":{"code":"InvalidArgument",
            "message":"Invalid Language Code."}}],"modelVersion":"2020-04-01"}"#;
        assert!(matches!(parse_response(body), Err(Error::Classifier(_))));
    }

    #[test]
    fn builds_the_v3_url() {
        let c = AzureTextAnalyticsClassifier::new(AzureTextAnalyticsConfig::new(
            "https://sonequa.cognitiveservices.azure.com/",
            "key",
            "it",
        ))
        .unwrap();
        assert_eq!(
            c.sentiment_url().unwrap().as_str(),
            "https://sonequa.cognitiveservices.azure.com/text/analytics/v3.0/sentiment"
        );
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let cfg = AzureTextAnalyticsConfig::new("https://x.example.com", "", "it");
        assert!(matches!(AzureTextAnalyticsClassifier::new(cfg), Err(Error::Config(_))));
    }
}
