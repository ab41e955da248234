//! Backend collaborators: survey fetch, draft save, submit and report export.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use survey_spec::{AnswerSubmission, SubmissionReceipt, SurveyDocument};

use crate::error::ApiError;

#[async_trait]
pub trait SurveyApi: Send + Sync {
    async fn fetch_survey(&self, survey_id: &str) -> Result<SurveyDocument, ApiError>;
    async fn save_draft(&self, submission: &AnswerSubmission) -> Result<(), ApiError>;
    async fn submit(&self, submission: &AnswerSubmission) -> Result<SubmissionReceipt, ApiError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Xlsx,
    Pdf,
}

/// Filters forwarded untouched to the export endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<u16>,
    #[serde(default)]
    pub format: ReportFormat,
}

/// Opaque report generator; returns the rendered file.
#[async_trait]
pub trait ReportExporter: Send + Sync {
    async fn export(&self, filters: &ReportFilters) -> Result<Bytes, ApiError>;
}

#[cfg(feature = "http")]
pub use http::HttpSurveyApi;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::{Client, RequestBuilder};
    use serde::Deserialize;
    use serde::de::DeserializeOwned;
    use survey_spec::{AnswerSubmission, SubmissionReceipt, SurveyDocument};
    use tracing::debug;
    use url::Url;

    use super::{ReportExporter, ReportFilters, SurveyApi};
    use crate::error::ApiError;

    /// Responses arrive either bare or wrapped as `{ "data": ... }`.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Envelope<T> {
        Wrapped { data: T },
        Bare(T),
    }

    impl<T> Envelope<T> {
        fn into_inner(self) -> T {
            match self {
                Envelope::Wrapped { data } => data,
                Envelope::Bare(value) => value,
            }
        }
    }

    /// REST client for the survey backend.
    #[derive(Debug, Clone)]
    pub struct HttpSurveyApi {
        base: Url,
        client: Client,
        token: Option<String>,
    }

    impl HttpSurveyApi {
        pub fn new(base_url: &str) -> Result<Self, ApiError> {
            let client = Client::builder()
                .user_agent(concat!("tracer-survey/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|source| ApiError::Transport {
                    url: base_url.to_string(),
                    source,
                })?;
            Self::with_client(base_url, client)
        }

        pub fn with_client(base_url: &str, client: Client) -> Result<Self, ApiError> {
            let base = Url::parse(base_url).map_err(|err| ApiError::InvalidUrl {
                url: base_url.to_string(),
                reason: err.to_string(),
            })?;
            if base.cannot_be_a_base() {
                return Err(ApiError::InvalidUrl {
                    url: base_url.to_string(),
                    reason: "url cannot carry a path".into(),
                });
            }
            Ok(Self {
                base,
                client,
                token: None,
            })
        }

        pub fn with_token(mut self, token: impl Into<String>) -> Self {
            self.token = Some(token.into());
            self
        }

        pub fn base_url(&self) -> &Url {
            &self.base
        }

        /// Base url with `segments` appended, each percent-encoded.
        pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
            let mut url = self.base.clone();
            url.path_segments_mut()
                .map_err(|()| ApiError::InvalidUrl {
                    url: self.base.to_string(),
                    reason: "url cannot carry a path".into(),
                })?
                .pop_if_empty()
                .extend(segments);
            Ok(url)
        }

        fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
            match &self.token {
                Some(token) => request.bearer_auth(token),
                None => request,
            }
        }

        async fn send(&self, url: &Url, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
            debug!(%url, "survey backend request");
            let response = self
                .authorize(request)
                .send()
                .await
                .map_err(|source| ApiError::Transport {
                    url: url.to_string(),
                    source,
                })?;
            let status = response.status();
            if !status.is_success() {
                return Err(ApiError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response)
        }

        async fn send_json<T: DeserializeOwned>(
            &self,
            url: &Url,
            request: RequestBuilder,
        ) -> Result<T, ApiError> {
            let body = self
                .send(url, request)
                .await?
                .bytes()
                .await
                .map_err(|source| ApiError::Transport {
                    url: url.to_string(),
                    source,
                })?;
            serde_json::from_slice::<Envelope<T>>(&body)
                .map(Envelope::into_inner)
                .map_err(|err| ApiError::Decode {
                    url: url.to_string(),
                    reason: err.to_string(),
                })
        }
    }

    #[async_trait]
    impl SurveyApi for HttpSurveyApi {
        async fn fetch_survey(&self, survey_id: &str) -> Result<SurveyDocument, ApiError> {
            let url = self.endpoint(&["surveys", survey_id])?;
            self.send_json(&url, self.client.get(url.clone())).await
        }

        async fn save_draft(&self, submission: &AnswerSubmission) -> Result<(), ApiError> {
            let url = self.endpoint(&["surveys", &submission.survey_id, "draft"])?;
            self.send(&url, self.client.post(url.clone()).json(submission))
                .await
                .map(drop)
        }

        async fn submit(&self, submission: &AnswerSubmission) -> Result<SubmissionReceipt, ApiError> {
            let url = self.endpoint(&["surveys", &submission.survey_id, "responses"])?;
            self.send_json(&url, self.client.post(url.clone()).json(submission))
                .await
        }
    }

    #[async_trait]
    impl ReportExporter for HttpSurveyApi {
        async fn export(&self, filters: &ReportFilters) -> Result<Bytes, ApiError> {
            let url = self.endpoint(&["reports", "export"])?;
            self.send(&url, self.client.post(url.clone()).json(filters))
                .await?
                .bytes()
                .await
                .map_err(|source| ApiError::Transport {
                    url: url.to_string(),
                    source,
                })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn endpoints_append_encoded_segments() {
            let api = HttpSurveyApi::new("https://kampus.ac.id/api/").expect("valid url");
            let url = api.endpoint(&["surveys", "tracer 2026", "draft"]).expect("endpoint");
            assert_eq!(url.as_str(), "https://kampus.ac.id/api/surveys/tracer%202026/draft");

            let bare = HttpSurveyApi::new("https://kampus.ac.id/api").expect("valid url");
            assert_eq!(
                bare.endpoint(&["reports", "export"]).expect("endpoint").as_str(),
                "https://kampus.ac.id/api/reports/export"
            );
        }

        #[test]
        fn rejects_unusable_base() {
            assert!(matches!(
                HttpSurveyApi::new("mailto:admin@kampus.ac.id"),
                Err(ApiError::InvalidUrl { .. })
            ));
            assert!(HttpSurveyApi::new("not a url").is_err());
        }

        #[test]
        fn envelope_accepts_wrapped_and_bare() {
            let wrapped: Envelope<SubmissionReceipt> = serde_json::from_str(
                r#"{"data":{"id":"r1","surveyId":"s","respondentId":"TS_001","submittedAt":"2026-01-01T00:00:00Z"}}"#,
            )
            .expect("wrapped");
            assert_eq!(wrapped.into_inner().id, "r1");
            let bare: Envelope<SubmissionReceipt> = serde_json::from_str(
                r#"{"id":"r2","surveyId":"s","respondentId":"TS_001","submittedAt":"2026-01-01T00:00:00Z"}"#,
            )
            .expect("bare");
            assert_eq!(bare.into_inner().id, "r2");
        }
    }
}
