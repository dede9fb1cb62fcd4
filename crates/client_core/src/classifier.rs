//! HTTP access to the remote species classifier.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, StatusCode,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::SpeciesInfo,
    error::ApiError,
    protocol::{ClassificationResponse, HealthResponse},
};
use tracing::{debug, info};
use url::Url;

use crate::{config::ClientSettings, error::ClassifyError, media::SelectedImage};

/// Multipart field the classifier reads the upload from.
pub const UPLOAD_FIELD: &str = "file";

#[async_trait]
pub trait RemoteClassifier: Send + Sync {
    async fn classify(
        &self,
        image: &SelectedImage,
    ) -> Result<ClassificationResponse, ClassifyError>;
}

#[derive(Debug, Clone)]
pub struct HttpClassifier {
    http: Client,
    endpoint: Url,
    base_url: Url,
}

impl HttpClassifier {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClassifyError> {
        let endpoint = settings.endpoint_url()?;
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: base_url_for(&endpoint),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET {base}/species/{name}`.
    pub async fn species_info(&self, name: &str) -> Result<SpeciesInfo, ClassifyError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClassifyError::InvalidEndpoint {
                endpoint: self.base_url.to_string(),
                reason: "URL cannot carry path segments".into(),
            })?
            .pop_if_empty()
            .push("species")
            .push(name);

        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClassifyError::NotFound(name.to_string()));
        }
        decode_json(response).await
    }

    /// `GET {base}/`, the service's welcome message.
    pub async fn health(&self) -> Result<HealthResponse, ClassifyError> {
        let response = self.http.get(self.base_url.clone()).send().await?;
        decode_json(response).await
    }
}

#[async_trait]
impl RemoteClassifier for HttpClassifier {
    async fn classify(
        &self,
        image: &SelectedImage,
    ) -> Result<ClassificationResponse, ClassifyError> {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.name().to_string())
            .mime_str(image.media_type())?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        info!(
            endpoint = %self.endpoint,
            file = image.name(),
            media_type = image.media_type(),
            size_bytes = image.len(),
            "uploading image for classification"
        );
        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;
        let classification: ClassificationResponse = decode_json(response).await?;
        debug!(
            detected = classification.detected,
            species = classification.species.as_deref().unwrap_or_default(),
            "classifier responded"
        );
        Ok(classification)
    }
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClassifyError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClassifyError::Status {
            status,
            detail: ApiError::from_body(&body).detail,
        });
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|err| ClassifyError::MalformedBody(err.to_string()))
}

/// Parent directory of the endpoint path: `/predict/` maps to `/`,
/// `/api/predict` to `/api/`.
fn base_url_for(endpoint: &Url) -> Url {
    let path = endpoint.path().trim_end_matches('/');
    let parent = match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    };
    let mut base = endpoint.clone();
    base.set_path(parent);
    base.set_query(None);
    base.set_fragment(None);
    base
}

#[cfg(test)]
#[path = "tests/classifier_tests.rs"]
mod tests;
