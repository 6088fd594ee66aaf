use super::{
    EmbedResponse, Embedder, EmbeddingClientError, EmbeddingResult, ImageUpload, RetryPolicy,
};
use app_state::EmbeddingServiceSettings;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

/// Multipart field the service reads the image from.
const IMAGE_FIELD: &str = "image";

/// Talks to the embedding service over HTTP.
#[derive(Clone)]
pub struct HttpEmbeddingClient {
    http_client: Client,
    endpoint_url: String,
    retry: RetryPolicy,
}

impl HttpEmbeddingClient {
    pub fn new(settings: &EmbeddingServiceSettings) -> Result<Self, EmbeddingClientError> {
        let http_client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self::with_client(http_client, settings))
    }

    #[must_use]
    pub fn with_client(http_client: Client, settings: &EmbeddingServiceSettings) -> Self {
        Self {
            http_client,
            endpoint_url: settings.endpoint_url(),
            retry: settings.retry.into(),
        }
    }

    async fn embed_once(&self, image: &ImageUpload) -> Result<EmbeddingResult, EmbeddingClientError> {
        let mime = mime_guess::from_path(&image.file_name).first_or_octet_stream();
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(mime.essence_str())?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self
            .http_client
            .post(&self.endpoint_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(EmbeddingClientError::ServerError {
                status: status.as_u16(),
                message: body,
            });
        }
        if !status.is_success() {
            return Err(EmbeddingClientError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: EmbedResponse = serde_json::from_str(&body)
            .map_err(|e| EmbeddingClientError::InvalidResponse(e.to_string()))?;
        parsed.try_into()
    }
}

#[async_trait]
impl Embedder for HttpEmbeddingClient {
    #[instrument(skip(self, image), fields(file_name = %image.file_name), err(Debug))]
    async fn embed(&self, image: &ImageUpload) -> Result<EmbeddingResult, EmbeddingClientError> {
        let result = self.retry.run(|_| self.embed_once(image)).await?;
        debug!(
            "Embedded '{}', facial confidence {:?}",
            image.file_name, result.facial_confidence
        );
        Ok(result)
    }
}
