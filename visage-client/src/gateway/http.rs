//! Reqwest-backed implementation of [`RemoteService`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::TryStreamExt;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tokio_util::io::ReaderStream;

use visage_model::{
    AdminStats, AlbumDetail, MergeRequest, Person, PersonId, Photo, PhotoId, PhotoPage,
    RenameRequest, UploadResponse,
};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::gateway::{ProgressFn, RemoteService, TransferProgress, UploadFile};

/// Error body shape used by every service endpoint.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP gateway to the gallery service.
///
/// Holds an opaque bearer credential and forwards it on every request; it
/// performs no login flow itself. A 401 becomes [`ApiError::AuthExpired`] and
/// nothing else happens here: navigation, token refresh, or re-login are the
/// caller's concern.
pub struct HttpRemoteService {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl std::fmt::Debug for HttpRemoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemoteService")
            .field("base_url", &self.base_url)
            .field(
                "has_token",
                &self.token.try_read().map(|t| t.is_some()).unwrap_or(false),
            )
            .finish()
    }
}

impl HttpRemoteService {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(format!("failed to build http client: {err}")))?;

        info!(
            "[Gateway] creating http gateway with base url {}",
            config.base_url
        );

        Ok(HttpRemoteService {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    /// Replace the forwarded credential. `None` clears it.
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        if let Some(token) = self.token.read().await.as_ref() {
            builder.bearer_auth(token)
        } else {
            builder
        }
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Network(format!("invalid response body: {err}")))
    }

    /// Execute a request whose body we do not care about (200 or 204).
    async fn execute_unit(&self, builder: RequestBuilder) -> ApiResult<()> {
        self.send(builder).await.map(|_| ())
    }

    async fn execute_bytes(&self, builder: RequestBuilder) -> ApiResult<Vec<u8>> {
        let response = self.send(builder).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::Network(format!("truncated response body: {err}")))?;
        Ok(bytes.to_vec())
    }

    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let request = self.authed(builder).await;
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(Self::map_failure(status, response).await)
    }

    async fn map_failure(status: StatusCode, response: Response) -> ApiError {
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });

        match status {
            StatusCode::UNAUTHORIZED => ApiError::AuthExpired,
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            status if status.is_client_error() => ApiError::Validation(message),
            status => ApiError::Server {
                status: status.as_u16(),
                message,
            },
        }
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name.rsplit('.').next().unwrap_or_default();
    if extension.eq_ignore_ascii_case("png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn upload_photos(
        &self,
        files: &[UploadFile],
        progress: Option<ProgressFn>,
    ) -> ApiResult<Vec<Photo>> {
        let bytes_total: u64 = files.iter().map(|file| file.size_bytes).sum();
        let sent = Arc::new(AtomicU64::new(0));

        let mut form = Form::new();
        for file in files {
            let handle = tokio::fs::File::open(&file.path).await.map_err(|err| {
                ApiError::Io(format!("cannot read {}: {err}", file.path.display()))
            })?;

            let sent = Arc::clone(&sent);
            let progress = progress.clone();
            let counted = ReaderStream::new(handle).inspect_ok(move |chunk| {
                let bytes_sent =
                    sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
                if let Some(callback) = &progress {
                    callback(TransferProgress {
                        bytes_sent,
                        bytes_total,
                    });
                }
            });

            let part = Part::stream_with_length(Body::wrap_stream(counted), file.size_bytes)
                .file_name(file.file_name.clone())
                .mime_str(mime_for(&file.file_name))
                .map_err(|err| ApiError::Validation(format!("bad upload part: {err}")))?;
            form = form.part("files", part);
        }

        debug!(
            "[Gateway] uploading {} files ({} bytes) in one batch",
            files.len(),
            bytes_total
        );
        let response: UploadResponse = self
            .execute(self.client.post(self.url("upload")).multipart(form))
            .await?;
        Ok(response.photos)
    }

    async fn list_photos(&self, page: u32, per_page: u32) -> ApiResult<PhotoPage> {
        let url = self.url(&format!("photos?page={page}&per_page={per_page}"));
        self.execute(self.client.get(url)).await
    }

    fn photo_image_url(&self, id: PhotoId, thumbnail: bool) -> String {
        if thumbnail {
            self.url(&format!("photos/{id}/image?thumbnail=true"))
        } else {
            self.url(&format!("photos/{id}/image"))
        }
    }

    async fn fetch_photo_bytes(&self, id: PhotoId) -> ApiResult<Vec<u8>> {
        let url = self.url(&format!("photos/{id}/download"));
        self.execute_bytes(self.client.get(url)).await
    }

    async fn delete_photo(&self, id: PhotoId) -> ApiResult<()> {
        let url = self.url(&format!("admin/photos/{id}"));
        self.execute_unit(self.client.delete(url)).await
    }

    async fn list_albums(&self) -> ApiResult<Vec<Person>> {
        #[derive(Deserialize)]
        struct AlbumsResponse {
            albums: Vec<Person>,
        }
        let response: AlbumsResponse = self.execute(self.client.get(self.url("albums"))).await?;
        Ok(response.albums)
    }

    async fn fetch_album_detail(&self, id: PersonId) -> ApiResult<AlbumDetail> {
        let url = self.url(&format!("albums/{id}"));
        self.execute(self.client.get(url)).await
    }

    async fn fetch_album_archive(&self, id: PersonId) -> ApiResult<Vec<u8>> {
        let url = self.url(&format!("albums/{id}/download"));
        self.execute_bytes(self.client.get(url)).await
    }

    async fn rename_person(&self, id: PersonId, name: &str) -> ApiResult<()> {
        let url = self.url(&format!("admin/persons/{id}/rename"));
        let body = RenameRequest {
            name: name.to_string(),
        };
        self.execute_unit(self.client.put(url).json(&body)).await
    }

    async fn merge_persons(&self, first: PersonId, second: PersonId) -> ApiResult<()> {
        let body = MergeRequest {
            person_id_1: first,
            person_id_2: second,
        };
        self.execute_unit(
            self.client
                .post(self.url("admin/persons/merge"))
                .json(&body),
        )
        .await
    }

    async fn fetch_stats(&self) -> ApiResult<AdminStats> {
        self.execute(self.client.get(self.url("admin/stats"))).await
    }

    async fn trigger_reprocess(&self) -> ApiResult<()> {
        self.execute_unit(self.client.post(self.url("admin/reprocess")))
            .await
    }

    async fn health_check(&self) -> ApiResult<bool> {
        match self.send(self.client.get(self.url("health"))).await {
            Ok(_) => Ok(true),
            Err(ApiError::Network(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_duplicate_slashes() {
        let config = ClientConfig::default();
        let gateway = HttpRemoteService::new(&config).expect("client builds");
        assert_eq!(
            gateway.url("/photos"),
            "http://localhost:8000/api/photos"
        );
        assert_eq!(
            gateway.photo_image_url(PhotoId(5), true),
            "http://localhost:8000/api/photos/5/image?thumbnail=true"
        );
    }

    #[test]
    fn mime_guess_covers_supported_types() {
        assert_eq!(mime_for("a.PNG"), "image/png");
        assert_eq!(mime_for("b.jpeg"), "image/jpeg");
        assert_eq!(mime_for("noext"), "image/jpeg");
    }
}
