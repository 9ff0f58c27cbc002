//! REST client for the catalog API.
//!
//! Wraps the catalog HTTP endpoints (collections, album membership, playback,
//! sign-in, password reset) using [`reqwest`]. Every catalog call takes the
//! [`Session`] whose token it should carry.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use musicly_core::forms::LoginForm;
use musicly_core::resource::Resource;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::envelope::Envelope;
use crate::error::{ClientError, ClientResult};
use crate::session::{Session, UserProfile};

/// HTTP client for one catalog API deployment.
#[derive(Debug, Clone)]
pub struct CatalogApi {
    client: reqwest::Client,
    base_url: String,
}

/// Query string of a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    /// Free-text search term. Empty matches everything.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl ListQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            content: term.into(),
            ..Self::default()
        }
    }
}

/// `data` of a sign-in response. Either field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInData {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlayData {
    Url(String),
    Object { url: String },
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Thumbnail,
    Audio,
}

impl AttachmentKind {
    /// Multipart field name.
    pub fn field(self) -> &'static str {
        match self {
            AttachmentKind::Thumbnail => "thumbnail",
            AttachmentKind::Audio => "audio",
        }
    }
}

/// A file sent alongside entity metadata.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(kind: AttachmentKind, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).to_string();
        Self {
            kind,
            file_name,
            mime,
            bytes,
        }
    }

    pub fn thumbnail(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(AttachmentKind::Thumbnail, file_name, bytes)
    }

    pub fn audio(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(AttachmentKind::Audio, file_name, bytes)
    }

    /// Read an attachment from disk.
    pub async fn from_path(kind: AttachmentKind, path: &Path) -> ClientResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::Attachment {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| kind.field().to_string());
        Ok(Self::new(kind, file_name, bytes))
    }

    fn into_part(self) -> ClientResult<(&'static str, Part)> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime)?;
        Ok((self.kind.field(), part))
    }
}

fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl CatalogApi {
    /// Create a client from configuration.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config.api_base_url.clone()))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- auth ----

    /// `POST /auth/signin`. Returns `None` when the envelope has no data.
    pub async fn sign_in(&self, form: &LoginForm) -> ClientResult<Option<SignInData>> {
        let request = self.client.post(self.endpoint(&["auth", "signin"])?).json(form);
        Self::send(request).await?.into_data()
    }

    /// `POST /users/reset-password/{token}`.
    pub async fn reset_password(&self, token: &str, password: &str) -> ClientResult<()> {
        let request = self
            .client
            .post(self.endpoint(&["users", "reset-password", token])?)
            .json(&serde_json::json!({ "password": password }));
        Self::send(request).await?.into_ack()
    }

    // ---- collections ----

    /// `GET /{collection}?content=&limit=&offset=`.
    pub async fn list<R: Resource>(
        &self,
        session: &Session,
        query: &ListQuery,
    ) -> ClientResult<Vec<R>> {
        let request = self
            .authed(session, self.client.get(self.endpoint(&[R::COLLECTION])?))
            .query(query);
        Self::send(request).await?.into_data()
    }

    /// `GET /{collection}/{key}` by id or slug. `None` when absent.
    pub async fn get<R: Resource>(&self, session: &Session, key: &str) -> ClientResult<Option<R>> {
        let request = self.authed(
            session,
            self.client.get(self.endpoint(&[R::COLLECTION, key])?),
        );
        match Self::send(request).await {
            Ok(envelope) => envelope.into_data(),
            Err(ClientError::Server { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// `POST /{collection}` as multipart: a `data` JSON part plus files.
    pub async fn create<R: Resource>(
        &self,
        session: &Session,
        draft: &R::Draft,
        attachments: Vec<Attachment>,
    ) -> ClientResult<()> {
        let data = serde_json::to_string(draft).map_err(|err| ClientError::Decode(err.to_string()))?;
        let mut form = Form::new().text("data", data);
        for attachment in attachments {
            let (field, part) = attachment.into_part()?;
            form = form.part(field, part);
        }

        let request = self
            .authed(session, self.client.post(self.endpoint(&[R::COLLECTION])?))
            .multipart(form);
        Self::send(request).await?.into_ack()
    }

    /// `PATCH /{collection}/{id}` with a JSON patch.
    pub async fn update<R: Resource>(
        &self,
        session: &Session,
        id: &str,
        patch: &R::Patch,
    ) -> ClientResult<()> {
        let request = self
            .authed(
                session,
                self.client.patch(self.endpoint(&[R::COLLECTION, id])?),
            )
            .json(patch);
        Self::send(request).await?.into_ack()
    }

    /// `DELETE /{collection}/{id}`.
    pub async fn remove<R: Resource>(&self, session: &Session, id: &str) -> ClientResult<()> {
        let request = self.authed(
            session,
            self.client.delete(self.endpoint(&[R::COLLECTION, id])?),
        );
        Self::send(request).await?.into_ack()
    }

    /// `PATCH /{collection}/image` as multipart: `id` plus `thumbnail`.
    pub async fn update_thumbnail<R: Resource>(
        &self,
        session: &Session,
        id: &str,
        thumbnail: Attachment,
    ) -> ClientResult<()> {
        let (_, part) = Attachment {
            kind: AttachmentKind::Thumbnail,
            ..thumbnail
        }
        .into_part()?;
        let form = Form::new().text("id", id.to_string()).part("thumbnail", part);

        let request = self
            .authed(
                session,
                self.client.patch(self.endpoint(&[R::COLLECTION, "image"])?),
            )
            .multipart(form);
        Self::send(request).await?.into_ack()
    }

    // ---- album membership and playback ----

    /// `POST /albums/{album_id}/audios/{audio_id}`.
    pub async fn add_audio_to_album(
        &self,
        session: &Session,
        album_id: &str,
        audio_id: &str,
    ) -> ClientResult<()> {
        let request = self.authed(
            session,
            self.client
                .post(self.endpoint(&["albums", album_id, "audios", audio_id])?),
        );
        Self::send(request).await?.into_ack()
    }

    /// `DELETE /albums/{album_id}/audios/{audio_id}`.
    pub async fn remove_audio_from_album(
        &self,
        session: &Session,
        album_id: &str,
        audio_id: &str,
    ) -> ClientResult<()> {
        let request = self.authed(
            session,
            self.client
                .delete(self.endpoint(&["albums", album_id, "audios", audio_id])?),
        );
        Self::send(request).await?.into_ack()
    }

    /// `GET /audios/play/{id}`. Returns the stream URL.
    pub async fn play_url(&self, session: &Session, audio_id: &str) -> ClientResult<String> {
        let request = self.authed(
            session,
            self.client.get(self.endpoint(&["audios", "play", audio_id])?),
        );
        match Self::send(request).await?.into_data::<PlayData>()? {
            PlayData::Url(url) | PlayData::Object { url } => Ok(url),
        }
    }

    // ---- private helpers ----

    /// The base URL extended by `segments`, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let invalid = |reason: String| ClientError::BaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let mut url = Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authed(&self, session: &Session, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, session.bearer())
    }

    /// Send a request and parse the envelope of a 2xx response. Non-2xx
    /// responses become [`ClientError::Server`].
    async fn send(request: RequestBuilder) -> ClientResult<Envelope> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Catalog API returned an error status");
            return Err(ClientError::from_error_response(status.as_u16(), &body));
        }
        Envelope::parse(&body)
    }
}

// ---------------------------------------------------------------------------
// Controller seam
// ---------------------------------------------------------------------------

/// The remote operations a list controller needs for one entity type.
#[async_trait]
pub trait ResourceApi<R: Resource>: Send + Sync {
    async fn list(&self, session: &Session, query: &ListQuery) -> ClientResult<Vec<R>>;

    async fn create(
        &self,
        session: &Session,
        draft: &R::Draft,
        attachments: Vec<Attachment>,
    ) -> ClientResult<()>;

    async fn update(&self, session: &Session, id: &str, patch: &R::Patch) -> ClientResult<()>;

    async fn remove(&self, session: &Session, id: &str) -> ClientResult<()>;

    async fn update_thumbnail(
        &self,
        session: &Session,
        id: &str,
        thumbnail: Attachment,
    ) -> ClientResult<()>;
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for CatalogApi {
    async fn list(&self, session: &Session, query: &ListQuery) -> ClientResult<Vec<R>> {
        CatalogApi::list::<R>(self, session, query).await
    }

    async fn create(
        &self,
        session: &Session,
        draft: &R::Draft,
        attachments: Vec<Attachment>,
    ) -> ClientResult<()> {
        CatalogApi::create::<R>(self, session, draft, attachments).await
    }

    async fn update(&self, session: &Session, id: &str, patch: &R::Patch) -> ClientResult<()> {
        CatalogApi::update::<R>(self, session, id, patch).await
    }

    async fn remove(&self, session: &Session, id: &str) -> ClientResult<()> {
        CatalogApi::remove::<R>(self, session, id).await
    }

    async fn update_thumbnail(
        &self,
        session: &Session,
        id: &str,
        thumbnail: Attachment,
    ) -> ClientResult<()> {
        CatalogApi::update_thumbnail::<R>(self, session, id, thumbnail).await
    }
}
