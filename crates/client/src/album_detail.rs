//! One album, located by slug, with its track membership.

use musicly_core::album::Album;
use musicly_core::audio::{Audio, AudioDraft};
use musicly_core::error::CoreError;
use musicly_core::forms::check;
use tokio::sync::Mutex;

use crate::api::{Attachment, CatalogApi, ListQuery};
use crate::error::{ClientError, ClientResult};
use crate::notice::Notice;
use crate::session::Session;

#[derive(Debug, Clone, Default)]
pub struct AlbumDetailSnapshot {
    pub album: Option<Album>,
    /// Every audio in the catalog, for the "add existing audio" picker.
    pub catalog: Vec<Audio>,
    /// Set when the last load found no album for the slug.
    pub not_found: bool,
    /// Set when the last load failed.
    pub failed: bool,
    pub notice: Option<Notice>,
}

impl AlbumDetailSnapshot {
    /// Audios that are in the catalog but not yet in the album.
    pub fn available(&self) -> Vec<&Audio> {
        self.catalog
            .iter()
            .filter(|audio| {
                !self
                    .album
                    .as_ref()
                    .is_some_and(|album| album.contains_audio(&audio.id))
            })
            .collect()
    }

    /// Tracks of the album in order, resolved against the catalog when the
    /// album only carries ids.
    pub fn tracks(&self) -> Vec<&Audio> {
        let Some(album) = &self.album else {
            return Vec::new();
        };
        album
            .audios
            .iter()
            .filter_map(|track| {
                track
                    .populated()
                    .or_else(|| self.catalog.iter().find(|audio| audio.id == track.id()))
            })
            .collect()
    }
}

#[derive(Default)]
struct DetailState {
    slug: Option<String>,
    snapshot: AlbumDetailSnapshot,
}

pub struct AlbumDetailController {
    api: CatalogApi,
    session: Session,
    state: Mutex<DetailState>,
}

impl AlbumDetailController {
    pub fn new(api: CatalogApi, session: Session) -> Self {
        Self {
            api,
            session,
            state: Mutex::new(DetailState::default()),
        }
    }

    pub async fn snapshot(&self) -> AlbumDetailSnapshot {
        self.state.lock().await.snapshot.clone()
    }

    /// Fetch the album by slug together with the full audio list.
    pub async fn load(&self, slug: &str) -> ClientResult<()> {
        let everything = ListQuery::default();
        let result = tokio::try_join!(
            self.api.get::<Album>(&self.session, slug),
            self.api.list::<Audio>(&self.session, &everything),
        );

        let mut state = self.state.lock().await;
        state.slug = Some(slug.to_string());
        let (album, catalog) = match result {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::warn!(slug, error = %err, "Album load failed");
                state.snapshot.failed = true;
                return Err(err);
            }
        };
        state.snapshot.failed = false;
        state.snapshot.not_found = album.is_none();
        state.snapshot.album = album;
        state.snapshot.catalog = catalog;
        if state.snapshot.not_found {
            tracing::info!(slug, "Album not found");
        }
        Ok(())
    }

    async fn reload(&self) -> ClientResult<()> {
        let slug = self.state.lock().await.slug.clone();
        match slug {
            Some(slug) => self.load(&slug).await,
            None => Ok(()),
        }
    }

    async fn loaded_album(&self) -> ClientResult<Album> {
        let state = self.state.lock().await;
        state.snapshot.album.clone().ok_or_else(|| {
            ClientError::Core(CoreError::NotFound {
                entity: "Album",
                key: state.slug.clone().unwrap_or_default(),
            })
        })
    }

    /// Attach an existing audio. Attaching one that is already in the album
    /// is rejected without a request.
    pub async fn add_audio(&self, audio_id: &str) -> ClientResult<()> {
        let album = self.loaded_album().await?;
        if album.contains_audio(audio_id) {
            let err = ClientError::from(CoreError::Conflict(
                "Audio is already in this album".to_string(),
            ));
            self.record(Notice::from(&err)).await;
            return Err(err);
        }

        let result = self
            .api
            .add_audio_to_album(&self.session, &album.id, audio_id)
            .await;
        tracing::debug!(album = %album.id, audio = audio_id, ok = result.is_ok(), "Add audio to album");
        self.settle(result, "Successfully Added Audio To Album").await
    }

    pub async fn remove_audio(&self, audio_id: &str) -> ClientResult<()> {
        let album = self.loaded_album().await?;
        let result = self
            .api
            .remove_audio_from_album(&self.session, &album.id, audio_id)
            .await;
        tracing::debug!(album = %album.id, audio = audio_id, ok = result.is_ok(), "Remove audio from album");
        self.settle(result, "Successfully Removed Audio From Album").await
    }

    /// Create a new audio that the server attaches to this album.
    pub async fn create_audio(
        &self,
        draft: AudioDraft,
        attachments: Vec<Attachment>,
    ) -> ClientResult<()> {
        let album = self.loaded_album().await?;
        let draft = draft.in_album(album.id.clone());
        check(&draft)?;

        let result = self
            .api
            .create::<Audio>(&self.session, &draft, attachments)
            .await;
        self.settle(result, "Successfully Created Audio Under This Album")
            .await
    }

    async fn record(&self, notice: Notice) {
        self.state.lock().await.snapshot.notice = Some(notice);
    }

    /// Record the outcome of a change. A failed reload after a successful
    /// change only marks the snapshot as failed.
    async fn settle(&self, result: ClientResult<()>, success: &str) -> ClientResult<()> {
        match result {
            Ok(()) => {
                tracing::info!("{success}");
                self.record(Notice::success(success)).await;
                if let Err(err) = self.reload().await {
                    tracing::warn!(error = %err, "Reload after album change failed");
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Album membership change failed");
                self.record(Notice::from(&err)).await;
                Err(err)
            }
        }
    }
}
