//! Generic list controller for one catalog collection.
//!
//! [`ResourceController`] keeps the local view of a collection (items filtered
//! by the current search term, the open dialog and the last notice) in sync
//! with the server. It is generic over the entity type and over the remote
//! operations, so categories, albums and audios share one implementation.
//!
//! State lives behind a [`tokio::sync::Mutex`] that is never held across a
//! request. Overlapping fetches are ordered by [`Generation`] tokens.

use musicly_core::error::CoreError;
use musicly_core::forms::check;
use musicly_core::resource::Resource;
use musicly_core::types::EntityId;
use tokio::sync::Mutex;
use validator::Validate;

use crate::api::{Attachment, ListQuery, ResourceApi};
use crate::error::{ClientError, ClientResult};
use crate::generation::Generation;
use crate::notice::Notice;
use crate::session::Session;

/// Which modal is open over the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Create,
    Edit(EntityId),
    Delete(EntityId),
    Thumbnail(EntityId),
}

/// Point-in-time copy of a controller's state.
#[derive(Debug, Clone)]
pub struct ListSnapshot<R> {
    pub items: Vec<R>,
    pub search_term: String,
    pub offset: Option<u32>,
    pub loading: bool,
    pub failed: bool,
    pub dialog: Option<Dialog>,
    /// Inline validation error of the open form.
    pub form_error: Option<String>,
    pub notice: Option<Notice>,
}

struct ListState<R> {
    items: Vec<R>,
    search_term: String,
    offset: Option<u32>,
    generation: Generation,
    failed: bool,
    dialog: Option<Dialog>,
    form_error: Option<String>,
    notice: Option<Notice>,
}

impl<R> Default for ListState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            search_term: String::new(),
            offset: None,
            generation: Generation::new(),
            failed: false,
            dialog: None,
            form_error: None,
            notice: None,
        }
    }
}

pub struct ResourceController<R: Resource, A> {
    api: A,
    session: Session,
    page_size: Option<u32>,
    state: Mutex<ListState<R>>,
}

impl<R, A> ResourceController<R, A>
where
    R: Resource,
    A: ResourceApi<R>,
{
    pub fn new(api: A, session: Session) -> Self {
        Self {
            api,
            session,
            page_size: None,
            state: Mutex::new(ListState::default()),
        }
    }

    /// Enable `limit`/`offset` paging with the given page size.
    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn snapshot(&self) -> ListSnapshot<R> {
        let state = self.state.lock().await;
        ListSnapshot {
            items: state.items.clone(),
            search_term: state.search_term.clone(),
            offset: state.offset,
            loading: state.generation.is_pending(),
            failed: state.failed,
            dialog: state.dialog.clone(),
            form_error: state.form_error.clone(),
            notice: state.notice.clone(),
        }
    }

    pub async fn items(&self) -> Vec<R> {
        self.state.lock().await.items.clone()
    }

    pub async fn find(&self, id: &str) -> Option<R> {
        let state = self.state.lock().await;
        state.items.iter().find(|item| item.id() == id).cloned()
    }

    // -----------------------------------------------------------------------
    // Fetching
    // -----------------------------------------------------------------------

    /// Search by `term` from the first page.
    pub async fn fetch(&self, term: &str) -> ClientResult<()> {
        {
            let mut state = self.state.lock().await;
            state.search_term = term.to_string();
            state.offset = None;
        }
        self.run_fetch().await
    }

    /// Fetch the page at `offset` for the current term.
    pub async fn fetch_page(&self, offset: u32) -> ClientResult<()> {
        self.state.lock().await.offset = Some(offset);
        self.run_fetch().await
    }

    /// Search by `term` starting at `offset`.
    pub async fn search_page(&self, term: &str, offset: u32) -> ClientResult<()> {
        {
            let mut state = self.state.lock().await;
            state.search_term = term.to_string();
            state.offset = Some(offset);
        }
        self.run_fetch().await
    }

    /// Refetch with the current term and page.
    pub async fn refresh(&self) -> ClientResult<()> {
        self.run_fetch().await
    }

    async fn run_fetch(&self) -> ClientResult<()> {
        let (token, query) = {
            let mut state = self.state.lock().await;
            let query = ListQuery {
                content: state.search_term.clone(),
                limit: self.page_size,
                offset: self.page_size.map(|_| state.offset.unwrap_or(0)),
            };
            (state.generation.start(), query)
        };

        let result = self.api.list(&self.session, &query).await;

        let mut state = self.state.lock().await;
        if !state.generation.finish(token) {
            tracing::debug!(
                collection = R::COLLECTION,
                term = %query.content,
                "Discarding stale list response"
            );
            return Ok(());
        }

        match result {
            Ok(items) => {
                tracing::debug!(collection = R::COLLECTION, count = items.len(), "List fetched");
                state.items = items;
                state.failed = false;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(collection = R::COLLECTION, error = %err, "List fetch failed");
                state.failed = true;
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Dialogs
    // -----------------------------------------------------------------------

    pub async fn open_create(&self) {
        self.open(Dialog::Create).await;
    }

    pub async fn open_edit(&self, id: impl Into<EntityId>) {
        self.open(Dialog::Edit(id.into())).await;
    }

    pub async fn open_delete(&self, id: impl Into<EntityId>) {
        self.open(Dialog::Delete(id.into())).await;
    }

    pub async fn open_thumbnail(&self, id: impl Into<EntityId>) {
        self.open(Dialog::Thumbnail(id.into())).await;
    }

    pub async fn close_dialog(&self) {
        let mut state = self.state.lock().await;
        state.dialog = None;
        state.form_error = None;
    }

    pub async fn dialog(&self) -> Option<Dialog> {
        self.state.lock().await.dialog.clone()
    }

    pub async fn notice(&self) -> Option<Notice> {
        self.state.lock().await.notice.clone()
    }

    async fn open(&self, dialog: Dialog) {
        let mut state = self.state.lock().await;
        state.dialog = Some(dialog);
        state.form_error = None;
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create an entity. Validation failures keep the dialog open and send
    /// nothing.
    pub async fn create(&self, draft: R::Draft, attachments: Vec<Attachment>) -> ClientResult<()> {
        self.validate_form(&draft).await?;
        self.close_dialog().await;

        let result = self.api.create(&self.session, &draft, attachments).await;
        self.settle(result, format!("Successfully Added {}", R::LABEL))
            .await
    }

    /// Apply a partial update. An empty patch is a validation error.
    pub async fn update(&self, id: &str, patch: R::Patch) -> ClientResult<()> {
        self.validate_form(&patch).await?;
        if is_empty_patch(&patch) {
            return self
                .reject_form(CoreError::Validation("Nothing to update".into()))
                .await;
        }
        self.close_dialog().await;

        let result = self.api.update(&self.session, id, &patch).await;
        self.settle(result, format!("Successfully Edited {}", R::LABEL))
            .await
    }

    pub async fn remove(&self, id: &str) -> ClientResult<()> {
        self.close_dialog().await;

        let result = self.api.remove(&self.session, id).await;
        self.settle(result, format!("Successfully Deleted {}", R::LABEL))
            .await
    }

    /// Replace the thumbnail. Without a file the dialog closes and nothing
    /// is sent.
    pub async fn update_thumbnail(&self, id: &str, file: Option<Attachment>) -> ClientResult<()> {
        self.close_dialog().await;
        let Some(file) = file else {
            return Ok(());
        };

        let result = self.api.update_thumbnail(&self.session, id, file).await;
        self.settle(result, format!("Successfully Edited {} Image", R::LABEL))
            .await
    }

    async fn validate_form<T: Validate>(&self, form: &T) -> ClientResult<()> {
        match check(form) {
            Ok(()) => Ok(()),
            Err(err) => self.reject_form(err).await,
        }
    }

    async fn reject_form(&self, err: CoreError) -> ClientResult<()> {
        let err = ClientError::from(err);
        self.state.lock().await.form_error = Some(err.user_message());
        Err(err)
    }

    /// Record the outcome of a mutation and refetch once on success.
    ///
    /// The mutation result is returned as is. A failed refetch only sets the
    /// `failed` flag of the list.
    async fn settle(&self, result: ClientResult<()>, success: String) -> ClientResult<()> {
        match result {
            Ok(()) => {
                tracing::info!(collection = R::COLLECTION, "{success}");
                self.state.lock().await.notice = Some(Notice::success(success));
                if let Err(err) = self.refresh().await {
                    tracing::warn!(collection = R::COLLECTION, error = %err, "Refetch after mutation failed");
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(collection = R::COLLECTION, error = %err, "Mutation failed");
                self.state.lock().await.notice = Some(Notice::from(&err));
                Err(err)
            }
        }
    }
}

fn is_empty_patch<P: serde::Serialize>(patch: &P) -> bool {
    serde_json::to_value(patch)
        .ok()
        .and_then(|value| value.as_object().map(serde_json::Map::is_empty))
        .unwrap_or(false)
}
