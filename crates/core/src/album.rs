//! Album entity and its payloads.
//!
//! An album belongs to one category and holds an ordered list of audio track
//! references. The list is referential: removing a track from the catalog
//! detaches it from every album, the album itself survives.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::audio::Audio;
use crate::bilingual::{validate_description, validate_title, Bilingual};
use crate::category::Category;
use crate::reference::Ref;
use crate::resource::Resource;
use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub title: Bilingual,
    pub description: Bilingual,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Ref<Category>>,
    #[serde(default)]
    pub audios: Vec<Ref<Audio>>,
}

impl Album {
    pub fn category_id(&self) -> Option<&str> {
        self.category.as_ref().map(Ref::id)
    }

    /// Track ids in album order.
    pub fn track_ids(&self) -> impl Iterator<Item = &str> {
        self.audios.iter().map(Ref::id)
    }

    pub fn contains_audio(&self, audio_id: &str) -> bool {
        self.track_ids().any(|id| id == audio_id)
    }
}

/// Metadata for `POST /albums`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct AlbumDraft {
    #[validate(custom(function = "validate_title"))]
    pub title: Bilingual,
    #[validate(custom(function = "validate_description"))]
    pub description: Bilingual,
    #[validate(length(min = 1, message = "Slug is required"))]
    pub slug: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: EntityId,
}

impl AlbumDraft {
    pub fn new(
        title: Bilingual,
        description: Bilingual,
        slug: impl Into<String>,
        category: impl Into<EntityId>,
    ) -> Self {
        Self {
            title,
            description,
            slug: slug.into(),
            category: category.into(),
        }
    }
}

/// Body for `PATCH /albums/{id}`.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct AlbumPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_title"))]
    pub title: Option<Bilingual>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_description"))]
    pub description: Option<Bilingual>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Slug is required"))]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: Option<EntityId>,
}

impl Resource for Album {
    type Draft = AlbumDraft;
    type Patch = AlbumPatch;

    const COLLECTION: &'static str = "albums";
    const LABEL: &'static str = "Album";

    fn id(&self) -> &str {
        &self.id
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn title(&self) -> &Bilingual {
        &self.title
    }

    fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }
}
