//! Category entity and its payloads.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::album::Album;
use crate::bilingual::{validate_description, validate_title, Bilingual};
use crate::reference::Ref;
use crate::resource::Resource;
use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub title: Bilingual,
    pub description: Bilingual,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub albums: Vec<Ref<Album>>,
}

impl Category {
    pub fn album_count(&self) -> usize {
        self.albums.len()
    }
}

/// Metadata for `POST /categories`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CategoryDraft {
    #[validate(custom(function = "validate_title"))]
    pub title: Bilingual,
    #[validate(custom(function = "validate_description"))]
    pub description: Bilingual,
    #[validate(length(min = 1, message = "Slug is required"))]
    pub slug: String,
}

impl CategoryDraft {
    pub fn new(title: Bilingual, description: Bilingual, slug: impl Into<String>) -> Self {
        Self {
            title,
            description,
            slug: slug.into(),
        }
    }
}

/// Body for `PATCH /categories/{id}`.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_title"))]
    pub title: Option<Bilingual>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_description"))]
    pub description: Option<Bilingual>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Slug is required"))]
    pub slug: Option<String>,
}

impl Resource for Category {
    type Draft = CategoryDraft;
    type Patch = CategoryPatch;

    const COLLECTION: &'static str = "categories";
    const LABEL: &'static str = "Category";

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
