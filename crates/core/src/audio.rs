//! Audio (podcast) track entity and its payloads.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::bilingual::{validate_description, validate_title, Bilingual};
use crate::resource::Resource;
use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audio {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub title: Bilingual,
    pub description: Bilingual,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// URL of the media asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(rename = "isFree", default, deserialize_with = "deserialize_flag")]
    pub is_free: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub published: bool,
}

/// Metadata for `POST /audios`.
///
/// `albums` is set when a track is created from an album's detail view so
/// that the server attaches it on creation.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct AudioDraft {
    #[validate(custom(function = "validate_title"))]
    pub title: Bilingual,
    #[validate(custom(function = "validate_description"))]
    pub description: Bilingual,
    #[validate(length(min = 1, message = "Slug is required"))]
    pub slug: String,
    #[serde(rename = "isFree")]
    pub is_free: bool,
    pub published: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub albums: Vec<EntityId>,
}

impl AudioDraft {
    pub fn new(title: Bilingual, description: Bilingual, slug: impl Into<String>) -> Self {
        Self {
            title,
            description,
            slug: slug.into(),
            is_free: false,
            published: false,
            albums: Vec::new(),
        }
    }

    pub fn free(mut self, is_free: bool) -> Self {
        self.is_free = is_free;
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    pub fn in_album(mut self, album_id: impl Into<EntityId>) -> Self {
        self.albums.push(album_id.into());
        self
    }
}

/// Body for `PATCH /audios/{id}`.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct AudioPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_title"))]
    pub title: Option<Bilingual>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_description"))]
    pub description: Option<Bilingual>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Slug is required"))]
    pub slug: Option<String>,
    #[serde(rename = "isFree", skip_serializing_if = "Option::is_none")]
    pub is_free: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl Resource for Audio {
    type Draft = AudioDraft;
    type Patch = AudioPatch;

    const COLLECTION: &'static str = "audios";
    const LABEL: &'static str = "Audio";

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

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

/// Accepts a JSON bool or the strings `"true"` / `"false"`.
///
/// Older records store `published` as text.
fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(D::Error::custom(format!(
                "expected a boolean or \"true\"/\"false\", got \"{other}\""
            ))),
        },
    }
}
