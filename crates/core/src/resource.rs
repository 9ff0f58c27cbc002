//! The [`Resource`] trait shared by every catalog entity type.
//!
//! Categories, albums and audio tracks are managed through the same
//! list/create/update/delete/thumbnail flow. Anything that flow needs to know
//! about a concrete entity type is expressed here.

use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

use crate::bilingual::Bilingual;

/// A catalog entity type managed by the generic list controller.
pub trait Resource: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    /// Metadata submitted as the `data` part of a create request.
    type Draft: Validate + Serialize + Send + Sync;

    /// Partial update body. Unset fields are not serialized.
    type Patch: Validate + Serialize + Send + Sync;

    /// URL path segment of the collection, e.g. `"categories"`.
    const COLLECTION: &'static str;

    /// Singular display name used in notices, e.g. `"Category"`.
    const LABEL: &'static str;

    fn id(&self) -> &str;

    fn slug(&self) -> &str;

    fn title(&self) -> &Bilingual;

    fn thumbnail(&self) -> Option<&str>;
}
