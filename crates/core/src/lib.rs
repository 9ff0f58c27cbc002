//! Domain types for the Musicly catalog administration client.
//!
//! This crate has no I/O. It defines the catalog entities, their create and
//! update payloads, client-side form validation and the error-code
//! translation table shared by the HTTP client and the CLI.

pub mod album;
pub mod audio;
pub mod bilingual;
pub mod category;
pub mod error;
pub mod error_codes;
pub mod forms;
pub mod reference;
pub mod resource;
pub mod types;

pub use album::{Album, AlbumDraft, AlbumPatch};
pub use audio::{Audio, AudioDraft, AudioPatch};
pub use bilingual::{Bilingual, Lang};
pub use category::{Category, CategoryDraft, CategoryPatch};
pub use reference::Ref;
pub use resource::Resource;
