//! Two-language text values.
//!
//! Every human-readable catalog field (titles, descriptions) carries the same
//! value in English and Arabic. On the wire this is an ordered array of
//! `{ "lang", "value" }` pairs; in memory it is a [`Bilingual`] which cannot
//! hold anything other than exactly one English and one Arabic entry.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::ValidationError;

/// Supported content languages, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    Ar,
}

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Ar => "ar",
        }
    }

    /// Human-readable label used in form messages.
    pub fn label(self) -> &'static str {
        match self {
            Lang::En => "English",
            Lang::Ar => "Arabic",
        }
    }
}

/// A single `{ "lang": "en", "value": "..." }` wire entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub lang: Lang,
    pub value: String,
}

/// A text value in both supported languages.
///
/// Serializes as `[{lang: "en", ..}, {lang: "ar", ..}]`. Decoding accepts the
/// two entries in either order but rejects missing, duplicate or extra ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LocalizedText>", into = "Vec<LocalizedText>")]
pub struct Bilingual {
    en: String,
    ar: String,
}

impl Bilingual {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    pub fn en(&self) -> &str {
        &self.en
    }

    pub fn ar(&self) -> &str {
        &self.ar
    }

    pub fn get(&self, lang: Lang) -> &str {
        match lang {
            Lang::En => &self.en,
            Lang::Ar => &self.ar,
        }
    }

    /// The first language whose value is blank, if any.
    pub fn first_blank(&self) -> Option<Lang> {
        [Lang::En, Lang::Ar]
            .into_iter()
            .find(|lang| self.get(*lang).trim().is_empty())
    }
}

impl TryFrom<Vec<LocalizedText>> for Bilingual {
    type Error = String;

    fn try_from(entries: Vec<LocalizedText>) -> Result<Self, Self::Error> {
        if entries.len() != 2 {
            return Err(format!(
                "expected exactly 2 localized entries (en, ar), got {}",
                entries.len()
            ));
        }

        let mut en = None;
        let mut ar = None;
        for entry in entries {
            let slot = match entry.lang {
                Lang::En => &mut en,
                Lang::Ar => &mut ar,
            };
            if slot.replace(entry.value).is_some() {
                return Err(format!("duplicate '{}' entry", entry.lang.as_str()));
            }
        }

        match (en, ar) {
            (Some(en), Some(ar)) => Ok(Self { en, ar }),
            _ => Err("both 'en' and 'ar' entries are required".to_string()),
        }
    }
}

impl From<Bilingual> for Vec<LocalizedText> {
    fn from(text: Bilingual) -> Self {
        vec![
            LocalizedText {
                lang: Lang::En,
                value: text.en,
            },
            LocalizedText {
                lang: Lang::Ar,
                value: text.ar,
            },
        ]
    }
}

// ---------------------------------------------------------------------------
// Validators (used by `#[validate(custom(..))]` on drafts and patches)
// ---------------------------------------------------------------------------

fn blank_error(field: &'static str, lang: Lang) -> ValidationError {
    let mut err = ValidationError::new("required");
    err.message = Some(Cow::Owned(format!("{field} ({}) is required", lang.label())));
    err
}

/// Both title entries must be non-blank.
pub fn validate_title(value: &Bilingual) -> Result<(), ValidationError> {
    match value.first_blank() {
        Some(lang) => Err(blank_error("Title", lang)),
        None => Ok(()),
    }
}

/// Both description entries must be non-blank.
pub fn validate_description(value: &Bilingual) -> Result<(), ValidationError> {
    match value.first_blank() {
        Some(lang) => Err(blank_error("Description", lang)),
        None => Ok(()),
    }
}
