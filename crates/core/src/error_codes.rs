//! Server error codes and their display text.
//!
//! The catalog API reports business errors as a machine-readable code. This
//! table is the single place those codes are turned into user-facing text.
//! Unknown codes fall back to [`GENERIC_MESSAGE`].

/// Shown whenever no better message is available.
pub const GENERIC_MESSAGE: &str = "Something went wrong";

/// Shown when sign-in does not yield a token.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

/// Known server error codes, in no particular order.
pub const ERROR_TRANSLATIONS: &[(&str, &str)] = &[
    ("INVALID_CREDENTIALS", INVALID_CREDENTIALS_MESSAGE),
    ("USER_NOT_FOUND", INVALID_CREDENTIALS_MESSAGE),
    ("UNAUTHORIZED", "Your session has expired, please sign in again"),
    ("TOKEN_EXPIRED", "Your session has expired, please sign in again"),
    ("INVALID_TOKEN", "The reset link is invalid or has expired"),
    ("FORBIDDEN", "You are not allowed to perform this action"),
    ("SLUG_ALREADY_EXISTS", "Slug already exists"),
    ("CATEGORY_NOT_FOUND", "Category not found"),
    ("ALBUM_NOT_FOUND", "Album not found"),
    ("AUDIO_NOT_FOUND", "Audio not found"),
    ("CATEGORY_HAS_ALBUMS", "Category still has albums"),
    ("AUDIO_ALREADY_IN_ALBUM", "Audio is already in this album"),
    ("AUDIO_NOT_IN_ALBUM", "Audio is not in this album"),
    ("FILE_REQUIRED", "A file is required"),
    ("INVALID_FILE_TYPE", "Unsupported file type"),
    ("FILE_TOO_LARGE", "File is too large"),
    ("VALIDATION_ERROR", "Some fields are invalid"),
];

/// Look up the display text for a server error code.
pub fn lookup(code: &str) -> Option<&'static str> {
    let code = code.trim();
    ERROR_TRANSLATIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, message)| *message)
}

/// Display text for a server error code, or [`GENERIC_MESSAGE`].
pub fn translate(code: &str) -> &'static str {
    lookup(code).unwrap_or(GENERIC_MESSAGE)
}
