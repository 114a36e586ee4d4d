//! Filenames for persisted copies.
//!
//! `<stem>_<first 8 chars of id><ext>`, with an extension picked from the
//! media type when the original name has none. Two uploads that share a stem
//! and an 8-character id prefix map to the same name; that collision is
//! accepted, not repaired.

use crate::id::ContentId;
use crate::media::MediaType;

/// Split a name at its last `.` into `(stem, extension)`.
///
/// The extension keeps its leading dot and is empty when there is no dot.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name, ""),
    }
}

/// Derive the on-disk filename for a copy of `id`.
pub fn derive_name(original_name: &str, id: &ContentId, media_type: MediaType) -> String {
    let (stem, ext) = split_name(original_name);
    let mut name = format!("{}_{}{}", stem, id.short(), ext);
    if ext.is_empty() {
        name.push('.');
        name.push_str(media_type.extension());
    }
    name
}
