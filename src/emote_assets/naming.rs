//! Object naming for archived emotes
//!
//! Archived objects are named `{id}_{animated|static}{ext}` under their
//! folder. The same pattern is parsed back when listing storage so records
//! recover their emote id without any side index.

use std::path::Path;

use crate::models::{ArchivedEmote, MimeType, StorageFolder};

/// Replace every character outside `[A-Za-z0-9._-]` with `_`
///
/// When anything was replaced, the CRC32 of the raw id is appended so that
/// ids differing only in replaced characters (`a/b`, `a_b`) keep distinct keys.
pub fn sanitize_id(id: &str) -> String {
    let sanitized: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized == id {
        sanitized
    } else {
        format!("{sanitized}-{:08x}", crc32fast::hash(id.as_bytes()))
    }
}

pub fn archive_file_name(entry_id: &str, animated: bool, mime: &MimeType) -> String {
    let kind = if animated { "animated" } else { "static" };
    format!("{}_{kind}{}", sanitize_id(entry_id), mime.extension())
}

/// Parts recovered from a file name produced by [`archive_file_name`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFileName {
    pub emote_id: String,
    pub animated: bool,
    pub mime: MimeType,
}

pub fn parse_archive_file_name(file_name: &str) -> Option<ParsedFileName> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    let mime = MimeType::from_extension(ext)?;
    let (id, kind) = stem.rsplit_once('_')?;
    let animated = match kind {
        "animated" => true,
        "static" => false,
        _ => return None,
    };
    if id.is_empty() {
        return None;
    }
    Some(ParsedFileName {
        emote_id: id.to_string(),
        animated,
        mime,
    })
}

/// Stable synthetic id for objects that were not written by the archiver
pub fn storage_emote_id(key: &str) -> String {
    format!("storage_{}", crc32fast::hash(key.as_bytes()) % 10_000_000)
}

/// Map a listed object key back to a record; directory markers yield `None`
pub fn record_from_key(folder: StorageFolder, key: &str, url: String) -> Option<ArchivedEmote> {
    let prefix = folder.prefix();
    let file_name = key.strip_prefix(prefix.as_str()).unwrap_or(key);
    if file_name.is_empty() || file_name.ends_with('/') {
        return None;
    }

    let emote_name = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string();

    let record = match parse_archive_file_name(file_name) {
        Some(parsed) => ArchivedEmote {
            file_name: file_name.to_string(),
            url,
            emote_id: parsed.emote_id,
            emote_name,
            owner: None,
            animated: parsed.animated,
            scale: None,
            mime: Some(parsed.mime.to_string()),
        },
        None => ArchivedEmote {
            file_name: file_name.to_string(),
            url,
            emote_id: storage_emote_id(key),
            emote_name,
            owner: None,
            animated: false,
            scale: None,
            mime: None,
        },
    };
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("60ae958e229664e8667aea38", "60ae958e229664e8667aea38")]
    #[case("a/b c", "a_b_c-904d1d86")]
    #[case("emote:1?x", "emote_1_x-bbb3aa99")]
    #[case("ok.id-1_2", "ok.id-1_2")]
    fn test_sanitize_id(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_id(raw), expected);
    }

    #[test]
    fn test_sanitized_ids_do_not_collide() {
        assert_eq!(sanitize_id("a_b"), "a_b");
        assert_eq!(sanitize_id("a/b"), "a_b-07f4401c");
        assert_ne!(
            archive_file_name("a/b", false, &MimeType::Webp),
            archive_file_name("a_b", false, &MimeType::Webp)
        );

        let parsed = parse_archive_file_name(&archive_file_name("a/b", true, &MimeType::Gif)).unwrap();
        assert_eq!(parsed.emote_id, "a_b-07f4401c");
        assert!(parsed.animated);
    }

    #[test]
    fn test_file_name_extension_follows_mime() {
        assert_eq!(archive_file_name("abc", true, &MimeType::Gif), "abc_animated.gif");
        assert_eq!(archive_file_name("abc", false, &MimeType::Webp), "abc_static.webp");
        assert_eq!(
            archive_file_name("abc", false, &MimeType::Other("image/jpeg".into())),
            "abc_static.png"
        );
    }

    #[test]
    fn test_parse_back_archived_name() {
        let parsed = parse_archive_file_name("01F6MQ_animated.webp").unwrap();
        assert_eq!(parsed.emote_id, "01F6MQ");
        assert!(parsed.animated);
        assert_eq!(parsed.mime, MimeType::Webp);

        assert!(parse_archive_file_name("holiday.png").is_none());
        assert!(parse_archive_file_name("a_moving.png").is_none());
    }

    #[test]
    fn test_record_from_foreign_key_uses_checksum_id() {
        let record = record_from_key(
            StorageFolder::EmoteApi,
            "emote_api/uploaded-by-hand.png",
            "https://store/emote_api/uploaded-by-hand.png".to_string(),
        )
        .unwrap();
        assert_eq!(record.file_name, "uploaded-by-hand.png");
        assert_eq!(record.emote_name, "uploaded-by-hand");
        assert_eq!(record.emote_id, storage_emote_id("emote_api/uploaded-by-hand.png"));
        assert!(record.emote_id.starts_with("storage_"));
    }

    #[test]
    fn test_directory_markers_are_skipped() {
        assert!(record_from_key(StorageFolder::TrendingEmotes, "trending_emotes/", String::new()).is_none());
        assert!(record_from_key(StorageFolder::TrendingEmotes, "trending_emotes/sub/", String::new()).is_none());
    }
}
