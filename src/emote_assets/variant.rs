//! Best-variant selection
//!
//! Animated renditions always beat static ones. Within the preferred group the
//! ranking is MIME preference, then scale, then width, then URL, which makes
//! the winner independent of the order the upstream listed variants in.

use std::cmp::{Ordering, Reverse};

use crate::models::ImageVariant;

/// Pick the single variant to archive for an entry, `None` when there are none
pub fn select_best_variant(variants: &[ImageVariant]) -> Option<&ImageVariant> {
    let has_animated = variants.iter().any(ImageVariant::is_animated);

    variants
        .iter()
        .filter(|v| v.is_animated() == has_animated)
        .min_by(|a, b| compare_preference(a, b))
}

/// `Less` means `a` is preferred over `b`
fn compare_preference(a: &ImageVariant, b: &ImageVariant) -> Ordering {
    let key = |v: &ImageVariant| (Reverse(v.mime.rank()), Reverse(v.scale), Reverse(v.width));
    key(a)
        .cmp(&key(b))
        .then_with(|| a.url.cmp(&b.url))
        .then_with(|| a.mime.as_str().cmp(b.mime.as_str()))
        .then_with(|| b.frame_count().cmp(&a.frame_count()))
}
