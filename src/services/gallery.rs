//! Gallery grouping for an event's photos.

use crate::models::evidence::EvidencePhoto;
use serde::Serialize;
use std::collections::BTreeMap;

/// Photos sharing one category, ready for display.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GallerySection<T = EvidencePhoto> {
    pub category: String,
    pub title: String,
    pub photos: Vec<T>,
}

/// Partition `items` by the key `category_of` returns.
///
/// Sections come back ordered by category ascending; each section keeps the
/// relative input order of its items.
pub fn group_by<T, F>(items: impl IntoIterator<Item = T>, category_of: F) -> Vec<GallerySection<T>>
where
    F: Fn(&T) -> &str,
{
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        let key = category_of(&item).to_string();
        groups.entry(key).or_default().push(item);
    }

    groups
        .into_iter()
        .map(|(category, photos)| GallerySection {
            title: display_category(&category),
            category,
            photos,
        })
        .collect()
}

pub fn group_by_category(photos: Vec<EvidencePhoto>) -> Vec<GallerySection> {
    group_by(photos, |photo| photo.record.category.as_str())
}

/// `"site_visit"` becomes `"Site Visit"`. Word starts follow Unicode
/// alphanumerics, so `"über_x"` becomes `"Über X"`.
pub fn display_category(category: &str) -> String {
    let spaced = category.replace('_', " ");
    let mut out = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for ch in spaced.chars() {
        if at_word_start && ch.is_alphanumeric() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !ch.is_alphanumeric();
    }
    out
}
