use crate::geojson_features::Feature;
use crate::view_state::PlaceFilter;

/// Select the features to draw for the current place filter and search text.
///
/// `PlaceFilter::None` returns nothing, whatever the search text. A type
/// filter keeps features whose `place` property equals the type exactly. A
/// non-empty search keeps features whose name contains it, ignoring case.
/// Source order is preserved and the input is never modified.
pub fn filter_features<'a, I>(features: I, place_filter: PlaceFilter, search_text: &str) -> Vec<&'a Feature>
where
    I: IntoIterator<Item = &'a Feature>,
{
    if place_filter == PlaceFilter::None {
        return Vec::new();
    }

    let category = place_filter.category();
    let needle = search_text.to_lowercase();
    features
        .into_iter()
        .filter(|feature| matches_category(feature, category))
        .filter(|feature| matches_search(feature, &needle))
        .collect()
}

fn matches_category(feature: &Feature, category: Option<&str>) -> bool {
    match category {
        Some(category) => feature.place() == Some(category),
        None => true,
    }
}

// `needle` is already lowercased
fn matches_search(feature: &Feature, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    feature
        .name()
        .map(|name| name.to_lowercase().contains(needle))
        .unwrap_or(false)
}
