// Cover images for region clusters, keyed by the region's label text.
// An empty string means the region has no image yet.

const CDN: &str = "https://cdn.prod.website-files.com/678661730ea760533db7153d";

const CITY_IMAGES: &[(&str, &str)] = &[
    ("Hilo", "685d00c0066f35ff235125c1_hawaiian-islands-min.jpg"),
    ("Honolulu", "685d00cd75ee1977ab157fad_honolulu-min.jpg"),
    ("Kuai", ""),
    ("Los Angeles", "685d00ab84ef1711792a5fac_la-min.jpg"),
    ("Maui", ""),
    ("Salinas", ""),
    ("San Diego", "685d009ce55d7bf179d27c17_san-diego-min.jpg"),
    ("San Francisco", "685d00b8d3ebee9be09ac549_san-fransisco-min.jpg"),
    ("Santa Cruz", ""),
    ("Santa Maria", ""),
];

/// Image URL for a region, `Some("")` for known regions without one.
pub fn city_image(region: &str) -> Option<String> {
    CITY_IMAGES
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, file)| {
            if file.is_empty() {
                String::new()
            } else {
                format!("{CDN}/{file}")
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_regions_resolve() {
        assert_eq!(
            city_image("San Diego").as_deref(),
            Some("https://cdn.prod.website-files.com/678661730ea760533db7153d/685d009ce55d7bf179d27c17_san-diego-min.jpg")
        );
        assert_eq!(city_image("Maui").as_deref(), Some(""));
        assert_eq!(city_image("Atlantis"), None);
    }
}
