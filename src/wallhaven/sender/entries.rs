use serde::Deserialize;

/// One page of search or collection results.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ImagesResponse {
    /// The images on this page, in the order the service returned them.
    pub(crate) data: Vec<ImageEntry>,
    /// Pagination metadata for this page.
    pub(crate) meta: MetaEntry,
}

/// An immutable description of one discoverable image.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ImageEntry {
    pub(crate) id: String,
    /// Display resolution, e.g. "1920x1080".
    pub(crate) resolution: String,
    /// Canonical address of the full image, used for both preview and download.
    #[serde(rename = "path")]
    pub(crate) image_url: String,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct MetaEntry {
    pub(crate) current_page: u32,
    pub(crate) last_page: u32,
}

/// The collections a user has published.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct CollectionsResponse {
    pub(crate) data: Vec<CollectionEntry>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct CollectionEntry {
    pub(crate) id: u32,
    pub(crate) label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_search_page() {
        let json = r#"{
            "data": [
                {"id": "abc123", "resolution": "2560x1440", "path": "https://w.wallhaven.cc/full/ab/wallhaven-abc123.png", "purity": "sfw"}
            ],
            "meta": {"current_page": 2, "last_page": 7, "total": 161}
        }"#;

        let page: ImagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, "abc123");
        assert_eq!(
            page.data[0].image_url,
            "https://w.wallhaven.cc/full/ab/wallhaven-abc123.png"
        );
        assert_eq!(page.meta.current_page, 2);
        assert_eq!(page.meta.last_page, 7);
    }

    #[test]
    fn deserializes_collection_listing() {
        let json = r#"{"data": [{"id": 42, "label": "Minimal", "views": 9}]}"#;

        let collections: CollectionsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(collections.data.len(), 1);
        assert_eq!(collections.data[0].id, 42);
        assert_eq!(collections.data[0].label, "Minimal");
    }
}
