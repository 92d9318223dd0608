//! Request parameter types for Drive operations.

use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// Sort order for folder listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
}

impl SortOrder {
    /// Parse a query-string value, defaulting to ascending.
    pub fn from_param(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "name_desc" => Self::NameDesc,
            _ => Self::NameAsc,
        }
    }

    /// The Drive `orderBy` clause. Folders sort before files either way.
    pub fn order_by(&self) -> &'static str {
        match self {
            Self::NameAsc => "folder, name",
            Self::NameDesc => "folder desc, name desc",
        }
    }
}

/// Entry-kind filter for folder listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListKind {
    #[default]
    All,
    Folders,
    Files,
}

impl ListKind {
    /// Parse a query-string value, defaulting to all entries.
    pub fn from_param(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "folder" => Self::Folders,
            "file" => Self::Files,
            _ => Self::All,
        }
    }
}

/// Parameters for listing the children of a folder.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Folder whose children to list.
    pub folder_id: String,
    /// Substring filter on file names.
    pub search: Option<String>,
    /// Continuation token from a previous page.
    pub page_token: Option<String>,
    /// Requested page size, clamped to 1..=100.
    pub page_size: Option<u32>,
    pub order: SortOrder,
    pub kind: ListKind,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            folder_id: "root".to_string(),
            search: None,
            page_token: None,
            page_size: None,
            order: SortOrder::default(),
            kind: ListKind::default(),
        }
    }
}

impl ListQuery {
    pub fn folder(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            ..Self::default()
        }
    }
}

/// Boxed byte stream handed back from media fetches.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'static>>;

/// A media download proxied from Drive.
///
/// Carries the upstream status (200 or 206) and the response headers a
/// streaming proxy forwards verbatim.
pub struct MediaStream {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<String>,
    pub accept_ranges: Option<String>,
    pub content_range: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub body: ByteStream,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!(SortOrder::from_param("name_desc"), SortOrder::NameDesc);
        assert_eq!(SortOrder::from_param("NAME_DESC"), SortOrder::NameDesc);
        assert_eq!(SortOrder::from_param("name_asc"), SortOrder::NameAsc);
        assert_eq!(SortOrder::from_param("anything"), SortOrder::NameAsc);
    }

    #[test]
    fn test_order_by_clause() {
        assert_eq!(SortOrder::NameAsc.order_by(), "folder, name");
        assert_eq!(SortOrder::NameDesc.order_by(), "folder desc, name desc");
    }

    #[test]
    fn test_list_kind_parsing() {
        assert_eq!(ListKind::from_param("folder"), ListKind::Folders);
        assert_eq!(ListKind::from_param("file"), ListKind::Files);
        assert_eq!(ListKind::from_param("all"), ListKind::All);
        assert_eq!(ListKind::from_param(""), ListKind::All);
    }

    #[test]
    fn test_list_query_defaults_to_root() {
        let query = ListQuery::default();
        assert_eq!(query.folder_id, "root");
        assert!(query.page_token.is_none());
    }
}
