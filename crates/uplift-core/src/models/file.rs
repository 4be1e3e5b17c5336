use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A local file handed over by a file picker or drag-drop source.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Descriptive part of the file kept on its upload record.
    pub fn source(&self) -> FileSource {
        FileSource {
            name: self.name.clone(),
            content_type: self.content_type.clone(),
            size_bytes: self.size(),
        }
    }
}

/// Name, declared MIME type and byte length of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSource {
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

impl FileSource {
    pub fn is_image(&self) -> bool {
        self.content_type.to_lowercase().starts_with("image/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_reports_size() {
        let file = LocalFile::new("notes.txt", "text/plain", b"hello".to_vec());
        let source = file.source();

        assert_eq!(source.name, "notes.txt");
        assert_eq!(source.size_bytes, 5);
        assert!(!source.is_image());
    }

    #[test]
    fn test_is_image_ignores_case() {
        let file = LocalFile::new("photo.PNG", "Image/PNG", Bytes::new());
        assert!(file.source().is_image());
    }
}
