use std::path::Path;

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct FileData {
    pub content: Vec<u8>,
    pub filename: String,
    pub mime_type: Option<String>,
}

impl FileData {
    pub fn new(content: Vec<u8>, filename: String, mime_type: Option<String>) -> Self {
        Self {
            content,
            filename,
            mime_type,
        }
    }

    pub fn validate_size(&self, max_size: u64) -> bool {
        self.size() <= max_size
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn content_type(&self) -> String {
        resolve_content_type(self.mime_type.as_deref(), &self.filename)
    }

    /// Lowercased extension of the filename, if it is plain ASCII alphanumeric.
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.filename)
    }
}

/// Reduces a client-supplied filename to its final path component.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("").trim();

    match name {
        "" | "." | ".." => None,
        name if name.chars().any(char::is_control) => None,
        name => Some(name.to_string()),
    }
}

pub fn file_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Picks the content type served for an image.
///
/// A declared `image/*` type wins, then the filename extension, then the
/// generic binary type.
pub fn resolve_content_type(declared: Option<&str>, filename: &str) -> String {
    if let Some(declared) = declared.map(str::trim) {
        if declared.to_ascii_lowercase().starts_with("image/") {
            return declared.to_ascii_lowercase();
        }
    }

    let guessed = match file_extension(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") | Some("jpe") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("avif") => "image/avif",
        Some("heic") => "image/heic",
        _ => FALLBACK_CONTENT_TYPE,
    };
    guessed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_plain_names() {
        assert_eq!(sanitize_filename("a.png").as_deref(), Some("a.png"));
        assert_eq!(sanitize_filename("  cat photo.jpg ").as_deref(), Some("cat photo.jpg"));
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\Users\\me\\b.gif").as_deref(), Some("b.gif"));
    }

    #[test]
    fn sanitize_rejects_empty_and_dot_names() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("dir/"), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("a\nb.png"), None);
    }

    #[test]
    fn declared_image_type_wins() {
        assert_eq!(resolve_content_type(Some("image/PNG"), "x.jpg"), "image/png");
    }

    #[test]
    fn non_image_declared_type_falls_back_to_extension() {
        assert_eq!(
            resolve_content_type(Some("application/octet-stream"), "x.webp"),
            "image/webp"
        );
        assert_eq!(resolve_content_type(None, "photo.JPEG"), "image/jpeg");
    }

    #[test]
    fn unknown_extension_is_binary() {
        assert_eq!(resolve_content_type(None, "notes.txt"), FALLBACK_CONTENT_TYPE);
        assert_eq!(resolve_content_type(None, "noext"), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn extension_requires_alphanumerics() {
        assert_eq!(file_extension("a.PNG").as_deref(), Some("png"));
        assert_eq!(file_extension("a.p-g"), None);
        assert_eq!(file_extension("a"), None);
    }

    #[test]
    fn size_validation() {
        let file = FileData::new(vec![0; 10], "a.png".to_string(), None);
        assert_eq!(file.size(), 10);
        assert!(file.validate_size(10));
        assert!(!file.validate_size(9));
    }
}
