//! Media Storage Module
//!
//! Local-disk image storage for chat messages and profile photos.
//!
//! Files are written as `{root}/{subdir}/{uuid}.{ext}` and the database
//! stores the root-relative path. Absolute URLs are assembled per request
//! from the `Host` header: plain http everywhere except production.

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::shared::error::AppError;

/// Subdirectory for message image attachments.
pub const CHAT_IMAGES_DIR: &str = "chat_images";

/// Subdirectory for profile photos.
pub const USER_PHOTOS_DIR: &str = "user_photos";

/// Upload types accepted for images.
const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Local-disk media store rooted at the configured media directory.
#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist an uploaded image under `subdir`.
    ///
    /// Returns the media-root relative path that gets stored in the
    /// database. The stored file name is a fresh UUID so uploads can
    /// never collide or overwrite each other.
    pub async fn save_image(
        &self,
        subdir: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        let ext = extension(original_name)?;
        let file_name = format!("{}.{}", Uuid::new_v4(), ext);

        let dir = self.root.join(subdir);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create media directory: {}", e)))?;

        let path = dir.join(&file_name);
        fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store image: {}", e)))?;

        Ok(format!("{}/{}", subdir, file_name))
    }
}

/// Validated, lowercased image extension from an upload filename.
fn extension(original_name: &str) -> Result<String, AppError> {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| AppError::Validation("image: file name has no extension".into()))?;

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::Validation(format!(
            "image: unsupported file type '{}'",
            ext
        )));
    }

    Ok(ext)
}

/// Absolute URL for a stored media path.
///
/// The original deployment serves plain http in development and sits
/// behind TLS in production, so the scheme follows the environment.
pub fn absolute_url(is_production: bool, host: &str, media_path: &str) -> String {
    let scheme = if is_production { "https" } else { "http" };
    format!("{}://{}/media/{}", scheme, host, media_path)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("photo.PNG" => true; "uppercase png")]
    #[test_case("pic.jpeg" => true; "jpeg")]
    #[test_case("anim.gif" => true; "gif")]
    #[test_case("doc.pdf" => false; "pdf rejected")]
    #[test_case("noext" => false; "missing extension")]
    fn test_extension_rules(name: &str) -> bool {
        extension(name).is_ok()
    }

    #[test]
    fn test_absolute_url_development_uses_http() {
        use pretty_assertions::assert_eq;

        assert_eq!(
            absolute_url(false, "localhost:3000", "chat_images/a.png"),
            "http://localhost:3000/media/chat_images/a.png"
        );
    }

    #[test]
    fn test_absolute_url_production_uses_https() {
        use pretty_assertions::assert_eq;

        assert_eq!(
            absolute_url(true, "skillswap.example.com", "user_photos/b.jpg"),
            "https://skillswap.example.com/media/user_photos/b.jpg"
        );
    }

    #[tokio::test]
    async fn test_save_image_writes_relative_path() {
        use pretty_assertions::assert_eq;

        let root = std::env::temp_dir().join(format!("media-test-{}", Uuid::new_v4()));
        let store = MediaStore::new(&root);

        let path = store
            .save_image(CHAT_IMAGES_DIR, "photo.png", b"fake image bytes")
            .await
            .unwrap();

        assert!(path.starts_with("chat_images/"));
        assert!(path.ends_with(".png"));
        let on_disk = root.join(&path);
        assert_eq!(fs::read(&on_disk).await.unwrap(), b"fake image bytes");

        let _ = fs::remove_dir_all(&root).await;
    }
}
