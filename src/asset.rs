use crate::constants::{BYTES_PER_KIB, MAX_FILE_SIZE};
use crate::error::{Result, SessionError};
use bytes::Bytes;
use parking_lot::Mutex;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Converts a byte count to KiB rounded to two decimal places.
///
/// # Example
/// ```
/// use img_squeeze_client::asset::size_kib;
///
/// assert_eq!(size_kib(102_400), 100.0);
/// assert_eq!(format!("{:.2}", size_kib(1)), "0.00");
/// ```
pub fn size_kib(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_KIB * 100.0).round() / 100.0
}

/// A file picked by the user, held entirely in memory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    bytes: Bytes,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, rejecting anything above the upload limit
    /// before the contents are loaded.
    pub async fn open(path: &Path) -> Result<Self> {
        let file_size = tokio::fs::metadata(path).await?.len();
        if file_size > MAX_FILE_SIZE {
            return Err(SessionError::FileTooLarge(file_size, MAX_FILE_SIZE));
        }

        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Opaque handle to image bytes held by a [`PreviewStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewRef(u64);

impl fmt::Display for PreviewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview:{}", self.0)
    }
}

#[derive(Default)]
struct PreviewSlots {
    next_id: u64,
    live: HashMap<u64, Bytes>,
}

/// Registry of locally held preview data.
///
/// Handles stay resolvable until revoked; the session revokes them when a
/// selection is superseded, and everything is released when the store is
/// dropped.
#[derive(Clone, Default)]
pub struct PreviewStore {
    slots: Arc<Mutex<PreviewSlots>>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, bytes: Bytes) -> PreviewRef {
        let mut slots = self.slots.lock();
        slots.next_id += 1;
        let id = slots.next_id;
        slots.live.insert(id, bytes);
        PreviewRef(id)
    }

    pub fn resolve(&self, preview: PreviewRef) -> Option<Bytes> {
        self.slots.lock().live.get(&preview.0).cloned()
    }

    /// Returns `false` if the handle was already revoked.
    pub fn revoke(&self, preview: PreviewRef) -> bool {
        self.slots.lock().live.remove(&preview.0).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.slots.lock().live.len()
    }
}

impl fmt::Debug for PreviewStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewStore")
            .field("live", &self.live_count())
            .finish()
    }
}

/// Locally derived metadata of the selected image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub name: String,
    pub size_kib: f64,
    pub width: u32,
    pub height: u32,
    pub preview: PreviewRef,
}

impl ImageAsset {
    pub fn new(file: &SourceFile, (width, height): (u32, u32), preview: PreviewRef) -> Self {
        Self {
            name: file.name().to_string(),
            size_kib: size_kib(file.len()),
            width,
            height,
            preview,
        }
    }
}

/// Wire shape of a successful compression service reply.
///
/// Anything beyond these four fields is dropped during deserialisation.
/// Pixel counts may arrive as integral floats (`1000.0`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompressionResponse {
    pub size: f64,
    #[serde(deserialize_with = "pixel_count")]
    pub width: u32,
    #[serde(deserialize_with = "pixel_count")]
    pub height: u32,
    pub url: String,
}

fn pixel_count<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct PixelCount;

    impl<'de> Visitor<'de> for PixelCount {
        type Value = u32;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative whole number of pixels")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<u32, E> {
            u32::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<u32, E> {
            u32::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<u32, E> {
            if v.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&v) {
                Ok(v as u32)
            } else {
                Err(E::invalid_value(de::Unexpected::Float(v), &self))
            }
        }
    }

    deserializer.deserialize_any(PixelCount)
}

/// Metadata of the compressed image as reported by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedAsset {
    pub size_kib: f64,
    pub width: u32,
    pub height: u32,
    pub download_url: String,
}

impl CompressedAsset {
    /// The compressed image is previewed straight from its download link.
    pub fn preview_url(&self) -> &str {
        &self.download_url
    }
}

impl From<CompressionResponse> for CompressedAsset {
    fn from(response: CompressionResponse) -> Self {
        Self {
            size_kib: response.size,
            width: response.width,
            height: response.height,
            download_url: response.url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_size_kib_literal_cases() {
        assert_eq!(format!("{:.2}", size_kib(102_400)), "100.00");
        assert_eq!(format!("{:.2}", size_kib(51_200)), "50.00");
        assert_eq!(format!("{:.2}", size_kib(1)), "0.00");
        assert_eq!(size_kib(204_800), 200.0);
        assert_eq!(size_kib(1536), 1.5);
    }

    #[test]
    fn test_preview_store_register_resolve_revoke() {
        let store = PreviewStore::new();
        let first = store.register(Bytes::from_static(b"one"));
        let second = store.register(Bytes::from_static(b"two"));

        assert_ne!(first, second);
        assert_eq!(store.live_count(), 2);
        assert_eq!(store.resolve(first), Some(Bytes::from_static(b"one")));

        assert!(store.revoke(first));
        assert!(!store.revoke(first));
        assert_eq!(store.resolve(first), None);
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_preview_ref_display() {
        let store = PreviewStore::new();
        let preview = store.register(Bytes::new());
        assert_eq!(preview.to_string(), "preview:1");
    }

    #[test]
    fn test_response_ignores_extra_fields() {
        let body = r#"{"size": 40.5, "width": 1000, "height": 500, "url": "/files/out.jpg", "format": "jpeg"}"#;
        let response: CompressionResponse = serde_json::from_str(body).unwrap();
        let compressed = CompressedAsset::from(response);

        assert_eq!(compressed.size_kib, 40.5);
        assert_eq!(compressed.width, 1000);
        assert_eq!(compressed.height, 500);
        assert_eq!(compressed.download_url, "/files/out.jpg");
        assert_eq!(compressed.preview_url(), "/files/out.jpg");
    }

    #[test]
    fn test_response_rejects_wrong_shape() {
        assert!(serde_json::from_str::<CompressionResponse>(r#"{"size": 1.0}"#).is_err());
        assert!(serde_json::from_str::<CompressionResponse>(
            r#"{"size": "big", "width": 1, "height": 1, "url": "/x"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<CompressionResponse>(
            r#"{"size": 1.0, "width": -4, "height": 1, "url": "/x"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<CompressionResponse>(
            r#"{"size": 1.0, "width": 12.5, "height": 1, "url": "/x"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<CompressionResponse>(
            r#"{"size": 1.0, "width": 1, "height": "1", "url": "/x"}"#
        )
        .is_err());
    }

    #[test]
    fn test_response_accepts_integral_float_dimensions() {
        let body = r#"{"size": 40.5, "width": 1000.0, "height": 500.0, "url": "/files/out.jpg"}"#;
        let response: CompressionResponse = serde_json::from_str(body).unwrap();

        assert_eq!((response.width, response.height), (1000, 500));
    }

    #[tokio::test]
    async fn test_source_file_open() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"fake image data").unwrap();

        let source = SourceFile::open(file.path()).await.unwrap();
        assert_eq!(source.len(), 15);
        assert_eq!(
            source.name(),
            file.path().file_name().unwrap().to_string_lossy()
        );
    }

    #[tokio::test]
    async fn test_source_file_open_missing() {
        let result = SourceFile::open(Path::new("nonexistent.jpg")).await;
        assert!(matches!(result, Err(SessionError::Io(_))));
    }
}
