use crate::asset::SourceFile;
use crate::error::{Result, SessionError};
use image::ImageReader;
use std::io::Cursor;

/// Reads the intrinsic pixel dimensions of an in-memory image.
///
/// Only the header is parsed; pixel data is never decoded. The format is
/// sniffed from the content, so the file name plays no part.
pub fn read_dimensions(file: &SourceFile) -> Result<(u32, u32)> {
    let decode_error = |reason: String| SessionError::Decode {
        name: file.name().to_string(),
        reason,
    };

    let reader = ImageReader::new(Cursor::new(file.bytes().as_ref()))
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?;

    if reader.format().is_none() {
        return Err(decode_error("unrecognised image format".to_string()));
    }

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| decode_error(e.to_string()))?;

    if width == 0 || height == 0 {
        return Err(decode_error(format!("empty image {}x{}", width, height)));
    }

    Ok((width, height))
}

/// Runs [`read_dimensions`] on the blocking pool.
pub async fn probe_dimensions(file: SourceFile) -> Result<(u32, u32)> {
    let name = file.name().to_string();
    tokio::task::spawn_blocking(move || read_dimensions(&file))
        .await
        .map_err(|e| SessionError::Decode {
            name,
            reason: format!("decode task failed: {}", e),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut Cursor::new(&mut buf), format)
            .unwrap();
        buf
    }

    #[test]
    fn test_read_dimensions_png() {
        let file = SourceFile::new("photo.png", encode(64, 32, ImageFormat::Png));
        assert_eq!(read_dimensions(&file).unwrap(), (64, 32));
    }

    #[test]
    fn test_read_dimensions_ignores_extension() {
        let file = SourceFile::new("photo.jpg", encode(10, 20, ImageFormat::Png));
        assert_eq!(read_dimensions(&file).unwrap(), (10, 20));
    }

    #[test]
    fn test_read_dimensions_jpeg() {
        let file = SourceFile::new("photo.jpg", encode(48, 16, ImageFormat::Jpeg));
        assert_eq!(read_dimensions(&file).unwrap(), (48, 16));
    }

    #[test]
    fn test_read_dimensions_rejects_garbage() {
        let file = SourceFile::new("test.jpg", b"fake image data".to_vec());
        let err = read_dimensions(&file).unwrap_err();
        assert!(matches!(err, SessionError::Decode { ref name, .. } if name == "test.jpg"));
    }

    #[test]
    fn test_read_dimensions_rejects_truncated_png() {
        let mut bytes = encode(8, 8, ImageFormat::Png);
        bytes.truncate(12);
        let file = SourceFile::new("cut.png", bytes);
        assert!(read_dimensions(&file).is_err());
    }

    #[tokio::test]
    async fn test_probe_dimensions_async() {
        let file = SourceFile::new("photo.png", encode(3, 5, ImageFormat::Png));
        assert_eq!(probe_dimensions(file).await.unwrap(), (3, 5));
    }
}
