//! Best-effort pixel-size lookup for uploaded images

use futures::StreamExt;
use image::ImageReader;
use std::io::Cursor;
use thiserror::Error;
use uplift_core::Dimensions;

#[derive(Debug, Error)]
pub enum DimensionError {
    #[error("Image fetch failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Image fetch returned status {0}")]
    Status(u16),

    #[error("Image too large: {size} bytes exceeds {max} bytes")]
    TooLarge { size: u64, max: u64 },

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches an uploaded image and reads its width and height.
#[derive(Debug, Clone)]
pub struct DimensionResolver {
    http: reqwest::Client,
    max_bytes: u64,
}

impl DimensionResolver {
    pub fn new(http: reqwest::Client, max_bytes: u64) -> Self {
        Self { http, max_bytes }
    }

    pub async fn resolve(&self, url: &str) -> Result<Dimensions, DimensionError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DimensionError::Status(status.as_u16()));
        }

        if let Some(size) = response.content_length() {
            if size > self.max_bytes {
                return Err(DimensionError::TooLarge {
                    size,
                    max: self.max_bytes,
                });
            }
        }

        // Content-Length may be absent or wrong, so count while reading
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let size = (body.len() + chunk.len()) as u64;
            if size > self.max_bytes {
                return Err(DimensionError::TooLarge {
                    size,
                    max: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        measure(&body)
    }
}

/// Read dimensions from the image header without decoding pixel data.
pub fn measure(data: &[u8]) -> Result<Dimensions, DimensionError> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    let (width, height) = reader.into_dimensions()?;
    Ok(Dimensions::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Write;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        RgbaImage::new(width, height)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_measure_png() {
        let dimensions = measure(&png(7, 3)).unwrap();
        assert_eq!(dimensions, Dimensions::new(7, 3));
    }

    #[test]
    fn test_measure_rejects_non_image() {
        assert!(measure(b"definitely not an image").is_err());
    }

    #[tokio::test]
    async fn test_resolve_over_http() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/photo.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(png(16, 9))
            .create_async()
            .await;

        let resolver = DimensionResolver::new(reqwest::Client::new(), 1024 * 1024);
        let dimensions = resolver
            .resolve(&format!("{}/photo.png", server.url()))
            .await
            .unwrap();

        assert_eq!(dimensions, Dimensions::new(16, 9));
    }

    #[tokio::test]
    async fn test_resolve_reports_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let resolver = DimensionResolver::new(reqwest::Client::new(), 1024);
        let err = resolver
            .resolve(&format!("{}/missing.png", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, DimensionError::Status(404)));
    }

    #[tokio::test]
    async fn test_resolve_enforces_size_cap() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/big.png")
            .with_status(200)
            .with_body(png(64, 64))
            .create_async()
            .await;

        let resolver = DimensionResolver::new(reqwest::Client::new(), 16);
        let err = resolver
            .resolve(&format!("{}/big.png", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, DimensionError::TooLarge { max: 16, .. }));
    }

    #[tokio::test]
    async fn test_resolve_caps_chunked_body_without_length() {
        let mut server = mockito::Server::new_async().await;
        let body = png(64, 64);
        server
            .mock("GET", "/stream.png")
            .with_status(200)
            .with_chunked_body(move |w| {
                for part in body.chunks(8) {
                    w.write_all(part)?;
                }
                Ok(())
            })
            .create_async()
            .await;

        let resolver = DimensionResolver::new(reqwest::Client::new(), 16);
        let err = resolver
            .resolve(&format!("{}/stream.png", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, DimensionError::TooLarge { max: 16, .. }));
    }

    #[tokio::test]
    async fn test_resolve_chunked_body_within_cap() {
        let mut server = mockito::Server::new_async().await;
        let body = png(5, 4);
        server
            .mock("GET", "/small.png")
            .with_status(200)
            .with_chunked_body(move |w| w.write_all(&body))
            .create_async()
            .await;

        let resolver = DimensionResolver::new(reqwest::Client::new(), 1024 * 1024);
        let dimensions = resolver
            .resolve(&format!("{}/small.png", server.url()))
            .await
            .unwrap();

        assert_eq!(dimensions, Dimensions::new(5, 4));
    }
}
