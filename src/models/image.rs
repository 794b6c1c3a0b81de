//! 上传图片

use std::fmt;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use tokio::fs;

use crate::error::ImageError;

/// 支持的图片格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// 根据文件头判断格式，不看扩展名
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
        const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

        if bytes.starts_with(PNG_MAGIC) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(JPEG_MAGIC) {
            Some(ImageFormat::Jpeg)
        } else {
            None
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Png => write!(f, "PNG"),
            ImageFormat::Jpeg => write!(f, "JPEG"),
        }
    }
}

/// 用户上传的题目图片，只在本次交互中存在
#[derive(Clone)]
pub struct UploadedImage {
    name: String,
    format: ImageFormat,
    bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let format = ImageFormat::sniff(&bytes).ok_or(ImageError::UnsupportedFormat)?;

        Ok(Self {
            name: name.into(),
            format,
            bytes,
        })
    }

    pub async fn from_path(path: &Path) -> Result<Self, ImageError> {
        let bytes = fs::read(path).await.map_err(|source| ImageError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_bytes(name, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 嵌入请求的 data URL
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), STANDARD.encode(&self.bytes))
    }
}

impl fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedImage")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}
