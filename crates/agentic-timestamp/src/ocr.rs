//! Optical recognition as an injectable capability.
//!
//! The resolver only ever sees the [`OcrCapability`] trait, so tests can pass
//! a stub and hosts without a recognition engine can pass [`NoopOcr`] or no
//! capability at all. Every failure surfaces as an [`OcrError`], which the
//! resolver turns into a failed tier.

use std::io::Cursor;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use image::{GenericImageView, ImageFormat};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::types::{Rect, TimestampError, TimestampResult};

/// Default recognition language hint (Tesseract's code for English).
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Errors raised by an OCR capability.
#[derive(thiserror::Error, Debug)]
pub enum OcrError {
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to load image: {0}")]
    Load(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("Recognition timed out after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single "recognize(image) -> text" operation.
#[async_trait]
pub trait OcrCapability: Send + Sync {
    /// Recognize plain text in encoded image bytes (PNG, JPEG, ...).
    async fn recognize(&self, image: &[u8], language: &str) -> Result<String, OcrError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "ocr"
    }
}

/// An image supplied by the host for the OCR tier, optionally narrowed to
/// the region where the timestamp is rendered.
#[derive(Debug, Clone)]
pub struct OcrImage {
    pub bytes: Vec<u8>,
    pub region: Option<Rect>,
}

impl OcrImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            region: None,
        }
    }

    pub fn with_region(mut self, region: Rect) -> Self {
        self.region = Some(region);
        self
    }

    /// Load image bytes from a file.
    pub fn from_file(path: &str) -> TimestampResult<Self> {
        Ok(Self::new(std::fs::read(path)?))
    }

    /// Load image bytes from base64-encoded data.
    pub fn from_base64(data: &str) -> TimestampResult<Self> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| TimestampError::InvalidInput(format!("Invalid base64: {e}")))?;
        Ok(Self::new(bytes))
    }

    /// Bytes to hand to the recognizer: the original image, or the region
    /// cropped out and re-encoded as PNG.
    pub fn prepare(&self) -> Result<Vec<u8>, OcrError> {
        let Some(region) = self.region else {
            return Ok(self.bytes.clone());
        };

        let img = image::load_from_memory(&self.bytes).map_err(|e| OcrError::Load(e.to_string()))?;
        let (w, h) = img.dimensions();
        if region.w == 0 || region.h == 0 || region.x >= w || region.y >= h {
            return Err(OcrError::Load(format!(
                "region {}x{}+{}+{} is outside the {w}x{h} image",
                region.w, region.h, region.x, region.y
            )));
        }
        let cw = region.w.min(w - region.x);
        let ch = region.h.min(h - region.y);
        let cropped = img.crop_imm(region.x, region.y, cw, ch);

        let mut buf = Vec::new();
        cropped
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| OcrError::Load(e.to_string()))?;
        Ok(buf)
    }
}

/// Collapse recognizer output to a single line of single-spaced words.
pub fn clean_recognized_text(text: &str) -> String {
    crate::relative::collapse_whitespace(text)
}

/// Run one recognition under a time budget. An elapsed budget surfaces as
/// [`OcrError::Timeout`], like any other capability failure.
pub async fn recognize_with_timeout(
    ocr: &dyn OcrCapability,
    image: &[u8],
    language: &str,
    timeout_ms: u64,
) -> Result<String, OcrError> {
    let budget = Duration::from_millis(timeout_ms);
    match tokio::time::timeout(budget, ocr.recognize(image, language)).await {
        Ok(result) => result,
        Err(_) => Err(OcrError::Timeout(timeout_ms)),
    }
}

/// Capability that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOcr;

#[async_trait]
impl OcrCapability for NoopOcr {
    async fn recognize(&self, _image: &[u8], _language: &str) -> Result<String, OcrError> {
        Err(OcrError::Unavailable("no OCR engine configured".to_string()))
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// Find the Tesseract binary path.
pub fn find_tesseract() -> Option<PathBuf> {
    // 1. AGENTIC_TIMESTAMP_TESSERACT_PATH env
    if let Ok(p) = std::env::var("AGENTIC_TIMESTAMP_TESSERACT_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    which::which("tesseract").ok()
}

/// Tesseract command-line recognizer (`tesseract stdin stdout -l <lang>`).
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: Option<PathBuf>,
}

impl TesseractOcr {
    /// Locate Tesseract on this machine. A missing binary is not an error
    /// here; `recognize` reports it as [`OcrError::Unavailable`].
    pub fn detect() -> Self {
        let binary = find_tesseract();
        match &binary {
            Some(path) => tracing::debug!("using tesseract at {}", path.display()),
            None => tracing::debug!("tesseract not found; OCR tier disabled"),
        }
        Self { binary }
    }

    pub fn with_binary(path: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(path.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.binary.is_some()
    }
}

#[async_trait]
impl OcrCapability for TesseractOcr {
    async fn recognize(&self, image: &[u8], language: &str) -> Result<String, OcrError> {
        let binary = self
            .binary
            .as_ref()
            .ok_or_else(|| OcrError::Unavailable("tesseract not found on PATH".to_string()))?;

        let mut child = Command::new(binary)
            .args(["stdin", "stdout", "-l", language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OcrError::Unavailable(format!("failed to start tesseract: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(image).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}
