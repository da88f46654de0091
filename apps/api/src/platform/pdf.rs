use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tracing::{debug, info};

use super::PlatformError;

/// Render resolution. 288 dpi is a 4x scale of a 72 dpi PDF page.
const RENDER_DPI: &str = "288";

#[derive(Debug, Clone)]
pub struct RasterizedImage {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Converts the first page of a PDF into a PNG.
#[async_trait]
pub trait PdfRasterizer: Send + Sync {
    async fn first_page_png(
        &self,
        pdf_name: &str,
        pdf: Bytes,
    ) -> Result<RasterizedImage, PlatformError>;
}

/// `resume.PDF` -> `resume.png`
pub fn image_file_name(pdf_name: &str) -> String {
    let stem = match pdf_name.len().checked_sub(4) {
        Some(cut)
            if pdf_name.is_char_boundary(cut) && pdf_name[cut..].eq_ignore_ascii_case(".pdf") =>
        {
            &pdf_name[..cut]
        }
        _ => pdf_name,
    };
    format!("{stem}.png")
}

/// Shells out to poppler's `pdftoppm`.
pub struct PdftoppmRasterizer {
    binary: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }
}

#[async_trait]
impl PdfRasterizer for PdftoppmRasterizer {
    async fn first_page_png(
        &self,
        pdf_name: &str,
        pdf: Bytes,
    ) -> Result<RasterizedImage, PlatformError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("input.pdf");
        let output_prefix = workdir.path().join("page");
        tokio::fs::write(&input, &pdf).await?;

        debug!("Rasterizing {pdf_name} ({} bytes)", pdf.len());
        let output = Command::new(&self.binary)
            .args(["-png", "-r", RENDER_DPI, "-f", "1", "-l", "1", "-singlefile"])
            .arg(&input)
            .arg(&output_prefix)
            .output()
            .await
            .map_err(|e| {
                PlatformError::Conversion(format!("failed to run {}: {e}", self.binary.display()))
            })?;

        if !output.status.success() {
            return Err(PlatformError::Conversion(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let png = tokio::fs::read(output_prefix.with_extension("png")).await?;
        info!("Rendered first page of {pdf_name} to {} byte PNG", png.len());

        Ok(RasterizedImage {
            file_name: image_file_name(pdf_name),
            bytes: Bytes::from(png),
        })
    }
}
