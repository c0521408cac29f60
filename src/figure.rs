use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};

/// Where a rendered plot goes. Selected once per call; exactly one of these
/// side effects happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderTarget {
    /// Keep the figure in memory and hand it back to the caller.
    #[default]
    Inline,
    /// Write the figure to `path`.
    SavedFile { path: PathBuf },
    /// Write an HTML page to `path` and optionally open it in the browser.
    /// No figure is returned.
    ExternalViewer {
        #[serde(default = "default_viewer_path")]
        path: PathBuf,
        #[serde(default = "default_launch")]
        launch: bool,
    },
}

fn default_viewer_path() -> PathBuf {
    PathBuf::from("3d_plot.html")
}

fn default_launch() -> bool {
    true
}

impl RenderTarget {
    pub fn saved_file(path: impl Into<PathBuf>) -> Self {
        RenderTarget::SavedFile { path: path.into() }
    }

    pub fn external_viewer(path: impl Into<PathBuf>, launch: bool) -> Self {
        RenderTarget::ExternalViewer {
            path: path.into(),
            launch,
        }
    }
}

/// Pixel size of a figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureSize {
    pub width: u32,
    pub height: u32,
}

impl FigureSize {
    pub fn new(width: u32, height: u32) -> Self {
        FigureSize { width, height }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PlotError::config(format!(
                "figure dimensions must be positive (width={}, height={})",
                self.width, self.height
            )));
        }
        Ok(())
    }

    pub(crate) fn as_tuple(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn buffer(&self) -> Vec<u8> {
        vec![0; self.width as usize * self.height as usize * 3]
    }
}

/// A rendered RGB bitmap.
#[derive(Debug, Clone)]
pub struct Figure {
    pub width: u32,
    pub height: u32,
    pixels: Vec<u8>,
}

impl Figure {
    pub(crate) fn from_buffer(size: FigureSize, pixels: Vec<u8>) -> Self {
        Figure {
            width: size.width,
            height: size.height,
            pixels,
        }
    }

    pub fn to_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels.clone()).ok_or_else(|| {
            PlotError::render(format!(
                "pixel buffer of {} bytes does not match {}x{}",
                self.pixels.len(),
                self.width,
                self.height
            ))
        })
    }

    /// Encode as PNG, creating parent directories as needed.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        self.to_image()?
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|source| PlotError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
