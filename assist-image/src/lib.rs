use assist_utils::run_dir_name;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod compositor;

pub use compositor::{CompositeError, Compositor, ImageMagick};

pub const SCRIPT_FILE_NAME: &str = "comic_script.txt";
pub const STRIP_FILE_NAME: &str = "final_comic_strip.png";

#[derive(Debug, Error)]
pub enum ImageSaveError {
    #[error("image payload is empty")]
    EmptyPayload,
    #[error("failed to decode image bytes")]
    Decode(#[from] base64::DecodeError),
    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub struct SaveImageOptions<'a> {
    pub file_stem: &'a str,
    pub mime_type: Option<&'a str>,
    pub output_dir: &'a Path,
}

pub fn save_image_bytes(
    bytes: &[u8],
    options: SaveImageOptions<'_>,
) -> Result<PathBuf, ImageSaveError> {
    if bytes.is_empty() {
        return Err(ImageSaveError::EmptyPayload);
    }

    create_dir(options.output_dir)?;

    let extension = extension_from_mime(options.mime_type);
    let path = options
        .output_dir
        .join(format!("{}.{extension}", options.file_stem));

    fs::write(&path, bytes).map_err(|source| ImageSaveError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}

pub fn save_base64_image(
    encoded: &str,
    options: SaveImageOptions<'_>,
) -> Result<PathBuf, ImageSaveError> {
    if encoded.trim().is_empty() {
        return Err(ImageSaveError::EmptyPayload);
    }

    let bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(ImageSaveError::Decode)?;
    save_image_bytes(&bytes, options)
}

/// The per-invocation directory holding a comic's script and images.
#[derive(Debug, Clone)]
pub struct RunOutput {
    dir: PathBuf,
}

impl RunOutput {
    /// Creates `<root>/run-<timestamp>/`.
    ///
    /// Fails with an `AlreadyExists` I/O error when the directory is taken, so
    /// two runs never share one.
    pub fn create(root: &Path, timestamp: DateTime<Utc>) -> Result<Self, ImageSaveError> {
        create_dir(root)?;
        let dir = root.join(run_dir_name(timestamp));
        fs::create_dir(&dir).map_err(|source| ImageSaveError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_script(&self, script: &str) -> Result<PathBuf, ImageSaveError> {
        let path = self.dir.join(SCRIPT_FILE_NAME);
        fs::write(&path, script).map_err(|source| ImageSaveError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    pub fn panel_stem(index: usize) -> String {
        format!("panel{index}")
    }

    pub fn captioned_path(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("{}_captioned.png", Self::panel_stem(index)))
    }

    pub fn strip_path(&self) -> PathBuf {
        self.dir.join(STRIP_FILE_NAME)
    }
}

fn create_dir(dir: &Path) -> Result<(), ImageSaveError> {
    fs::create_dir_all(dir).map_err(|source| ImageSaveError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn extension_from_mime(mime_type: Option<&str>) -> &'static str {
    match mime_type
        .unwrap_or("image/png")
        .to_ascii_lowercase()
        .as_str()
    {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/png" => "png",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests;
