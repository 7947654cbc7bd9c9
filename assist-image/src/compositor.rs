//! External image compositing.
//!
//! Captioning and strip assembly shell out to ImageMagick. The [`Compositor`]
//! trait keeps the pipeline independent of the tool so another backend can
//! be swapped in per platform.

use assist_utils::shell_command_line;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum CompositeError {
    #[error("compositor `{program}` could not be started: {source}")]
    NotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("compositor `{program}` failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("no images to compose")]
    NoInputs,
}

pub trait Compositor {
    /// Burns `text` onto the bottom of `input`, writing the result to `output`.
    fn caption(&self, input: &Path, text: &str, output: &Path) -> Result<(), CompositeError>;

    /// Joins `inputs` left to right into a single image.
    fn append_horizontal(&self, inputs: &[PathBuf], output: &Path) -> Result<(), CompositeError>;

    /// The command an operator can run by hand to redo [`Compositor::append_horizontal`].
    fn append_command(&self, inputs: &[PathBuf], output: &Path) -> String;
}

#[derive(Debug, Clone)]
pub struct ImageMagick {
    program: String,
    point_size: u32,
    band_height: u32,
}

impl ImageMagick {
    pub fn new(program: impl Into<String>, point_size: u32, band_height: u32) -> Self {
        Self {
            program: program.into(),
            point_size,
            band_height,
        }
    }

    fn caption_args(&self, input: &Path, text: &str, output: &Path) -> Vec<OsString> {
        let padding = self.band_height.saturating_sub(self.point_size) / 2;
        vec![
            input.into(),
            "-gravity".into(),
            "South".into(),
            "-background".into(),
            "white".into(),
            "-splice".into(),
            format!("0x{}", self.band_height).into(),
            "-pointsize".into(),
            self.point_size.to_string().into(),
            "-annotate".into(),
            format!("+0+{padding}").into(),
            escape_annotation(text).into(),
            output.into(),
        ]
    }

    fn append_args(inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = inputs.iter().map(|path| path.into()).collect();
        args.push("+append".into());
        args.push(output.into());
        args
    }

    fn run(&self, args: &[OsString]) -> Result<(), CompositeError> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| CompositeError::NotFound {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CompositeError::ExecutionFailed {
                program: self.program.clone(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

impl Compositor for ImageMagick {
    fn caption(&self, input: &Path, text: &str, output: &Path) -> Result<(), CompositeError> {
        self.run(&self.caption_args(input, text, output))
    }

    fn append_horizontal(&self, inputs: &[PathBuf], output: &Path) -> Result<(), CompositeError> {
        if inputs.is_empty() {
            return Err(CompositeError::NoInputs);
        }
        self.run(&Self::append_args(inputs, output))
    }

    fn append_command(&self, inputs: &[PathBuf], output: &Path) -> String {
        let args = Self::append_args(inputs, output);
        shell_command_line(
            &self.program,
            args.iter().map(|arg| arg.to_string_lossy().into_owned()),
        )
    }
}

/// ImageMagick reads text from a file when it starts with `@`.
fn escape_annotation(text: &str) -> String {
    match text.strip_prefix('@') {
        Some(rest) => format!("\\@{rest}"),
        None => text.to_string(),
    }
}
