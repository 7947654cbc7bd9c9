use crate::Command;
use crate::progress::with_progress;
use anyhow::{Context, Result};
use assist_image::{
    Compositor, RunOutput, SaveImageOptions, save_base64_image, save_image_bytes,
};
use assist_openai::{ImageGeneration, ImageSource, TextCompletion};
use assist_panels::{PanelRecord, parse_panels};
use assist_prompt::panel_image;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PANEL_MIME_TYPE: &str = "image/png";

/// The external services a run talks to.
pub struct Assistant<'a, T, I, C> {
    pub text: &'a T,
    pub images: &'a I,
    pub compositor: &'a C,
    pub output_root: PathBuf,
}

#[derive(Debug)]
pub struct Outcome {
    /// Raw reply from the text model.
    pub output: String,
    pub comic: Option<ComicReport>,
}

/// What a comic run produced, including every recoverable problem.
#[derive(Debug)]
pub struct ComicReport {
    pub run_dir: PathBuf,
    pub script_path: PathBuf,
    /// Saved `panel<N>.png` files in panel order.
    pub panels: Vec<PathBuf>,
    pub captioned: Vec<PathBuf>,
    /// Images handed to the compositor, left to right.
    pub strip_inputs: Vec<PathBuf>,
    pub strip: Option<PathBuf>,
    pub manual_command: Option<String>,
    pub warnings: Vec<String>,
}

impl ComicReport {
    fn new(run_dir: &Path, script_path: PathBuf) -> Self {
        Self {
            run_dir: run_dir.to_path_buf(),
            script_path,
            panels: Vec::new(),
            captioned: Vec::new(),
            strip_inputs: Vec::new(),
            strip: None,
            manual_command: None,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

impl<T, I, C> Assistant<'_, T, I, C>
where
    T: TextCompletion,
    I: ImageGeneration,
    C: Compositor,
{
    pub fn run(&self, command: &Command) -> Result<Outcome> {
        let file = command.file();
        let content = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;

        let template = command.template();
        let prompt = template.render(&content);
        debug!(
            template = template.name(),
            prompt_len = prompt.len(),
            "Sending prompt"
        );

        let output = with_progress("Waiting for the model", || self.text.complete(&prompt))
            .context("text completion request failed")?;

        let comic = match command {
            Command::Comic { overlay, .. } => Some(self.comic(&output, *overlay)?),
            _ => None,
        };

        Ok(Outcome { output, comic })
    }

    fn comic(&self, script: &str, overlay: bool) -> Result<ComicReport> {
        let run = RunOutput::create(&self.output_root, Utc::now())
            .context("failed to create the run directory")?;
        let script_path = run
            .write_script(script)
            .context("failed to save the comic script")?;
        debug!("Comic script saved to {}", script_path.display());

        let mut report = ComicReport::new(run.dir(), script_path);

        for item in parse_panels(script) {
            match item {
                Ok(panel) => self.render_panel(&run, &panel, overlay, &mut report),
                Err(missing) => report.warn(format!(
                    "Skipping `{}` (line {}): no scene description found.",
                    missing.header, missing.line
                )),
            }
        }

        self.assemble_strip(&run, &mut report);
        Ok(report)
    }

    fn render_panel(
        &self,
        run: &RunOutput,
        panel: &PanelRecord,
        overlay: bool,
        report: &mut ComicReport,
    ) {
        let index = panel.index;
        let prompt = panel_image(&panel.scene);
        debug!(panel = index, %prompt, "Requesting panel image");

        let label = format!("Generating panel {index}");
        let source = match with_progress(&label, || self.images.generate_image(&prompt)) {
            Ok(Some(source)) => source,
            Ok(None) => {
                report.warn(format!(
                    "Panel {index}: no image URL returned; leaving it out of the strip."
                ));
                return;
            }
            Err(error) => {
                report.warn(format!(
                    "Panel {index}: image generation failed ({error}); leaving it out of the strip."
                ));
                return;
            }
        };

        let panel_path = match self.save_panel(run, index, source) {
            Ok(path) => path,
            Err(error) => {
                report.warn(format!(
                    "Panel {index}: failed to save image ({error:#}); leaving it out of the strip."
                ));
                return;
            }
        };
        info!("Saved panel {index} to {}", panel_path.display());
        report.panels.push(panel_path.clone());

        let strip_input = match (overlay, panel.dialogue.as_deref()) {
            (true, Some(dialogue)) => {
                let captioned = run.captioned_path(index);
                match self.compositor.caption(&panel_path, dialogue, &captioned) {
                    Ok(()) => {
                        info!("Captioned panel {index} at {}", captioned.display());
                        report.captioned.push(captioned.clone());
                        captioned
                    }
                    Err(error) => {
                        report.warn(format!(
                            "Panel {index}: failed to add caption ({error}); using the plain image."
                        ));
                        panel_path
                    }
                }
            }
            (true, None) => {
                debug!(panel = index, "No dialogue found; skipping caption");
                panel_path
            }
            (false, _) => panel_path,
        };

        report.strip_inputs.push(strip_input);
    }

    fn save_panel(&self, run: &RunOutput, index: usize, source: ImageSource) -> Result<PathBuf> {
        let file_stem = RunOutput::panel_stem(index);
        let options = SaveImageOptions {
            file_stem: &file_stem,
            mime_type: Some(PANEL_MIME_TYPE),
            output_dir: run.dir(),
        };

        let path = match source {
            ImageSource::Url(url) => {
                let bytes = self
                    .images
                    .fetch_image(&url)
                    .with_context(|| format!("download from {url} failed"))?;
                save_image_bytes(&bytes, options)?
            }
            ImageSource::Base64(encoded) => save_base64_image(&encoded, options)?,
        };

        Ok(path)
    }

    fn assemble_strip(&self, run: &RunOutput, report: &mut ComicReport) {
        if report.strip_inputs.is_empty() {
            report.warn("No panels were generated; skipping the final comic strip.".to_string());
            return;
        }

        let strip = run.strip_path();
        match self
            .compositor
            .append_horizontal(&report.strip_inputs, &strip)
        {
            Ok(()) => {
                info!("Comic strip assembled at {}", strip.display());
                report.strip = Some(strip);
            }
            Err(error) => {
                let command = self
                    .compositor
                    .append_command(&report.strip_inputs, &strip);
                report.warn(format!(
                    "Failed to assemble the comic strip ({error}). Run it manually:\n  {command}"
                ));
                report.manual_command = Some(command);
            }
        }
    }
}
