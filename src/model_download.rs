use std::{
    fs,
    io::{Read, Write},
    path::Path,
    time::Duration,
};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

use crate::config::ModelPaths;

pub const HANDPOSE_ESTIMATOR_MODEL_FILENAME: &str = "handpose_estimation_mediapipe_2023feb.onnx";
pub const PALM_DETECTOR_MODEL_FILENAME: &str = "palm_detection_mediapipe_2023feb.onnx";

const HANDPOSE_ESTIMATOR_MODEL_URL: &str = "https://github.com/opencv/opencv_zoo/raw/main/models/handpose_estimation_mediapipe/handpose_estimation_mediapipe_2023feb.onnx";
const PALM_DETECTOR_MODEL_URL: &str = "https://github.com/opencv/opencv_zoo/raw/main/models/palm_detection_mediapipe/palm_detection_mediapipe_2023feb.onnx";

const DOWNLOAD_CHUNK: usize = 16 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    HandposeEstimator,
    PalmDetector,
}

impl ModelKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::HandposeEstimator => "handpose estimator",
            ModelKind::PalmDetector => "palm detector",
        }
    }

    fn url(&self) -> &'static str {
        match self {
            ModelKind::HandposeEstimator => HANDPOSE_ESTIMATOR_MODEL_URL,
            ModelKind::PalmDetector => PALM_DETECTOR_MODEL_URL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelDownloadEvent {
    AlreadyPresent {
        model: ModelKind,
    },
    Started {
        model: ModelKind,
        total: Option<u64>,
    },
    Progress {
        model: ModelKind,
        downloaded: u64,
        total: Option<u64>,
    },
    Finished {
        model: ModelKind,
    },
}

/// Makes sure both detector models exist on disk, downloading whichever is missing.
pub fn ensure_models_ready(paths: &ModelPaths) -> anyhow::Result<()> {
    ensure_model_ready(ModelKind::PalmDetector, &paths.palm_detector, terminal_progress())?;
    ensure_model_ready(
        ModelKind::HandposeEstimator,
        &paths.handpose_estimator,
        terminal_progress(),
    )
}

pub fn ensure_model_ready<F>(model: ModelKind, model_path: &Path, mut on_event: F) -> anyhow::Result<()>
where
    F: FnMut(ModelDownloadEvent),
{
    if model_path.exists() {
        on_event(ModelDownloadEvent::AlreadyPresent { model });
        return Ok(());
    }

    if let Some(parent) = model_path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create {} model directory {}",
                model.label(),
                parent.display()
            )
        })?;
    }

    download_to_path(model, model.url(), model_path, &mut on_event)
        .with_context(|| format!("failed to download {} model to {}", model.label(), model_path.display()))
}

/// Event sink that renders download progress in the terminal.
fn terminal_progress() -> impl FnMut(ModelDownloadEvent) {
    let mut progress: Option<ProgressBar> = None;
    move |event| match event {
        ModelDownloadEvent::Started { total, .. } => {
            progress = Some(create_progress_bar(total));
        }
        ModelDownloadEvent::Progress { downloaded, .. } => {
            if let Some(pb) = progress.as_ref() {
                pb.set_position(downloaded);
            }
        }
        ModelDownloadEvent::Finished { model } => {
            if let Some(pb) = progress.take() {
                pb.finish_with_message(format!("{} model ready", model.label()));
            }
        }
        ModelDownloadEvent::AlreadyPresent { model } => {
            log::debug!("{} model already present", model.label());
        }
    }
}

fn download_to_path<F>(
    model: ModelKind,
    url: &str,
    dest: &Path,
    on_event: &mut F,
) -> anyhow::Result<()>
where
    F: FnMut(ModelDownloadEvent),
{
    log::info!(
        "downloading {} model from {url} to {}",
        model.label(),
        dest.display()
    );

    let client = Client::new();
    let response = client
        .get(url)
        .send()
        .context("failed to start model download")?
        .error_for_status()
        .context("model download returned error status")?;

    let total = response.content_length();
    on_event(ModelDownloadEvent::Started { model, total });

    let tmp_path = dest.with_extension("download");
    let file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    copy_with_progress(response, file, |downloaded| {
        on_event(ModelDownloadEvent::Progress {
            model,
            downloaded,
            total,
        })
    })?
    .sync_all()
    .context("failed to flush downloaded model to disk")?;

    fs::rename(&tmp_path, dest).with_context(|| {
        format!(
            "failed to move temp model {} into place at {}",
            tmp_path.display(),
            dest.display()
        )
    })?;

    on_event(ModelDownloadEvent::Finished { model });
    Ok(())
}

/// Streams `reader` into `writer`, reporting the running byte count after every chunk.
fn copy_with_progress<R, W, P>(mut reader: R, mut writer: W, mut on_progress: P) -> anyhow::Result<W>
where
    R: Read,
    W: Write,
    P: FnMut(u64),
{
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; DOWNLOAD_CHUNK];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .context("failed while reading model bytes")?;
        if bytes_read == 0 {
            break;
        }

        writer
            .write_all(&buffer[..bytes_read])
            .context("failed while writing model to disk")?;
        downloaded += bytes_read as u64;
        on_progress(downloaded);
    }
    Ok(writer)
}

fn create_progress_bar(total_size: Option<u64>) -> ProgressBar {
    match total_size {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
            pb.set_style(style);
            pb
        }
        _ => {
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::with_template("{spinner:.green} downloading model")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            pb.set_style(style);
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        }
    }
}
