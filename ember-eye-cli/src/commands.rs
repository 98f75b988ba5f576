use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use ember_eye_core::{
    Artifact, CaptureMode, DetectionResult, HttpDetectionClient, SessionConfiguration, SubmissionPipeline,
};

use crate::cli_state::{DetectionReport, DeviceInfo, Session};

/// Options shared by the capture commands.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CaptureOptions {
    /// Camera to capture from (defaults to the first one listed)
    #[arg(long)]
    pub device: Option<String>,

    /// Capture only; do not submit for detection
    #[arg(long)]
    pub no_submit: bool,

    /// Write the captured artifact to this path
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Download the annotated result image to this path
    #[arg(long)]
    pub save: Option<PathBuf>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn list_devices(session: &Session, json: bool) -> Result<()> {
    let active = session.active_device();
    let devices = DeviceInfo::list(&session.devices(), active.as_ref().map(|d| d.id.as_str()));

    if json {
        return print_json(&devices);
    }
    if devices.is_empty() {
        println!("no cameras found under {}", session.platform().root().display());
    }
    for device in devices {
        let marker = if device.is_default { "*" } else { " " };
        println!("{} {}\t{}", marker, device.id, device.label);
    }
    Ok(())
}

fn select(session: &Session, options: &CaptureOptions) -> Result<()> {
    if let Some(device) = &options.device {
        session.select_device(device)?;
    }
    Ok(())
}

pub async fn photo(session: &Session, options: &CaptureOptions, json: bool) -> Result<()> {
    select(session, options)?;
    session.set_mode(CaptureMode::Photo);
    let artifact = session.capture_photo().await.context("photo capture failed")?;
    finish(session, artifact, options, json).await
}

pub async fn record(session: &Session, seconds: u64, options: &CaptureOptions, json: bool) -> Result<()> {
    if seconds == 0 {
        bail!("recording length must be at least one second");
    }
    select(session, options)?;
    session.set_mode(CaptureMode::Video);

    session.start_recording().await.context("unable to start recording")?;
    log::info!("recording for {}s", seconds);
    tokio::time::sleep(Duration::from_secs(seconds)).await;
    let artifact = session.stop_recording().await.context("recording failed")?;

    finish(session, artifact, options, json).await
}

async fn finish(session: &Session, artifact: Artifact, options: &CaptureOptions, json: bool) -> Result<()> {
    if let Some(path) = &options.output {
        write_file(path, artifact.bytes())?;
    }

    if options.no_submit {
        if json {
            return print_json(artifact.metadata());
        }
        let metadata = artifact.metadata();
        println!(
            "captured {} ({:?}, {} bytes, sha256 {})",
            metadata.id, metadata.mode, metadata.size_bytes, metadata.checksum
        );
        return Ok(());
    }

    let result = session.submit().await.context("detection failed")?;
    report(session.client(), &artifact, &result, options.save.as_deref(), json).await
}

/// Standalone upload of an existing file.
pub async fn detect(config: &SessionConfiguration, file: &Path, save: Option<&Path>, json: bool) -> Result<()> {
    let artifact = Artifact::from_file(file)?;
    let pipeline = SubmissionPipeline::new(HttpDetectionClient::new(config)?, config);

    let result = pipeline
        .submit(&artifact)
        .await
        .with_context(|| format!("detection failed for {}", file.display()))?;
    report(pipeline.client(), &artifact, &result, save, json).await
}

async fn report(
    client: &HttpDetectionClient,
    artifact: &Artifact,
    result: &DetectionResult,
    save: Option<&Path>,
    json: bool,
) -> Result<()> {
    let saved_to = match save {
        Some(path) => {
            let annotated = client
                .fetch_annotated(result)
                .await
                .context("unable to download the annotated image")?;
            write_file(path, &annotated)?;
            Some(path.display().to_string())
        }
        None => None,
    };

    let report = DetectionReport {
        artifact: artifact.metadata(),
        summary: result.summary(),
        detections: &result.detections,
        annotated_url: client.resolve_locator(&result.annotated_resource_locator),
        service_message: result.service_message.as_deref(),
        saved_to,
    };
    if json {
        print_json(&report)
    } else {
        println!("{}", report.render());
        Ok(())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("unable to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("unable to write {}", path.display()))?;
    log::info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
