// © 2019 3D Robotics. License: Apache-2.0
//! Reads a JSON manifest describing entries and streams the resulting
//! ZIP64 archive to a file or stdout.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;
use futures::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use zipflow::config::{init_logging, EncoderOptions};
use zipflow::encoder::build_stream;
use zipflow::error::Report;
use zipflow::events::OnError;
use zipflow::manifest::{Attributes, DeflateOptions, Entry, Manifest, Method};
use zipflow::source::SourceDescriptor;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a JSON manifest describing the archive's entries.
    #[arg(long, value_name = "FILE")]
    manifest: PathBuf,

    /// Destination for the archive: a file path, or `-` for stdout.
    #[arg(long, value_name = "FILE|-", default_value = "-")]
    output: String,

    /// Whether a failing entry halts the whole archive or is skipped.
    #[arg(long, value_enum, default_value = "halt")]
    on_error: OnErrorArg,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OnErrorArg {
    Halt,
    Skip,
}

#[derive(Deserialize)]
struct ManifestFile {
    entries: Vec<ManifestEntry>,
}

#[derive(Deserialize)]
struct ManifestEntry {
    path: String,
    source: ManifestSource,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    attributes: ManifestAttributes,
    #[serde(default)]
    method: ManifestMethod,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ManifestSource {
    File { path: PathBuf },
    Url { url: String },
    Random { bytes: u64 },
}

#[derive(Deserialize, Default)]
struct ManifestAttributes {
    #[serde(default = "default_mode")]
    mode: u16,
    uid: Option<u32>,
    gid: Option<u32>,
    #[serde(default)]
    setuid: bool,
    #[serde(default)]
    setgid: bool,
    #[serde(default)]
    sticky: bool,
}

fn default_mode() -> u16 {
    0o644
}

#[derive(Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum ManifestMethod {
    #[default]
    Store,
    Deflate,
}

fn convert_entry(raw: ManifestEntry) -> Result<Entry, Box<dyn std::error::Error>> {
    let source = match raw.source {
        ManifestSource::File { path } => SourceDescriptor::File(path),
        ManifestSource::Url { url } => {
            SourceDescriptor::Url(url.parse()?, zipflow::source::UrlOptions::default())
        }
        ManifestSource::Random { bytes } => SourceDescriptor::Random(bytes),
    };

    let attrs = Attributes {
        mode: raw.attributes.mode,
        uid: raw.attributes.uid,
        gid: raw.attributes.gid,
        setuid: raw.attributes.setuid,
        setgid: raw.attributes.setgid,
        sticky: raw.attributes.sticky,
    };

    let method = match raw.method {
        ManifestMethod::Store => Method::Store,
        ManifestMethod::Deflate => Method::Deflate(DeflateOptions::default()),
    };

    Ok(Entry::new(source, raw.path).with_timestamp(raw.timestamp).with_attributes(attrs).with_method(method))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args = Args::parse();

    let manifest_json = tokio::fs::read(&args.manifest).await?;
    let parsed: ManifestFile = serde_json::from_slice(&manifest_json)?;

    let mut manifest = Manifest::create();
    for raw_entry in parsed.entries {
        manifest = manifest.append(convert_entry(raw_entry)?);
    }

    if let Some(err) = manifest.validation_error() {
        return Err(format!("invalid manifest: {}", err).into());
    }

    let on_error = args.on_error;
    let options = EncoderOptions {
        on_error: Some(std::sync::Arc::new(move |_: &zipflow::error::EncodeError| match on_error {
            OnErrorArg::Halt => OnError::Halt,
            OnErrorArg::Skip => OnError::Skip,
        })),
        on_event: None,
    };

    let stream = build_stream(manifest, options);
    tokio::pin!(stream);

    let mut written: u64 = 0;
    if args.output == "-" {
        let mut stdout = tokio::io::stdout();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Report(e).to_string())?;
            stdout.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
    } else {
        let mut file = tokio::fs::File::create(&args.output).await?;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Report(e).to_string())?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            log::info!("wrote {} bytes", written);
        }
    }

    log::info!("done: {} bytes written", written);
    Ok(())
}
