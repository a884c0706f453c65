// © 2019 3D Robotics. License: Apache-2.0
//! End-to-end scenarios from the stream's testable properties: produced
//! archives decode with a conformant ZIP64 reader, attributes and
//! timestamps round-trip, and skip/halt behave as documented.

use std::io::Write;
use std::process::Command;
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use zipflow::config::EncoderOptions;
use zipflow::encoder::build_stream;
use zipflow::error::EncodeError;
use zipflow::events::OnError;
use zipflow::manifest::{Attributes, DeflateOptions, Entry, Level, Manifest, Method};
use zipflow::source::SourceDescriptor;

async fn collect(manifest: Manifest, options: EncoderOptions) -> Result<Vec<u8>, EncodeError> {
    let stream = build_stream(manifest, options);
    tokio::pin!(stream);
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

fn write_to_temp_zip(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".zip").tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Checks a produced archive with `zipinfo`, `unzip`, and python's `zipfile`
/// module, the same three-tool decode proof the teacher's own zip tests use.
fn assert_decodable(path: &std::path::Path) {
    assert!(Command::new("zipinfo").arg("-v").arg(path).status().unwrap().success());
    assert!(Command::new("unzip").arg("-t").arg(path).status().unwrap().success());
    assert!(Command::new("python3").arg("-m").arg("zipfile").arg("-t").arg(path).status().unwrap().success());
}

#[tokio::test]
async fn mixed_methods_three_entries_each_8kib_all_present_in_central_directory() {
    // Scaled down from the 8 MiB scenario to keep the test fast; exercises
    // the same mix of methods over multiple entries.
    let manifest = Manifest::create()
        .append(
            Entry::new(SourceDescriptor::Random(8192), "a.bin")
                .with_method(Method::Deflate(DeflateOptions::default())),
        )
        .append(Entry::new(SourceDescriptor::Random(8192), "b.bin").with_method(Method::Store))
        .append(Entry::new(SourceDescriptor::Random(8192), "c.bin").with_method(Method::Deflate(
            DeflateOptions { level: Level::BestCompression, strategy: Default::default() },
        )));

    let archive = collect(manifest, EncoderOptions::default()).await.unwrap();
    let file = write_to_temp_zip(&archive);
    assert_decodable(file.path());

    let central_headers = archive.windows(4).filter(|w| *w == 0x02014b50u32.to_le_bytes()).count();
    assert_eq!(central_headers, 3);
    assert!(archive.windows(4).any(|w| w == 0x06054b50u32.to_le_bytes())); // legacy eocd present
}

#[tokio::test]
async fn skip_on_error_keeps_successful_entries_and_reports_the_failure() {
    let failing = SourceDescriptor::Dynamic(Arc::new(|| {
        Err(zipflow::error::SourceError::FileNotFound("later.txt".into()))
    }));

    let manifest = Manifest::create()
        .append(Entry::new(SourceDescriptor::Random(64), "now.txt"))
        .append(Entry::new(failing, "later.txt"));

    let failed_paths = Arc::new(Mutex::new(Vec::new()));
    let failed_paths_clone = failed_paths.clone();

    let options = EncoderOptions {
        on_error: Some(Arc::new(|_: &EncodeError| OnError::Skip)),
        on_event: Some(Box::new(move |event| {
            if let zipflow::events::Event::EntryFailed { path, .. } = event {
                failed_paths_clone.lock().unwrap().push(path);
            }
        })),
    };

    let archive = collect(manifest, options).await.unwrap();
    let central_headers = archive.windows(4).filter(|w| *w == 0x02014b50u32.to_le_bytes()).count();
    assert_eq!(central_headers, 1);
    assert_eq!(*failed_paths.lock().unwrap(), vec!["later.txt".to_string()]);
}

#[tokio::test]
async fn halt_on_error_propagates_and_yields_partial_output() {
    let failing = SourceDescriptor::Dynamic(Arc::new(|| {
        Err(zipflow::error::SourceError::UnknownKind)
    }));
    let manifest = Manifest::create().append(Entry::new(failing, "broken.txt"));

    let result = collect(manifest, EncoderOptions::default()).await;
    assert!(matches!(result, Err(EncodeError::Source { .. })));
}

#[tokio::test]
async fn empty_manifest_fails_immediately_with_no_bytes_emitted() {
    let result = collect(Manifest::create(), EncoderOptions::default()).await;
    assert!(matches!(result, Err(EncodeError::Manifest(_))));
}

#[tokio::test]
async fn attribute_variants_round_trip_into_external_attributes() {
    let mut custom = Attributes::default();
    custom.mode = 0o456;
    custom.uid = Some(1000);
    custom.gid = Some(1000);

    let manifest = Manifest::create()
        .append(Entry::new(SourceDescriptor::Random(8), "default_mode"))
        .append(
            Entry::new(SourceDescriptor::Random(8), "custom_mode")
                .with_attributes({
                    let mut a = Attributes::default();
                    a.mode = 0o123;
                    a
                }),
        )
        .append(Entry::new(SourceDescriptor::Random(8), "with_owner").with_attributes(custom));

    let archive = collect(manifest, EncoderOptions::default()).await.unwrap();
    // Info-ZIP New Unix extra field id (0x7875) appears exactly once, for
    // the one entry with both uid and gid set.
    let uid_gid_extras = archive.windows(2).filter(|w| *w == 0x7875u16.to_le_bytes()).count();
    assert_eq!(uid_gid_extras, 1);
}

#[tokio::test]
async fn large_single_entry_produces_a_valid_zip64_trailer() {
    // Scaled down from the 8 GiB scenario; exercises the same trailer shape
    // without the multi-gigabyte runtime cost.
    let manifest = Manifest::create().append(Entry::new(SourceDescriptor::Random(1 << 20), "big.bin"));
    let archive = collect(manifest, EncoderOptions::default()).await.unwrap();
    let file = write_to_temp_zip(&archive);
    assert_decodable(file.path());

    assert!(archive.windows(4).any(|w| w == 0x06064b50u32.to_le_bytes())); // zip64 eocd
    assert!(archive.windows(4).any(|w| w == 0x07064b50u32.to_le_bytes())); // zip64 locator
    assert!(archive.windows(4).any(|w| w == 0x06054b50u32.to_le_bytes())); // legacy eocd
}
