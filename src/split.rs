use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, error};

use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::geojson::FeatureCollection;
use crate::stream::{BatchStream, FeatureStream};
use crate::suffix;

/// Outcome counts for one split run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SplitReport {
    /// Files successfully written (or that would have been, in dry-run).
    pub files_written: u64,
    /// Features distributed into those files.
    pub features_written: u64,
    /// Batches whose write failed; the run continued past them.
    pub write_failures: u64,
}

/// Drives the full split of one document under one configuration.
///
/// Pulls one batch at a time and writes it before pulling the next, so at
/// most one batch is in memory at any point.
pub struct Splitter {
    config: SplitConfig,
}

impl Splitter {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Run the split to completion.
    ///
    /// Stops early, without error, at the configured file limit. A write
    /// failure for one file is logged and counted but does not stop the
    /// run; an exhausted suffix space does, since files past it could no
    /// longer be named uniquely.
    pub fn run(&self) -> Result<SplitReport, SplitError> {
        self.config.validate()?;

        let stream = FeatureStream::open(&self.config.source)?;
        let mut batches = BatchStream::new(stream, self.config.batch_size);

        let output_dir = self.config.resolved_output_dir();
        let mut report = SplitReport::default();
        let mut index: u64 = 0;

        loop {
            if let Some(limit) = self.config.limit {
                if index >= limit {
                    debug!("file limit of {limit} reached, stopping");
                    break;
                }
            }
            let Some(batch) = batches.next_batch()? else {
                break;
            };

            let destination = self.destination(&output_dir, index)?;
            let collection = FeatureCollection::new(batch);

            if self.config.dry_run {
                debug!(
                    "dry run: would save {} features to {}",
                    collection.len(),
                    destination.display()
                );
                report.files_written += 1;
                report.features_written += collection.len() as u64;
            } else {
                match write_collection(&output_dir, &destination, &collection) {
                    Ok(()) => {
                        debug!(
                            "successfully saved {} features to {}",
                            collection.len(),
                            destination.display()
                        );
                        report.files_written += 1;
                        report.features_written += collection.len() as u64;
                    }
                    Err(err) => {
                        error!(
                            "could not write features to {}: {err:#}",
                            destination.display()
                        );
                        report.write_failures += 1;
                    }
                }
            }
            index += 1;
        }

        Ok(report)
    }

    /// Destination path for batch `index`:
    /// `{output_dir}/{stem}_x{suffix}.{extension}`, the extension carried
    /// over from the source document.
    fn destination(&self, output_dir: &Path, index: u64) -> Result<PathBuf, SplitError> {
        let suffix = suffix::encode(index, self.config.suffix_width)?;
        let stem = self
            .config
            .source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match self.config.source.extension() {
            Some(extension) => format!("{stem}_x{suffix}.{}", extension.to_string_lossy()),
            None => format!("{stem}_x{suffix}"),
        };
        Ok(output_dir.join(name))
    }
}

/// Write one batch as a standalone FeatureCollection document. The write
/// handle lives only for the scope of this call.
fn write_collection(
    output_dir: &Path,
    destination: &Path,
    collection: &FeatureCollection,
) -> anyhow::Result<()> {
    if !output_dir.as_os_str().is_empty() && !output_dir.exists() {
        debug!("creating output directory {}", output_dir.display());
        std::fs::create_dir_all(output_dir).with_context(|| {
            format!("failed to create output directory {}", output_dir.display())
        })?;
    }

    let file = File::create(destination)
        .with_context(|| format!("failed to create {}", destination.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, collection)
        .with_context(|| format!("failed to serialize features to {}", destination.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", destination.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamError;
    use serde_json::json;
    use std::path::PathBuf;

    /// Write a source document with `count` point features into `dir`.
    fn write_source(dir: &Path, count: usize) -> PathBuf {
        let features: Vec<serde_json::Value> = (0..count)
            .map(|id| {
                json!({
                    "type": "Feature",
                    "properties": {"id": id},
                    "geometry": {"type": "Point", "coordinates": [id as f64, 0.0]}
                })
            })
            .collect();
        let document = json!({"type": "FeatureCollection", "features": features});
        let path = dir.join("random.geojson");
        std::fs::write(&path, serde_json::to_string(&document).unwrap()).unwrap();
        path
    }

    /// Split outputs in `dir`, sorted by filename. The suffix encoding
    /// makes that order the creation order.
    fn output_files(dir: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().contains("_x"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();
        paths
    }

    fn read_features(path: &Path) -> Vec<serde_json::Value> {
        let value: serde_json::Value =
            serde_json::from_reader(File::open(path).unwrap()).unwrap();
        value["features"].as_array().unwrap().clone()
    }

    #[test]
    fn test_roundtrip_25_features_in_batches_of_2() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), 25);

        let report = Splitter::new(SplitConfig::new(&source).batch_size(2))
            .run()
            .unwrap();

        assert_eq!(report.files_written, 13);
        assert_eq!(report.features_written, 25);
        assert_eq!(report.write_failures, 0);

        let outputs = output_files(dir.path());
        assert_eq!(outputs.len(), 13);
        assert_eq!(
            outputs[0].file_name().unwrap().to_str().unwrap(),
            "random_xaaaa.geojson"
        );
        assert_eq!(
            outputs[12].file_name().unwrap().to_str().unwrap(),
            "random_xaaam.geojson"
        );

        // Every file but the last holds two features; concatenating them
        // all reproduces the source order exactly
        let mut recombined = Vec::new();
        for (position, path) in outputs.iter().enumerate() {
            let features = read_features(path);
            if position < 12 {
                assert_eq!(features.len(), 2);
            } else {
                assert_eq!(features.len(), 1);
            }
            recombined.extend(features);
        }
        for (id, feature) in recombined.iter().enumerate() {
            assert_eq!(feature["properties"]["id"], id);
        }
    }

    #[test]
    fn test_output_documents_are_plain_feature_collections() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), 3);

        Splitter::new(SplitConfig::new(&source).batch_size(2))
            .run()
            .unwrap();

        for path in output_files(dir.path()) {
            let value: serde_json::Value =
                serde_json::from_reader(File::open(&path).unwrap()).unwrap();
            let object = value.as_object().unwrap();
            assert_eq!(object.len(), 2);
            assert_eq!(object["type"], "FeatureCollection");
            assert!(object["features"].is_array());
        }
    }

    #[test]
    fn test_limit_caps_the_number_of_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), 10);

        let report = Splitter::new(SplitConfig::new(&source).batch_size(1).limit(3))
            .run()
            .unwrap();

        assert_eq!(report.files_written, 3);
        assert_eq!(output_files(dir.path()).len(), 3);
    }

    #[test]
    fn test_dry_run_writes_nothing_but_reports_identically() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), 25);
        let output_dir = dir.path().join("out");

        let dry = Splitter::new(
            SplitConfig::new(&source)
                .batch_size(2)
                .output_dir(&output_dir)
                .dry_run(true),
        )
        .run()
        .unwrap();

        assert!(!output_dir.exists());

        let real = Splitter::new(
            SplitConfig::new(&source)
                .batch_size(2)
                .output_dir(&output_dir),
        )
        .run()
        .unwrap();

        assert_eq!(dry, real);
        assert_eq!(output_files(&output_dir).len(), 13);
    }

    #[test]
    fn test_output_directory_created_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), 5);
        let nested = dir.path().join("a").join("b").join("c");

        Splitter::new(SplitConfig::new(&source).output_dir(&nested))
            .run()
            .unwrap();

        assert!(nested.join("random_xaaaa.geojson").exists());
    }

    #[test]
    fn test_suffix_exhaustion_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), 26);

        let err = Splitter::new(SplitConfig::new(&source).batch_size(1).suffix_width(1))
            .run()
            .unwrap_err();

        assert!(matches!(err, SplitError::Suffix(_)), "{err:?}");
        // The 25 in-domain files were already written before the abort
        assert_eq!(output_files(dir.path()).len(), 25);
    }

    #[test]
    fn test_zero_features_produce_zero_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), 0);

        let report = Splitter::new(SplitConfig::new(&source)).run().unwrap();

        assert_eq!(report, SplitReport::default());
        assert!(output_files(dir.path()).is_empty());
    }

    #[test]
    fn test_shape_mismatch_is_a_silent_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("odd.geojson");
        std::fs::write(&source, r#"{"type": "FeatureCollection"}"#).unwrap();

        let report = Splitter::new(SplitConfig::new(&source)).run().unwrap();

        assert_eq!(report.files_written, 0);
        assert!(output_files(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_source_fails_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("missing.geojson");

        let err = Splitter::new(SplitConfig::new(&source)).run().unwrap_err();

        assert!(matches!(
            err,
            SplitError::Stream(StreamError::NotFound(_))
        ));
        assert!(output_files(dir.path()).is_empty());
    }

    #[test]
    fn test_invalid_batch_size_rejected_before_opening_the_source() {
        // Config validation runs first: the bogus path is never touched
        let err = Splitter::new(SplitConfig::new("missing.geojson").batch_size(0))
            .run()
            .unwrap_err();

        assert!(matches!(err, SplitError::Config(_)));
    }

    #[test]
    fn test_source_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("data");
        std::fs::write(&source, r#"{"features": [{"id": 1}]}"#).unwrap();

        Splitter::new(SplitConfig::new(&source)).run().unwrap();

        assert!(dir.path().join("data_xaaaa").exists());
    }

    #[test]
    fn test_custom_suffix_width() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), 2);

        Splitter::new(SplitConfig::new(&source).batch_size(1).suffix_width(2))
            .run()
            .unwrap();

        assert!(dir.path().join("random_xaa.geojson").exists());
        assert!(dir.path().join("random_xab.geojson").exists());
    }
}
