//! Known-face encodings, built once per run from labelled reference samples.

use std::path::{Path, PathBuf};

use crate::error::{EncodeError, MonitorError, MonitorResult};
use crate::types::{Encoding, KnownFace};

/// Turns the raw bytes of one reference sample into face encodings.
pub trait FaceEncoder {
    fn encode(&mut self, bytes: &[u8]) -> Result<Vec<Encoding>, EncodeError>;
}

/// Encoder for samples that already carry their encodings as a JSON array
/// of vectors.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEncoder;

impl FaceEncoder for JsonEncoder {
    fn encode(&mut self, bytes: &[u8]) -> Result<Vec<Encoding>, EncodeError> {
        serde_json::from_slice(bytes).map_err(|e| EncodeError::Decode(e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceSample {
    pub label: String,
    /// Raw sample bytes, or why they could not be read.
    pub bytes: Result<Vec<u8>, String>,
    /// Where the sample came from, for log messages.
    pub source: Option<PathBuf>,
}

impl ReferenceSample {
    pub fn new(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            bytes: Ok(bytes),
            source: None,
        }
    }

    pub fn unreadable(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            bytes: Err(reason.into()),
            source: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Encoded,
    /// The encoder found no face in the sample.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub outcomes: Vec<(String, SampleOutcome)>,
}

impl BuildReport {
    pub fn encoded(&self) -> usize {
        self.count(|o| matches!(o, SampleOutcome::Encoded))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SampleOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SampleOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&SampleOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Frozen set of known faces. Iteration order is build order.
#[derive(Debug, Clone, Default)]
pub struct EncodingStore {
    faces: Vec<KnownFace>,
}

impl EncodingStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Encodes every sample and keeps the first encoding of each.
    ///
    /// Samples without a face, that could not be read, or that the encoder
    /// rejects are recorded in the report and skipped. Encodings of differing length abort the build.
    pub fn build<I, E>(samples: I, encoder: &mut E) -> MonitorResult<(Self, BuildReport)>
    where
        I: IntoIterator<Item = ReferenceSample>,
        E: FaceEncoder + ?Sized,
    {
        let mut faces: Vec<KnownFace> = Vec::new();
        let mut report = BuildReport::default();

        for sample in samples {
            let encoded = match &sample.bytes {
                Ok(bytes) => encoder.encode(bytes).map_err(|e| e.to_string()),
                Err(reason) => Err(reason.clone()),
            };
            let outcome = match encoded {
                Ok(encodings) => match encodings.into_iter().next() {
                    Some(encoding) => {
                        if let Some(first) = faces.first() {
                            if first.encoding.len() != encoding.len() {
                                return Err(MonitorError::DimensionMismatch {
                                    expected: first.encoding.len(),
                                    actual: encoding.len(),
                                });
                            }
                        }
                        tracing::info!(label = %sample.label, "encoded reference face");
                        faces.push(KnownFace {
                            label: sample.label.clone(),
                            encoding,
                        });
                        SampleOutcome::Encoded
                    }
                    None => {
                        tracing::warn!(
                            label = %sample.label,
                            source = ?sample.source,
                            "no face found in reference sample, skipping"
                        );
                        SampleOutcome::Skipped
                    }
                },
                Err(e) => {
                    tracing::error!(
                        label = %sample.label,
                        source = ?sample.source,
                        error = %e,
                        "failed to process reference sample"
                    );
                    SampleOutcome::Failed(e)
                }
            };
            report.outcomes.push((sample.label, outcome));
        }

        Ok((Self { faces }, report))
    }

    pub fn all_encodings(&self) -> &[KnownFace] {
        &self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.faces.first().map(|f| f.encoding.len())
    }
}

/// Reads every regular file in `dir` as a reference sample labelled by its
/// file stem, in filename order.
///
/// A missing directory yields no samples. An unreadable file still yields a
/// sample carrying the read error, which the build reports as failed.
pub fn reference_samples_from_dir(dir: &Path) -> MonitorResult<Vec<ReferenceSample>> {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "reference folder not found, no faces will be known");
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|source| MonitorError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let samples = paths
        .into_iter()
        .filter_map(|path| {
            let label = path.file_stem()?.to_string_lossy().into_owned();
            let bytes = std::fs::read(&path).map_err(|e| format!("cannot read sample: {e}"));
            Some(ReferenceSample {
                label,
                bytes,
                source: Some(path),
            })
        })
        .collect();

    Ok(samples)
}
