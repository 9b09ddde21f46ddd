//! Model serialization utilities
//!
//! A fitted model is written inside an envelope carrying magic bytes, a
//! format version, metadata and an FNV-1a checksum of the payload. The
//! payload itself is always bincode so floating point state survives the
//! round trip bit for bit; the format only selects how the envelope is
//! encoded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{FraudError, Result};
use crate::preprocessing::MinMaxScaler;

/// Envelope encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationFormat {
    /// Binary format using bincode (efficient)
    #[default]
    Binary,
    /// JSON format (portable, human-readable)
    Json,
}

impl std::str::FromStr for SerializationFormat {
    type Err = FraudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(Self::Binary),
            "json" => Ok(Self::Json),
            other => Err(FraudError::Config(format!(
                "unknown model format '{}', expected 'binary' or 'json'",
                other
            ))),
        }
    }
}

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,
    /// Version of the crate that wrote the file
    pub version: String,
    /// Training timestamp (RFC 3339)
    pub trained_at: String,
    /// Feature names, in matrix column order
    pub feature_names: Vec<String>,
    /// Target name
    pub target_name: String,
    pub hyperparameters: BTreeMap<String, String>,
    /// Holdout metrics
    pub metrics: BTreeMap<String, f64>,
    /// Scaler applied to the raw table before training
    pub scaler: Option<MinMaxScaler>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            name: "model".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: chrono::Utc::now().to_rfc3339(),
            feature_names: Vec::new(),
            target_name: "target".to_string(),
            hyperparameters: BTreeMap::new(),
            metrics: BTreeMap::new(),
            scaler: None,
        }
    }
}

impl ModelMetadata {
    /// Create new metadata with name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set feature names
    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.feature_names = features;
        self
    }

    /// Set target name
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_name = target.into();
        self
    }

    pub fn with_scaler(mut self, scaler: MinMaxScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    /// Add hyperparameter
    pub fn add_hyperparameter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.hyperparameters.insert(key.into(), value.to_string());
        self
    }

    /// Add metric; non-finite values are skipped so JSON envelopes stay valid
    pub fn add_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        if value.is_finite() {
            self.metrics.insert(key.into(), value);
        }
        self
    }
}

/// On-disk envelope around a serialized model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedModel {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    pub format_version: u32,
    pub metadata: ModelMetadata,
    /// bincode-encoded model
    pub model_data: Vec<u8>,
    /// FNV-1a hash of `model_data`
    pub checksum: u64,
}

impl SerializedModel {
    const MAGIC: [u8; 4] = *b"FRDM";
    const VERSION: u32 = 1;

    pub fn new(metadata: ModelMetadata, model_data: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&model_data);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            model_data,
            checksum,
        }
    }

    fn compute_checksum(data: &[u8]) -> u64 {
        const FNV_OFFSET: u64 = 14695981039346656037;
        const FNV_PRIME: u64 = 1099511628211;

        data.iter().fold(FNV_OFFSET, |hash, byte| {
            (hash ^ *byte as u64).wrapping_mul(FNV_PRIME)
        })
    }

    pub fn verify_checksum(&self) -> bool {
        Self::compute_checksum(&self.model_data) == self.checksum
    }

    /// Reject foreign files, newer format versions and corrupted payloads
    fn validate(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(FraudError::Serialization(
                "not a model file: bad magic bytes".to_string(),
            ));
        }
        if self.format_version > Self::VERSION {
            return Err(FraudError::Serialization(format!(
                "unsupported model format version {} (max {})",
                self.format_version,
                Self::VERSION
            )));
        }
        if !self.verify_checksum() {
            return Err(FraudError::Serialization(
                "checksum verification failed, file may be corrupted".to_string(),
            ));
        }
        Ok(())
    }
}

/// Save a serializable model to file
pub fn save_model<M: Serialize>(
    model: &M,
    path: impl AsRef<Path>,
    metadata: ModelMetadata,
    format: SerializationFormat,
) -> Result<()> {
    let path = path.as_ref();
    let model_data = bincode::serialize(model)?;
    let payload_len = model_data.len();
    let serialized = SerializedModel::new(metadata, model_data);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        SerializationFormat::Binary => bincode::serialize_into(&mut writer, &serialized)?,
        SerializationFormat::Json => serde_json::to_writer_pretty(&mut writer, &serialized)?,
    }
    writer.flush()?;

    info!(
        path = %path.display(),
        format = ?format,
        payload_bytes = payload_len,
        checksum = %format!("{:016x}", serialized.checksum),
        "Saved model"
    );
    Ok(())
}

/// Load a model and its metadata from file
pub fn load_model<M: for<'de> Deserialize<'de>>(
    path: impl AsRef<Path>,
    format: SerializationFormat,
) -> Result<(M, ModelMetadata)> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);

    let serialized: SerializedModel = match format {
        SerializationFormat::Binary => {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes)?;
            bincode::deserialize(&bytes)?
        }
        SerializationFormat::Json => serde_json::from_reader(&mut reader)?,
    };
    serialized.validate()?;

    let model: M = bincode::deserialize(&serialized.model_data)?;
    debug!(path = %path.display(), name = %serialized.metadata.name, "Loaded model");
    Ok((model, serialized.metadata))
}
