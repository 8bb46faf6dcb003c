use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureSettings,
    pub storage: StorageConfig,
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Capture source: "file" or "microphone"
    pub source: String,
    /// WAV file played back by the file source
    pub wav_path: String,
    pub fragment_duration_ms: u64,
    pub spectrum_interval_ms: u64,
    pub spectrum_bins: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub recordings_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            capture: CaptureSettings::default(),
            storage: StorageConfig::default(),
            transcription: TranscriptionConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "voxpad".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3100,
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            source: "file".to_string(),
            wav_path: "capture.wav".to_string(),
            fragment_duration_ms: 250,
            spectrum_interval_ms: 100,
            spectrum_bins: 32,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            recordings_path: "recordings".to_string(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/transcribe".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration, falling back to defaults when no file exists
    pub fn load(path: Option<&str>) -> Result<Self> {
        let builder = match path {
            Some(path) => {
                config::Config::builder().add_source(config::File::with_name(path))
            }
            None => config::Config::builder()
                .add_source(config::File::with_name("config/voxpad").required(false)),
        };

        let settings = builder.build()?;
        Ok(settings.try_deserialize()?)
    }
}
