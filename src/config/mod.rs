// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub mod codec;
pub mod server;
pub mod source;

pub use codec::{JpegConfig, PngConfig, WebpCompression, WebpConfig};
pub use server::{
    EdgeControlConfig, ErrorImageConfig, OptionsConfig, OriginCacheControlConfig,
    OutputFormatConfig, TimeoutConfig,
};
pub use source::{FileConfig, S3Config, SourceConfig};

use crate::constants::{DEFAULT_BIND_ADDRESS, KNOWN_SOURCE_BACKENDS};

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

/// Digest used for response ETags
///
/// Chosen by the protocol adapter: v4 uses MD5, v5 uses SHA-256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EtagAlgorithm {
    #[default]
    Md5,
    HmacSha256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Opaque key; `sha1:` and `hkdf:` prefixes select key derivation
    #[serde(default)]
    pub signing_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Disables signature verification
    #[serde(default)]
    pub development_mode: bool,
    /// Enables verbose logging
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default)]
    pub signing: SigningConfig,
    #[serde(default)]
    pub timeout: TimeoutConfig,
    #[serde(default)]
    pub edge_control: EdgeControlConfig,
    #[serde(default)]
    pub origin_cache_control: OriginCacheControlConfig,
    #[serde(default)]
    pub error: ErrorImageConfig,
    #[serde(default)]
    pub output_format: OutputFormatConfig,
    #[serde(default)]
    pub options: OptionsConfig,
    #[serde(default)]
    pub jpeg: JpegConfig,
    #[serde(default)]
    pub png: PngConfig,
    #[serde(default)]
    pub webp: WebpConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub s3: S3Config,
    #[serde(default)]
    pub file: FileConfig,
    #[serde(skip)]
    pub etag_algorithm: EtagAlgorithm,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            development_mode: false,
            debug_mode: false,
            signing: SigningConfig::default(),
            timeout: TimeoutConfig::default(),
            edge_control: EdgeControlConfig::default(),
            origin_cache_control: OriginCacheControlConfig::default(),
            error: ErrorImageConfig::default(),
            output_format: OutputFormatConfig::default(),
            options: OptionsConfig::default(),
            jpeg: JpegConfig::default(),
            png: PngConfig::default(),
            webp: WebpConfig::default(),
            source: SourceConfig::default(),
            s3: S3Config::default(),
            file: FileConfig::default(),
            etag_algorithm: EtagAlgorithm::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Defaults, then the optional YAML file, then `DIMS_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `DIMS_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), String> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply `DIMS_*` overrides from an arbitrary lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvLookup(lookup);

        env.string("DIMS_BIND_ADDRESS", &mut self.bind_address);
        env.parse("DIMS_DEVELOPMENT_MODE", &mut self.development_mode)?;
        env.parse("DIMS_DEBUG_MODE", &mut self.debug_mode)?;
        if let Some(key) = env.get("DIMS_SIGNING_KEY") {
            self.signing.signing_key = Some(key);
        }
        env.parse("DIMS_DOWNLOAD_TIMEOUT", &mut self.timeout.download)?;
        env.parse(
            "DIMS_EDGE_CONTROL_DOWNSTREAM_TTL",
            &mut self.edge_control.downstream_ttl,
        )?;

        let cc = &mut self.origin_cache_control;
        env.parse("DIMS_CACHE_CONTROL_USE_ORIGIN", &mut cc.use_origin)?;
        env.parse("DIMS_CACHE_CONTROL_MIN", &mut cc.min)?;
        env.parse("DIMS_CACHE_CONTROL_MAX", &mut cc.max)?;
        env.parse("DIMS_CACHE_CONTROL_DEFAULT", &mut cc.default)?;
        env.parse("DIMS_CACHE_CONTROL_ERROR", &mut cc.error)?;

        env.string("DIMS_ERROR_BACKGROUND", &mut self.error.background);
        if let Some(format) = env.get("DIMS_DEFAULT_OUTPUT_FORMAT") {
            self.output_format.default = Some(format);
        }
        env.list("DIMS_EXCLUDED_OUTPUT_FORMATS", &mut self.output_format.excluded);
        env.parse("DIMS_STRIP_METADATA", &mut self.options.strip_metadata)?;
        env.parse(
            "DIMS_INCLUDE_DISPOSITION",
            &mut self.options.include_disposition,
        )?;

        let jpeg = &mut self.jpeg;
        env.parse("DIMS_JPEG_QUALITY", &mut jpeg.quality)?;
        env.parse("DIMS_JPEG_INTERLACE", &mut jpeg.interlace)?;
        env.parse("DIMS_JPEG_OPTIMIZE_CODING", &mut jpeg.optimize_coding)?;
        env.parse("DIMS_JPEG_SUBSAMPLE_MODE", &mut jpeg.subsample_mode)?;
        env.parse("DIMS_JPEG_TRELLIS_QUANT", &mut jpeg.trellis_quant)?;
        env.parse(
            "DIMS_JPEG_OVERSHOOT_DERINGING",
            &mut jpeg.overshoot_deringing,
        )?;
        env.parse("DIMS_JPEG_OPTIMIZE_SCANS", &mut jpeg.optimize_scans)?;
        env.parse("DIMS_JPEG_QUANT_TABLE", &mut jpeg.quant_table)?;

        env.parse("DIMS_PNG_QUALITY", &mut self.png.quality)?;
        env.parse("DIMS_PNG_INTERLACE", &mut self.png.interlace)?;
        env.parse("DIMS_PNG_COMPRESSION", &mut self.png.compression)?;

        env.parse("DIMS_WEBP_QUALITY", &mut self.webp.quality)?;
        env.parse("DIMS_WEBP_COMPRESSION", &mut self.webp.compression)?;
        env.parse("DIMS_WEBP_REDUCTION_EFFORT", &mut self.webp.reduction_effort)?;

        env.string("DIMS_DEFAULT_SOURCE_BACKEND", &mut self.source.default);
        env.list("DIMS_ALLOWED_SOURCE_BACKENDS", &mut self.source.allowed);

        if let Some(region) = env.get("DIMS_S3_REGION") {
            self.s3.region = Some(region);
        }
        if let Some(bucket) = env.get("DIMS_S3_BUCKET") {
            self.s3.bucket = Some(bucket);
        }
        if let Some(prefix) = env.get("DIMS_S3_PREFIX") {
            self.s3.prefix = Some(prefix);
        }
        env.string("DIMS_FILE_BASE_DIR", &mut self.file.base_dir);

        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.development_mode
            && self
                .signing
                .signing_key
                .as_deref()
                .map_or(true, str::is_empty)
        {
            return Err(
                "signing key is required: set DIMS_SIGNING_KEY or enable development mode"
                    .to_string(),
            );
        }

        crate::request::error_image::parse_hex_color(&self.error.background)
            .ok_or_else(|| format!("Invalid error background '{}'", self.error.background))?;

        for (codec, quality) in [
            ("jpeg", self.jpeg.quality),
            ("png", self.png.quality),
            ("webp", self.webp.quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(format!(
                    "{} quality {} out of range (1-100)",
                    codec, quality
                ));
            }
        }

        if self.png.compression > 9 {
            return Err(format!(
                "png compression {} out of range (0-9)",
                self.png.compression
            ));
        }

        if !KNOWN_SOURCE_BACKENDS.contains(&self.source.default.as_str()) {
            return Err(format!(
                "Unknown default source backend '{}'",
                self.source.default
            ));
        }

        for backend in &self.source.allowed {
            if !KNOWN_SOURCE_BACKENDS.contains(&backend.as_str()) {
                return Err(format!("Unknown source backend '{}'", backend));
            }
        }

        if let Some(format) = &self.output_format.default {
            format
                .parse::<crate::codec::ImageType>()
                .map_err(|e| format!("Invalid default output format: {}", e))?;
        }

        Ok(())
    }

    /// Socket address for the listener (`:8080` binds every interface)
    pub fn listen_address(&self) -> String {
        if self.bind_address.starts_with(':') {
            format!("0.0.0.0{}", self.bind_address)
        } else {
            self.bind_address.clone()
        }
    }

    /// Signing key, or an empty string when none is configured
    pub fn signing_key(&self) -> &str {
        self.signing.signing_key.as_deref().unwrap_or_default()
    }

    /// Copy of this config for a single request
    pub fn for_request(&self, etag_algorithm: EtagAlgorithm) -> Config {
        let mut config = self.clone();
        config.etag_algorithm = etag_algorithm;
        config
    }
}

struct EnvLookup<F>(F);

impl<F> EnvLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }

    fn string(&self, name: &str, target: &mut String) {
        if let Some(value) = self.get(name) {
            *target = value;
        }
    }

    fn list(&self, name: &str, target: &mut Vec<String>) {
        if let Some(value) = self.get(name) {
            *target = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    fn parse<T: EnvValue>(&self, name: &str, target: &mut T) -> Result<(), String> {
        if let Some(value) = self.get(name) {
            *target = T::parse_env(value.trim())
                .ok_or_else(|| format!("Invalid value '{}' for {}", value, name))?;
        }
        Ok(())
    }
}

trait EnvValue: Sized {
    fn parse_env(value: &str) -> Option<Self>;
}

impl EnvValue for bool {
    fn parse_env(value: &str) -> Option<Self> {
        match value {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
            _ => None,
        }
    }
}

impl EnvValue for u8 {
    fn parse_env(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

impl EnvValue for u64 {
    fn parse_env(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

impl EnvValue for WebpCompression {
    fn parse_env(value: &str) -> Option<Self> {
        WebpCompression::from_str(value).ok()
    }
}
