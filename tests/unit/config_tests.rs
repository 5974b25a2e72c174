// Configuration loading from YAML files

use dims::config::{Config, WebpCompression};
use std::io::Write;

fn write_config(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(yaml.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_from_file_loads_nested_sections() {
    let file = write_config(
        r#"
bind_address: ":9090"
development_mode: true
timeout:
  download: 1500
edge_control:
  downstream_ttl: 600
output_format:
  default: webp
  excluded: [gif]
webp:
  quality: 70
  compression: lossless
source:
  default: file
  allowed: [file, s3]
s3:
  bucket: images
  prefix: originals/
file:
  base_dir: /srv/images
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.listen_address(), "0.0.0.0:9090");
    assert!(config.development_mode);
    assert_eq!(config.timeout.download, 1500);
    assert_eq!(config.edge_control.downstream_ttl, 600);
    assert_eq!(config.output_format.default.as_deref(), Some("webp"));
    assert_eq!(config.output_format.excluded, vec!["gif"]);
    assert_eq!(config.webp.quality, 70);
    assert_eq!(config.webp.compression, WebpCompression::Lossless);
    assert_eq!(config.source.allowed, vec!["file", "s3"]);
    assert_eq!(config.s3.bucket.as_deref(), Some("images"));
    assert_eq!(config.s3.prefix.as_deref(), Some("originals/"));
    assert_eq!(config.file.base_dir, "/srv/images");
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_file_substitutes_environment() {
    std::env::set_var("DIMS_CONFIG_TEST_KEY", "from-env");
    let file = write_config("signing:\n  signing_key: ${DIMS_CONFIG_TEST_KEY}\n");

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.signing_key(), "from-env");
}

#[test]
fn test_empty_file_is_default_config() {
    let file = write_config("");
    assert_eq!(Config::from_file(file.path()).unwrap(), Config::default());
}

#[test]
fn test_missing_file_is_an_error() {
    let err = Config::from_file("/definitely/not/here/dims.yaml").unwrap_err();
    assert!(err.contains("Failed to read config file"));
}

#[test]
fn test_malformed_yaml_is_an_error() {
    let file = write_config("timeout:\n  download: [not, a, number]\n");
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_validate_rejects_unknown_output_format() {
    let mut config = Config::default();
    config.signing.signing_key = Some("k".to_string());
    config.output_format.default = Some("bmp".to_string());
    assert!(config
        .validate()
        .unwrap_err()
        .contains("Invalid default output format"));
}
