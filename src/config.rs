//! Runtime configuration gathered from the environment.
//!
//! `.env` is loaded by `main` in debug builds only; everything here reads
//! plain variables so the same binary works under systemd, Docker or a shell.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    InMemory { data_dir: PathBuf },
    Postgres { url: String, max_connections: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Base for public object URLs; defaults to `{endpoint}/{bucket}`.
    pub public_base: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobConfig {
    Fs { root: PathBuf, public_base: String },
    S3(S3Config),
}

impl BlobConfig {
    /// Base that stored object URLs start with.
    pub fn public_base(&self) -> String {
        match self {
            BlobConfig::Fs { public_base, .. } => public_base.clone(),
            BlobConfig::S3(s3) => s3.object_base(),
        }
    }
}

impl S3Config {
    pub fn object_base(&self) -> String {
        self.public_base
            .clone()
            .unwrap_or_else(|| format!("{}/{}", self.endpoint.trim_end_matches('/'), self.bucket))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: String,
    pub frontend_url: Option<String>,
    pub store: StoreConfig,
    pub blobs: BlobConfig,
    pub rate_limit_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source (tests pass a map).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| get(name).filter(|v| !v.trim().is_empty());

        let data_dir = var("MEMORIES_DATA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("data"));

        let store = match var("STORE_BACKEND").as_deref() {
            Some("memory") => StoreConfig::InMemory { data_dir: data_dir.clone() },
            Some("postgres") => postgres(&var)?,
            Some(other) => return Err(ConfigError::Invalid { var: "STORE_BACKEND", value: other.to_string() }),
            None if var("DATABASE_URL").is_some() => postgres(&var)?,
            None => StoreConfig::InMemory { data_dir: data_dir.clone() },
        };

        let blobs = match var("BLOB_BACKEND").as_deref() {
            Some("fs") => fs_blobs(&var, &data_dir),
            Some("s3") => BlobConfig::S3(s3(&var)?),
            Some(other) => return Err(ConfigError::Invalid { var: "BLOB_BACKEND", value: other.to_string() }),
            None if var("S3_ENDPOINT").is_some() => BlobConfig::S3(s3(&var)?),
            None => fs_blobs(&var, &data_dir),
        };

        let rate_limit_enabled = match var("RL_ENABLED") {
            None => true,
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid { var: "RL_ENABLED", value: v })?,
        };

        Ok(Self {
            bind_addr: var("MEMORIES_BIND").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            frontend_url: var("FRONTEND_URL"),
            store,
            blobs,
            rate_limit_enabled,
        })
    }
}

fn postgres(var: &impl Fn(&str) -> Option<String>) -> Result<StoreConfig, ConfigError> {
    let url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
    let max_connections = match var("DATABASE_MAX_CONNECTIONS") {
        None => 5,
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { var: "DATABASE_MAX_CONNECTIONS", value: v })?,
    };
    Ok(StoreConfig::Postgres { url, max_connections })
}

fn s3(var: &impl Fn(&str) -> Option<String>) -> Result<S3Config, ConfigError> {
    Ok(S3Config {
        endpoint: var("S3_ENDPOINT").ok_or(ConfigError::Missing("S3_ENDPOINT"))?,
        bucket: var("S3_BUCKET").unwrap_or_else(|| "memories".into()),
        region: var("S3_REGION").unwrap_or_else(|| "us-east-1".into()),
        access_key: var("S3_ACCESS_KEY").unwrap_or_default(),
        secret_key: var("S3_SECRET_KEY").unwrap_or_default(),
        public_base: var("PUBLIC_FILES_URL"),
    })
}

fn fs_blobs(var: &impl Fn(&str) -> Option<String>, data_dir: &std::path::Path) -> BlobConfig {
    BlobConfig::Fs {
        root: var("FILES_DIR").map(PathBuf::from).unwrap_or_else(|| data_dir.join("files")),
        public_base: var("PUBLIC_FILES_URL").unwrap_or_else(|| "/files".into()),
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_to_memory_and_fs() {
        let cfg = from(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.store, StoreConfig::InMemory { data_dir: PathBuf::from("data") });
        assert_eq!(cfg.blobs, BlobConfig::Fs { root: PathBuf::from("data/files"), public_base: "/files".into() });
        assert!(cfg.rate_limit_enabled);
    }

    #[test]
    fn database_url_selects_postgres() {
        let cfg = from(&[("DATABASE_URL", "postgres://x/y")]).unwrap();
        assert_eq!(cfg.store, StoreConfig::Postgres { url: "postgres://x/y".into(), max_connections: 5 });
    }

    #[test]
    fn explicit_postgres_without_url_is_an_error() {
        assert_eq!(from(&[("STORE_BACKEND", "postgres")]).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn s3_endpoint_selects_s3_with_keys() {
        let cfg = from(&[("S3_ENDPOINT", "http://minio:9000"), ("S3_ACCESS_KEY", "ak"), ("S3_SECRET_KEY", "sk")]).unwrap();
        match cfg.blobs {
            BlobConfig::S3(s3) => {
                assert_eq!(s3.bucket, "memories");
                assert_eq!(s3.access_key, "ak");
                assert_eq!(s3.public_base, None);
            }
            other => panic!("expected s3, got {other:?}"),
        }
    }

    #[test]
    fn public_base_defaults_to_endpoint_and_bucket() {
        let s3 = from(&[("S3_ENDPOINT", "http://minio:9000/"), ("S3_ACCESS_KEY", "ak"), ("S3_SECRET_KEY", "sk")]).unwrap();
        assert_eq!(s3.blobs.public_base(), "http://minio:9000/memories");
        assert_eq!(from(&[]).unwrap().blobs.public_base(), "/files");
    }

    #[test]
    fn rejects_unknown_backend_and_bad_flags() {
        assert!(matches!(from(&[("BLOB_BACKEND", "ftp")]), Err(ConfigError::Invalid { var: "BLOB_BACKEND", .. })));
        assert!(matches!(from(&[("RL_ENABLED", "maybe")]), Err(ConfigError::Invalid { var: "RL_ENABLED", .. })));
        assert!(!from(&[("RL_ENABLED", "off")]).unwrap().rate_limit_enabled);
    }
}
