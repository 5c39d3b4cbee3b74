//! Layered YAML configuration with environment overrides. Mirrors the
//! corpus's "merge layer files, let env vars win" loader shape, trimmed to
//! what this service actually needs: no canonical-hash step, since nothing
//! here needs a config fingerprint for artifact reproducibility.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub project: ProjectConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub topics: Topics,
    pub publisher: PublisherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topics {
    pub book_events: String,
}

/// Knobs for the outbox worker (§4.8): how often it ticks, how many rows it
/// claims per tick, and how many worker tasks fan out per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    pub interval_ms: u64,
    pub batch_size: i64,
    pub count_workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_project_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_project_name() -> String {
    "book-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load `paths` in order (later files override earlier ones via deep
    /// merge), then apply the small set of env var overrides this service
    /// supports: `BOOK_DATABASE_URL` and `BOOK_KAFKA_BROKERS` (comma
    /// separated). Env always wins over file content — the file is for
    /// everything that is not a secret or per-environment connection
    /// string.
    pub fn load(paths: &[&str]) -> anyhow::Result<Self> {
        let merged = load_layered_yaml(paths)?;
        let mut config: Config =
            serde_json::from_value(merged).context("config.load: deserialize merged config")?;

        if let Ok(url) = std::env::var("BOOK_DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(brokers) = std::env::var("BOOK_KAFKA_BROKERS") {
            config.kafka.brokers = brokers.split(',').map(|s| s.trim().to_string()).collect();
        }

        Ok(config)
    }
}

/// Deep-merge YAML files in order into one JSON value.
fn load_layered_yaml(paths: &[&str]) -> anyhow::Result<Value> {
    let mut merged = Value::Object(Default::default());

    for p in paths {
        let raw = fs::read_to_string(p).with_context(|| format!("read config: {p}"))?;
        let yaml_val: serde_yaml::Value =
            serde_yaml::from_str(&raw).with_context(|| format!("parse yaml: {p}"))?;
        let json_val = serde_json::to_value(yaml_val).context("yaml->json conversion failed")?;
        deep_merge(&mut merged, json_val);
    }

    Ok(merged)
}

fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn later_layer_overrides_earlier_one() {
        let base = write_temp(
            r#"
database:
  url: "postgres://base"
kafka:
  brokers: ["base:9092"]
  topics:
    book_events: "book.events"
  publisher:
    interval_ms: 1000
    batch_size: 100
    count_workers: 4
"#,
        );
        let override_file = write_temp(
            r#"
database:
  url: "postgres://override"
"#,
        );

        let config = Config::load(&[
            base.path().to_str().unwrap(),
            override_file.path().to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(config.database.url, "postgres://override");
        assert_eq!(config.kafka.brokers, vec!["base:9092"]);
        assert_eq!(config.project.name, "book-service");
    }

    #[test]
    fn env_var_wins_over_every_file_layer() {
        let base = write_temp(
            r#"
database:
  url: "postgres://base"
kafka:
  brokers: ["base:9092"]
  topics:
    book_events: "book.events"
  publisher:
    interval_ms: 1000
    batch_size: 100
    count_workers: 4
"#,
        );

        std::env::set_var("BOOK_DATABASE_URL", "postgres://env-wins");
        std::env::set_var("BOOK_KAFKA_BROKERS", "a:9092, b:9092");
        let config = Config::load(&[base.path().to_str().unwrap()]).unwrap();
        std::env::remove_var("BOOK_DATABASE_URL");
        std::env::remove_var("BOOK_KAFKA_BROKERS");

        assert_eq!(config.database.url, "postgres://env-wins");
        assert_eq!(config.kafka.brokers, vec!["a:9092", "b:9092"]);
    }
}
