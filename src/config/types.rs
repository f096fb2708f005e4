use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;

/// Prefix for environment variables overriding the YAML file,
/// e.g. `IMAGE_PERCEIVER_BIND_ADDRESS` or `IMAGE_PERCEIVER_LOGGING__LEVEL`.
pub const ENV_PREFIX: &str = "IMAGE_PERCEIVER_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: where to serve metrics and how to log.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn into_latest(self) -> ConfigV1 {
        match self {
            Config::ConfigV1(c) => c,
        }
    }
}

/// Builds the figment used to load configuration: `path` overridden by the environment.
pub fn figment(path: &str) -> Figment {
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load config from a YAML file named "config.yaml" in the current directory.
pub fn load_config() -> ConfigV1 {
    match figment("./config.yaml").extract::<Config>() {
        Ok(cfg) => cfg.into_latest(),
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error rendering configuration schema: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:9090
logging:
  level: "debug"
  format: "json"
"#;

    fn parse(yaml: &str) -> Result<ConfigV1, figment::Error> {
        Figment::new()
            .merge(Yaml::string(yaml))
            .extract::<Config>()
            .map(Config::into_latest)
    }

    #[test]
    fn parses_v1_config() {
        let config = parse(CONFIG).expect("config should parse");
        assert_eq!(config.bind_address, "127.0.0.1:9090");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.service_name, "image-perceiver");
    }

    #[test]
    fn logging_section_is_optional() {
        let config = parse("version: \"1.0.0\"\nbind_address: 0.0.0.0:9090\n")
            .expect("config should parse");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "console");
    }

    #[test]
    fn unknown_version_is_rejected() {
        assert!(parse("version: \"2.0.0\"\nbind_address: 0.0.0.0:9090\n").is_err());
    }

    #[test]
    fn environment_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.yaml", CONFIG)?;
            jail.set_env("IMAGE_PERCEIVER_BIND_ADDRESS", "0.0.0.0:9999");
            let config = figment("config.yaml").extract::<Config>()?.into_latest();
            assert_eq!(config.bind_address, "0.0.0.0:9999");
            assert_eq!(config.logging.level, "debug");
            Ok(())
        });
    }
}
