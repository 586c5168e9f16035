use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Raw source arguments as handed over by the host (or read from a file)
///
/// Every field is optional; `null` and missing keys both fall back to the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourceArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,

    /// Seconds to wait between poll cycles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_ssl: Option<bool>,

    /// Per-request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
}

/// Validated poller configuration, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfiguration {
    pub urls: Vec<String>,
    pub delay: Duration,
    pub verify_ssl: bool,
    pub timeout: Duration,
}

// Default values
fn default_delay() -> f64 {
    60.0
}

fn default_timeout() -> f64 {
    30.0
}

impl Default for PollConfiguration {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            delay: Duration::from_secs_f64(default_delay()),
            verify_ssl: true,
            timeout: Duration::from_secs_f64(default_timeout()),
        }
    }
}

impl PollConfiguration {
    /// Build a configuration from the host's args map
    pub fn from_value(args: serde_json::Value) -> Result<Self> {
        let args: SourceArgs =
            serde_json::from_value(args).context("Failed to parse source arguments")?;
        Self::from_args(args)
    }

    /// Validate raw arguments and apply defaults
    pub fn from_args(args: SourceArgs) -> Result<Self> {
        let delay = args.delay.unwrap_or_else(default_delay);
        if !delay.is_finite() || delay < 0.0 {
            anyhow::bail!("delay must be a non-negative number of seconds (got: {})", delay);
        }
        let delay = Duration::try_from_secs_f64(delay)
            .with_context(|| format!("delay out of range: {}", delay))?;

        let timeout = args.timeout.unwrap_or_else(default_timeout);
        if !timeout.is_finite() || timeout <= 0.0 {
            anyhow::bail!("timeout must be a positive number of seconds (got: {})", timeout);
        }
        let timeout = Duration::try_from_secs_f64(timeout)
            .with_context(|| format!("timeout out of range: {}", timeout))?;

        let urls = args.urls.unwrap_or_default();
        for target in &urls {
            // Kept anyway: fetching it reports the target as down
            if let Err(e) = url::Url::parse(target) {
                tracing::warn!("URL {:?} does not parse ({}); it will be reported as down", target, e);
            }
        }

        Ok(Self {
            urls,
            delay,
            verify_ssl: args.verify_ssl.unwrap_or(true),
            timeout,
        })
    }
}

impl SourceArgs {
    /// Overlay another set of arguments on top of this one.
    ///
    /// URLs are appended, scalar values in `other` win.
    pub fn merge(mut self, other: SourceArgs) -> Self {
        if let Some(extra) = other.urls {
            self.urls.get_or_insert_with(Vec::new).extend(extra);
        }
        self.delay = other.delay.or(self.delay);
        self.verify_ssl = other.verify_ssl.or(self.verify_ssl);
        self.timeout = other.timeout.or(self.timeout);
        self
    }
}

/// Rulebook-style document: `sources: [{ <plugin name>: { args } }]`
#[derive(Debug, Deserialize)]
struct RulebookSources {
    sources: Vec<serde_yaml::Mapping>,
}

/// Load source arguments from a YAML or TOML file
pub fn load_args(path: &Path) -> Result<SourceArgs> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    } else {
        parse_yaml_args(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

fn parse_yaml_args(content: &str) -> Result<SourceArgs> {
    let doc: serde_yaml::Value = serde_yaml::from_str(content).context("Invalid YAML")?;

    if doc.get("sources").is_none() {
        return serde_yaml::from_value(doc).context("Invalid source arguments");
    }

    let rulebook: RulebookSources =
        serde_yaml::from_value(doc).context("Invalid rulebook sources section")?;
    let source = rulebook
        .sources
        .into_iter()
        .next()
        .context("Rulebook sources section is empty")?;
    let (name, args) = source
        .into_iter()
        .next()
        .context("Rulebook source entry is empty")?;
    tracing::debug!("Using arguments of source {:?}", name);

    // `- custom_url_check:` with nothing below it is a null mapping
    if args.is_null() {
        return Ok(SourceArgs::default());
    }
    serde_yaml::from_value(args).context("Invalid source arguments")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn create_temp_config(content: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn empty_args_use_defaults() {
        let config = PollConfiguration::from_value(json!({})).unwrap();
        assert_eq!(config, PollConfiguration::default());
        assert!(config.urls.is_empty());
        assert_eq!(config.delay, Duration::from_secs(60));
        assert!(config.verify_ssl);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn null_values_fall_back_to_defaults() {
        let config = PollConfiguration::from_value(json!({
            "urls": null,
            "delay": null,
            "verify_ssl": null,
        }))
        .unwrap();
        assert_eq!(config, PollConfiguration::default());
    }

    #[test]
    fn explicit_values_are_kept_in_order() {
        let config = PollConfiguration::from_value(json!({
            "urls": ["http://b.test", "http://a.test"],
            "delay": 5,
            "verify_ssl": false,
        }))
        .unwrap();
        assert_eq!(config.urls, vec!["http://b.test", "http://a.test"]);
        assert_eq!(config.delay, Duration::from_secs(5));
        assert!(!config.verify_ssl);
    }

    #[test]
    fn fractional_delay_is_accepted() {
        let config = PollConfiguration::from_value(json!({ "delay": 0.5 })).unwrap();
        assert_eq!(config.delay, Duration::from_millis(500));
    }

    #[test]
    fn zero_delay_is_accepted() {
        let config = PollConfiguration::from_value(json!({ "delay": 0 })).unwrap();
        assert_eq!(config.delay, Duration::ZERO);
    }

    #[test]
    fn negative_delay_fails_validation() {
        assert!(PollConfiguration::from_value(json!({ "delay": -1 })).is_err());
    }

    #[test]
    fn non_positive_timeout_fails_validation() {
        assert!(PollConfiguration::from_value(json!({ "timeout": 0 })).is_err());
    }

    #[test]
    fn huge_delay_fails_validation() {
        let err = PollConfiguration::from_value(json!({ "delay": 1e20 })).unwrap_err();
        assert!(format!("{:#}", err).contains("delay out of range"));
    }

    #[test]
    fn huge_timeout_fails_validation() {
        let err = PollConfiguration::from_value(json!({ "timeout": 1e20 })).unwrap_err();
        assert!(format!("{:#}", err).contains("timeout out of range"));
    }

    #[test]
    fn wrong_types_fail_parsing() {
        assert!(PollConfiguration::from_value(json!({ "urls": "http://a.test" })).is_err());
        assert!(PollConfiguration::from_value(json!({ "verify_ssl": "no" })).is_err());
    }

    #[test]
    fn unparseable_url_is_kept() {
        let config = PollConfiguration::from_value(json!({ "urls": ["not a url"] })).unwrap();
        assert_eq!(config.urls, vec!["not a url"]);
    }

    #[test]
    fn merge_appends_urls_and_overrides_scalars() {
        let base = SourceArgs {
            urls: Some(vec!["http://a.test".to_string()]),
            delay: Some(10.0),
            verify_ssl: Some(true),
            timeout: None,
        };
        let overlay = SourceArgs {
            urls: Some(vec!["http://b.test".to_string()]),
            delay: None,
            verify_ssl: Some(false),
            timeout: Some(5.0),
        };
        let merged = base.merge(overlay);
        assert_eq!(
            merged.urls,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
        assert_eq!(merged.delay, Some(10.0));
        assert_eq!(merged.verify_ssl, Some(false));
        assert_eq!(merged.timeout, Some(5.0));
    }

    #[test]
    fn load_args_reads_bare_yaml() {
        let yaml = r#"
urls:
  - http://192.168.100.23
delay: 10
verify_ssl: false
"#;
        let file = create_temp_config(yaml, ".yaml");
        let args = load_args(file.path()).unwrap();
        assert_eq!(args.urls, Some(vec!["http://192.168.100.23".to_string()]));
        assert_eq!(args.delay, Some(10.0));
        assert_eq!(args.verify_ssl, Some(false));
    }

    #[test]
    fn load_args_reads_rulebook_sources() {
        let yaml = r#"
sources:
  - custom_url_check:
      urls:
        - http://192.168.100.23
      delay: 60
      verify_ssl: true
"#;
        let file = create_temp_config(yaml, ".yml");
        let config = PollConfiguration::from_args(load_args(file.path()).unwrap()).unwrap();
        assert_eq!(config.urls, vec!["http://192.168.100.23"]);
        assert_eq!(config.delay, Duration::from_secs(60));
        assert!(config.verify_ssl);
    }

    #[test]
    fn load_args_rejects_empty_rulebook_sources() {
        let file = create_temp_config("sources: []\n", ".yaml");
        assert!(load_args(file.path()).is_err());
    }

    #[test]
    fn load_args_reads_toml() {
        let content = r#"
urls = ["https://example.com"]
delay = 15
timeout = 2.5
"#;
        let file = create_temp_config(content, ".toml");
        let args = load_args(file.path()).unwrap();
        assert_eq!(args.urls, Some(vec!["https://example.com".to_string()]));
        assert_eq!(args.delay, Some(15.0));
        assert_eq!(args.timeout, Some(2.5));
        assert_eq!(args.verify_ssl, None);
    }

    #[test]
    fn load_args_reports_missing_file() {
        let err = load_args(Path::new("/nonexistent/poller.yaml")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
