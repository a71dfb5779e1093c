use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure loaded from persona_reflect.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub dispatch: DispatchConfig,
    pub calendar: CalendarConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    GeminiCli,
    OpenaiCompat,
}

impl Provider {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "gemini_cli" | "gemini" => Some(Provider::GeminiCli),
            "openai_compat" | "openai" => Some(Provider::OpenaiCompat),
            _ => None,
        }
    }
}

/// Which model runtime executes persona turns, and how
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub provider: Provider,
    pub model: String,
    /// Path to the `gemini` executable
    pub cli_path: String,
    /// Base URL of an OpenAI-compatible server
    pub endpoint: String,
    /// Name of the environment variable holding the API key (never the key itself)
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tool_rounds: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            provider: Provider::GeminiCli,
            model: crate::clients::gemini::DEFAULT_MODEL.to_string(),
            cli_path: "gemini".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.7,
            max_tool_rounds: 3,
        }
    }
}

impl RuntimeConfig {
    /// Resolve the API key through the configured variable name.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// Per-call deadlines for the fan-out and the synthesis stage
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub persona_timeout_ms: u64,
    pub synthesis_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            persona_timeout_ms: DEFAULT_TIMEOUT_MS,
            synthesis_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl DispatchConfig {
    pub fn persona_timeout(&self) -> Duration {
        Duration::from_millis(self.persona_timeout_ms)
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_millis(self.synthesis_timeout_ms)
    }
}

const DEFAULT_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub work_start_hour: u32,
    pub work_end_hour: u32,
    pub granularity_minutes: u32,
    pub timezone: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            work_start_hour: 9,
            work_end_hour: 18,
            granularity_minutes: 30,
            timezone: "UTC".to_string(),
        }
    }
}

impl CalendarConfig {
    pub fn work_hours(&self) -> (u32, u32) {
        (self.work_start_hour, self.work_end_hour)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "persona_reflect=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses PERSONA_REFLECT_CONFIG or falls back to "persona_reflect.toml", then the
    /// user config dir
    pub fn load() -> anyhow::Result<Self> {
        // 1) PREFLECT_ENV_FILE if set, 2) ./.env
        if let Ok(env_path) = std::env::var("PREFLECT_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }

        let mut config = match Self::config_path() {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                tracing::debug!("loading config from {}", path.display());
                Self::from_toml_str(&content)?
            }
            None => {
                tracing::warn!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PERSONA_REFLECT_CONFIG") {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from("persona_reflect.toml");
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("persona-reflect").join("config.toml"))
            .filter(|p| p.exists())
    }

    /// Apply `PREFLECT_*` overrides (env-first). Unparseable values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(
            get: &dyn Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            let raw = get(key)?;
            match raw.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("{}='{}' is not valid, ignoring", key, raw);
                    None
                }
            }
        }
        let get: &dyn Fn(&str) -> Option<String> = &get;

        if let Some(raw) = get("PREFLECT_PROVIDER") {
            match Provider::parse(&raw) {
                Some(provider) => self.runtime.provider = provider,
                None => tracing::warn!("Unknown provider '{}', keeping {:?}", raw, self.runtime.provider),
            }
        }
        if let Some(model) = get("PREFLECT_MODEL") {
            self.runtime.model = model;
        }
        if let Some(path) = get("PREFLECT_CLI_PATH") {
            self.runtime.cli_path = path;
        }
        if let Some(endpoint) = get("PREFLECT_ENDPOINT") {
            self.runtime.endpoint = endpoint;
        }
        if let Some(name) = get("PREFLECT_API_KEY_ENV") {
            self.runtime.api_key_env = name;
        }
        if let Some(t) = parsed(get, "PREFLECT_TEMPERATURE") {
            self.runtime.temperature = t;
        }
        if let Some(rounds) = parsed(get, "PREFLECT_MAX_TOOL_ROUNDS") {
            self.runtime.max_tool_rounds = rounds;
        }
        if let Some(ms) = parsed(get, "PREFLECT_PERSONA_TIMEOUT_MS") {
            self.dispatch.persona_timeout_ms = ms;
        }
        if let Some(ms) = parsed(get, "PREFLECT_SYNTHESIS_TIMEOUT_MS") {
            self.dispatch.synthesis_timeout_ms = ms;
        }
        if let Some(h) = parsed(get, "PREFLECT_WORK_START_HOUR") {
            self.calendar.work_start_hour = h;
        }
        if let Some(h) = parsed(get, "PREFLECT_WORK_END_HOUR") {
            self.calendar.work_end_hour = h;
        }
        if let Some(m) = parsed(get, "PREFLECT_SLOT_GRANULARITY_MINUTES") {
            self.calendar.granularity_minutes = m;
        }
        if let Some(tz) = get("PREFLECT_TIMEZONE") {
            self.calendar.timezone = tz;
        }
        if let Some(level) = get("PREFLECT_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Clamp out-of-range values with a warning; fail only on settings no runtime can use.
    pub fn validate(&mut self) -> anyhow::Result<()> {
        if !(0.0..=2.0).contains(&self.runtime.temperature) {
            tracing::warn!(
                "temperature {} outside 0.0..=2.0, clamping",
                self.runtime.temperature
            );
            self.runtime.temperature = self.runtime.temperature.clamp(0.0, 2.0);
        }

        if self.runtime.max_tool_rounds == 0 {
            self.runtime.max_tool_rounds = 1;
        } else if self.runtime.max_tool_rounds > 10 {
            tracing::warn!(
                "max_tool_rounds {} exceeds max 10, clamping to 10",
                self.runtime.max_tool_rounds
            );
            self.runtime.max_tool_rounds = 10;
        }

        for (name, ms) in [
            ("persona_timeout_ms", &mut self.dispatch.persona_timeout_ms),
            ("synthesis_timeout_ms", &mut self.dispatch.synthesis_timeout_ms),
        ] {
            if *ms == 0 {
                tracing::warn!("{} is 0, using {}", name, DEFAULT_TIMEOUT_MS);
                *ms = DEFAULT_TIMEOUT_MS;
            }
        }

        let cal = &mut self.calendar;
        if cal.work_end_hour > 24 || cal.work_start_hour >= cal.work_end_hour {
            tracing::warn!(
                "work hours {}..{} are not a valid range, using 9..18",
                cal.work_start_hour,
                cal.work_end_hour
            );
            cal.work_start_hour = 9;
            cal.work_end_hour = 18;
        }
        if cal.granularity_minutes == 0 {
            tracing::warn!("granularity_minutes is 0, using 30");
            cal.granularity_minutes = 30;
        }

        if self.runtime.model.trim().is_empty() {
            anyhow::bail!("runtime.model must not be empty");
        }
        match self.runtime.provider {
            Provider::GeminiCli if self.runtime.cli_path.trim().is_empty() => {
                anyhow::bail!("runtime.cli_path is required for the gemini_cli provider")
            }
            Provider::OpenaiCompat
                if !self.runtime.endpoint.starts_with("http://")
                    && !self.runtime.endpoint.starts_with("https://") =>
            {
                anyhow::bail!(
                    "runtime.endpoint '{}' must start with http:// or https://",
                    self.runtime.endpoint
                )
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [runtime]
            provider = "openai_compat"
            endpoint = "http://127.0.0.1:8080"

            [calendar]
            work_start_hour = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.runtime.provider, Provider::OpenaiCompat);
        assert_eq!(config.runtime.max_tool_rounds, 3);
        assert_eq!(config.calendar.work_hours(), (8, 18));
        assert_eq!(config.dispatch.persona_timeout(), Duration::from_secs(60));
        assert_eq!(config.logging.level, "persona_reflect=info");
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("PREFLECT_PROVIDER", "openai-compat"),
            ("PREFLECT_MODEL", "llama3"),
            ("PREFLECT_PERSONA_TIMEOUT_MS", "1500"),
            ("PREFLECT_WORK_END_HOUR", "17"),
            ("PREFLECT_TEMPERATURE", "warm"),
        ]));
        assert_eq!(config.runtime.provider, Provider::OpenaiCompat);
        assert_eq!(config.runtime.model, "llama3");
        assert_eq!(config.dispatch.persona_timeout_ms, 1500);
        assert_eq!(config.calendar.work_end_hour, 17);
        assert_eq!(config.runtime.temperature, 0.7);
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = Config::default();
        config.runtime.temperature = 3.5;
        config.runtime.max_tool_rounds = 50;
        config.dispatch.synthesis_timeout_ms = 0;
        config.calendar.work_start_hour = 19;
        config.calendar.granularity_minutes = 0;
        config.validate().unwrap();

        assert_eq!(config.runtime.temperature, 2.0);
        assert_eq!(config.runtime.max_tool_rounds, 10);
        assert_eq!(config.dispatch.synthesis_timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.calendar.work_hours(), (9, 18));
        assert_eq!(config.calendar.granularity_minutes, 30);
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.runtime.provider = Provider::OpenaiCompat;
        config.runtime.endpoint = "localhost:8080".to_string();
        assert!(config.validate().is_err());
    }
}
