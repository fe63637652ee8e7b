//! INI file configuration adapter.

use crate::domain::error::CoinsignalError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CoinsignalError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| CoinsignalError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, CoinsignalError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| CoinsignalError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config_validation::build_engine_config;
    use crate::domain::trade::StrategyKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[pipeline]
instruments = BTC, ETH, SOL
interval = 15m

[trade]
strategy = breakout
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("pipeline", "instruments"),
            Some("BTC, ETH, SOL".to_string())
        );
        assert_eq!(
            adapter.get_string("trade", "strategy"),
            Some("breakout".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[pipeline]\nworkers = 5\n").unwrap();
        assert_eq!(adapter.get_string("pipeline", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[pipeline]\nworkers = 8\nlimit = lots\n").unwrap();
        assert_eq!(adapter.get_int("pipeline", "workers", 0), 8);
        assert_eq!(adapter.get_int("pipeline", "limit", 100), 100);
        assert_eq!(adapter.get_int("pipeline", "missing", 42), 42);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter = FileConfigAdapter::from_string(
            "[balance]\ndefault_balance = 20000.5\n[trade]\nleverage = x\n",
        )
        .unwrap();
        assert_eq!(adapter.get_double("balance", "default_balance", 0.0), 20000.5);
        assert_eq!(adapter.get_double("trade", "leverage", 1.0), 1.0);
    }

    #[test]
    fn get_bool_values() {
        let adapter = FileConfigAdapter::from_string(
            "[pipeline]\na = true\nb = yes\nc = 0\nd = off\n",
        )
        .unwrap();
        assert!(adapter.get_bool("pipeline", "a", false));
        assert!(adapter.get_bool("pipeline", "b", false));
        assert!(!adapter.get_bool("pipeline", "c", true));
        assert!(!adapter.get_bool("pipeline", "d", true));
        assert!(adapter.get_bool("pipeline", "missing", true));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[balance]\npath = /tmp/balance.json\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("balance", "path"),
            Some("/tmp/balance.json".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        let Err(err) = result else {
            panic!("missing file should not load");
        };
        assert!(matches!(err, CoinsignalError::ConfigParse { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn full_file_builds_engine_config() {
        let content = r#"
[indicators]
rsi_period = 14
donchian_period = 30

[signals]
profile = light
trend_threshold = 0.25

[trade]
strategy = breakout
adx_threshold = 20
risk_fraction = 0.02

[phase]
thresholds = 25000, 40000, 50000
lot_factors = 1.0, 1.25, 1.5, 2.0

[pipeline]
workers = 3
instruments = BTC, ETH
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        let config = build_engine_config(&adapter).unwrap();
        assert_eq!(config.indicators.donchian_period, 30);
        assert_eq!(config.profile.name(), "light");
        assert_eq!(config.thresholds.trend_threshold, 0.25);
        assert_eq!(config.trade.strategy, StrategyKind::Breakout);
        assert_eq!(config.trade.breakout.adx_threshold, 20.0);
        assert_eq!(config.pipeline.workers, 3);
        assert_eq!(config.pipeline.instruments, vec!["BTC", "ETH"]);
    }
}
