//! Configuration loading and validation.
//!
//! Reads every section through [`ConfigPort`] into an [`EngineConfig`]. Missing
//! keys take their defaults; present but malformed values are rejected.

use crate::domain::config::{
    BalanceConfig, DataConfig, DataSource, EngineConfig, Interval, PipelineConfig,
};
use crate::domain::error::CoinsignalError;
use crate::domain::indicator_row::IndicatorConfig;
use crate::domain::phase::PhaseSchedule;
use crate::domain::scoring::WeightProfile;
use crate::domain::signal::{Rule, RuleThresholds};
use crate::domain::trade::{BreakoutConfig, ScoreBasedConfig, StrategyKind, TradeConfig};
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;
use std::str::FromStr;

pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, CoinsignalError> {
    let indicators = build_indicator_config(config)?;
    let thresholds = build_thresholds(config)?;
    let profile = build_profile(config)?;
    let trade = build_trade_config(config)?;
    let phases = build_phase_schedule(config)?;
    let pipeline = build_pipeline_config(config)?;
    let balance = build_balance_config(config)?;
    let data = build_data_config(config)?;

    Ok(EngineConfig {
        indicators,
        thresholds,
        profile,
        trade,
        phases,
        pipeline,
        balance,
        data,
    })
}

fn parse_key<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, CoinsignalError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            CoinsignalError::config_invalid(section, key, format!("cannot parse '{}'", raw.trim()))
        }),
    }
}

fn window(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, CoinsignalError> {
    let value = parse_key::<usize>(config, section, key)?.unwrap_or(default);
    if value == 0 {
        return Err(CoinsignalError::config_invalid(
            section,
            key,
            "must be a positive integer",
        ));
    }
    Ok(value)
}

fn positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, CoinsignalError> {
    let value = parse_key::<f64>(config, section, key)?.unwrap_or(default);
    if !value.is_finite() || value <= 0.0 {
        return Err(CoinsignalError::config_invalid(section, key, "must be positive"));
    }
    Ok(value)
}

fn in_range(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
    low: f64,
    high: f64,
) -> Result<f64, CoinsignalError> {
    let value = parse_key::<f64>(config, section, key)?.unwrap_or(default);
    if !(low..=high).contains(&value) {
        return Err(CoinsignalError::config_invalid(
            section,
            key,
            format!("must be between {} and {}", low, high),
        ));
    }
    Ok(value)
}

fn float_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<f64>>, CoinsignalError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>().map_err(|_| {
                CoinsignalError::config_invalid(section, key, format!("cannot parse '{}'", s))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn build_indicator_config(config: &dyn ConfigPort) -> Result<IndicatorConfig, CoinsignalError> {
    let d = IndicatorConfig::default();
    let s = "indicators";
    let bb_stddev = positive(config, s, "bb_stddev", d.bb_stddev_mult_x100 as f64 / 100.0)?;

    let built = IndicatorConfig {
        rsi_period: window(config, s, "rsi_period", d.rsi_period)?,
        macd_fast: window(config, s, "macd_fast", d.macd_fast)?,
        macd_slow: window(config, s, "macd_slow", d.macd_slow)?,
        macd_signal: window(config, s, "macd_signal", d.macd_signal)?,
        bb_period: window(config, s, "bb_period", d.bb_period)?,
        bb_stddev_mult_x100: (bb_stddev * 100.0).round() as u32,
        sma_short: window(config, s, "sma_short", d.sma_short)?,
        sma_long: window(config, s, "sma_long", d.sma_long)?,
        ema_short: window(config, s, "ema_short", d.ema_short)?,
        ema_long: window(config, s, "ema_long", d.ema_long)?,
        stoch_k: window(config, s, "stoch_k", d.stoch_k)?,
        stoch_d: window(config, s, "stoch_d", d.stoch_d)?,
        volatility_period: window(config, s, "volatility_period", d.volatility_period)?,
        donchian_period: window(config, s, "donchian_period", d.donchian_period)?,
        atr_period: window(config, s, "atr_period", d.atr_period)?,
        adx_period: window(config, s, "adx_period", d.adx_period)?,
    };

    if built.macd_fast >= built.macd_slow {
        return Err(CoinsignalError::config_invalid(
            s,
            "macd_fast",
            "macd_fast must be shorter than macd_slow",
        ));
    }
    if built.sma_short >= built.sma_long {
        return Err(CoinsignalError::config_invalid(
            s,
            "sma_short",
            "sma_short must be shorter than sma_long",
        ));
    }
    Ok(built)
}

fn build_thresholds(config: &dyn ConfigPort) -> Result<RuleThresholds, CoinsignalError> {
    let d = RuleThresholds::default();
    let s = "signals";
    let t = RuleThresholds {
        rsi_oversold: in_range(config, s, "rsi_oversold", d.rsi_oversold, 0.0, 100.0)?,
        rsi_overbought: in_range(config, s, "rsi_overbought", d.rsi_overbought, 0.0, 100.0)?,
        stoch_oversold: in_range(config, s, "stoch_oversold", d.stoch_oversold, 0.0, 100.0)?,
        stoch_overbought: in_range(config, s, "stoch_overbought", d.stoch_overbought, 0.0, 100.0)?,
        trend_threshold: in_range(config, s, "trend_threshold", d.trend_threshold, 0.0, 1.0)?,
    };
    if t.rsi_oversold >= t.rsi_overbought {
        return Err(CoinsignalError::config_invalid(
            s,
            "rsi_oversold",
            "rsi_oversold must be below rsi_overbought",
        ));
    }
    if t.stoch_oversold >= t.stoch_overbought {
        return Err(CoinsignalError::config_invalid(
            s,
            "stoch_oversold",
            "stoch_oversold must be below stoch_overbought",
        ));
    }
    Ok(t)
}

/// `weights = rsi:0.5, macd:0.5` overrides the named `profile`.
fn build_profile(config: &dyn ConfigPort) -> Result<WeightProfile, CoinsignalError> {
    if let Some(raw) = config.get_string("signals", "weights").filter(|w| !w.trim().is_empty()) {
        let weights = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|pair| {
                let (rule, weight) = pair.split_once(':').ok_or_else(|| {
                    CoinsignalError::config_invalid(
                        "signals",
                        "weights",
                        format!("expected rule:weight, got '{}'", pair),
                    )
                })?;
                let weight = weight.trim().parse::<f64>().map_err(|_| {
                    CoinsignalError::config_invalid(
                        "signals",
                        "weights",
                        format!("cannot parse weight '{}'", weight.trim()),
                    )
                })?;
                Ok((rule.parse::<Rule>()?, weight))
            })
            .collect::<Result<Vec<_>, CoinsignalError>>()?;
        return WeightProfile::new("custom", weights);
    }

    match config.get_string("signals", "profile") {
        Some(name) => WeightProfile::by_name(name.trim()),
        None => Ok(WeightProfile::full()),
    }
}

fn build_trade_config(config: &dyn ConfigPort) -> Result<TradeConfig, CoinsignalError> {
    let s = "trade";
    let strategy = parse_key::<StrategyKind>(config, s, "strategy")?.unwrap_or_default();

    let ds = ScoreBasedConfig::default();
    let score = ScoreBasedConfig {
        entry_offset: in_range(config, s, "entry_offset", ds.entry_offset, 0.0, 0.5)?,
        stop_offset: in_range(config, s, "stop_offset", ds.stop_offset, 0.0, 0.5)?,
        risk_reward_ratio: positive(config, s, "risk_reward_ratio", ds.risk_reward_ratio)?,
    };
    if score.stop_offset == 0.0 {
        return Err(CoinsignalError::config_invalid(s, "stop_offset", "must be positive"));
    }

    let db = BreakoutConfig::default();
    let breakout = BreakoutConfig {
        adx_threshold: in_range(config, s, "adx_threshold", db.adx_threshold, 0.0, 100.0)?,
        atr_multiplier_sl: positive(config, s, "atr_multiplier_sl", db.atr_multiplier_sl)?,
        atr_multiplier_tp: positive(config, s, "atr_multiplier_tp", db.atr_multiplier_tp)?,
        risk_fraction: in_range(config, s, "risk_fraction", db.risk_fraction, 0.0, 1.0)?,
        leverage: positive(config, s, "leverage", db.leverage)?,
    };
    if breakout.risk_fraction == 0.0 {
        return Err(CoinsignalError::config_invalid(s, "risk_fraction", "must be positive"));
    }

    Ok(TradeConfig {
        strategy,
        score,
        breakout,
    })
}

fn build_phase_schedule(config: &dyn ConfigPort) -> Result<PhaseSchedule, CoinsignalError> {
    let d = PhaseSchedule::default();
    let thresholds = float_list(config, "phase", "thresholds")?;
    let lot_factors = float_list(config, "phase", "lot_factors")?;
    match (thresholds, lot_factors) {
        (None, None) => Ok(d),
        (t, f) => PhaseSchedule::new(
            t.unwrap_or_else(|| d.thresholds().to_vec()),
            f.unwrap_or_else(|| d.lot_factors().to_vec()),
        ),
    }
}

fn build_pipeline_config(config: &dyn ConfigPort) -> Result<PipelineConfig, CoinsignalError> {
    let d = PipelineConfig::default();
    let s = "pipeline";
    let instruments = match config.get_string(s, "instruments") {
        Some(raw) => {
            let list = parse_instruments(&raw);
            if list.is_empty() {
                return Err(CoinsignalError::ConfigMissing {
                    section: s.to_string(),
                    key: "instruments".to_string(),
                });
            }
            list
        }
        None => d.instruments,
    };

    Ok(PipelineConfig {
        workers: window(config, s, "workers", d.workers)?,
        interval: parse_key::<Interval>(config, s, "interval")?.unwrap_or(d.interval),
        limit: window(config, s, "limit", d.limit)?,
        instruments,
        notify: config.get_bool(s, "notify", d.notify),
    })
}

/// Comma-separated, trimmed, upper-cased, duplicates dropped.
pub fn parse_instruments(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in raw.split(',').map(|s| s.trim().to_ascii_uppercase()) {
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

fn build_balance_config(config: &dyn ConfigPort) -> Result<BalanceConfig, CoinsignalError> {
    let d = BalanceConfig::default();
    let default_balance = parse_key::<f64>(config, "balance", "default_balance")?
        .unwrap_or(d.default_balance);
    if !default_balance.is_finite() || default_balance < 0.0 {
        return Err(CoinsignalError::config_invalid(
            "balance",
            "default_balance",
            "must be non-negative",
        ));
    }
    Ok(BalanceConfig {
        path: config
            .get_string("balance", "path")
            .map(PathBuf::from)
            .unwrap_or(d.path),
        default_balance,
    })
}

fn build_data_config(config: &dyn ConfigPort) -> Result<DataConfig, CoinsignalError> {
    let d = DataConfig::default();
    Ok(DataConfig {
        source: parse_key::<DataSource>(config, "data", "source")?.unwrap_or(d.source),
        dir: config.get_string("data", "dir").map(PathBuf::from).unwrap_or(d.dir),
        output_dir: config
            .get_string("data", "output_dir")
            .map(PathBuf::from)
            .unwrap_or(d.output_dir),
        api_key: config
            .get_string("data", "api_key")
            .filter(|k| !k.trim().is_empty()),
    })
}
