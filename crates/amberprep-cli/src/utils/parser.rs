use phf::{Map, phf_map};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidSetFormat(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Unsupported configuration key for --set: '{0}'")]
    UnsupportedKey(String),
}

static WATER_MODELS: Map<&'static str, &'static str> = phf_map! {
    "opc" => "leaprc.water.opc",
    "spce" => "leaprc.water.spce",
    "tip4" => "leaprc.water.tip4pew",
    "tip4pew" => "leaprc.water.tip4pew",
    "tip3p" => "leaprc.water.tip3p",
};

/// Expands a short water-model alias to its leaprc; other names are passed through.
pub fn resolve_water_model(name: &str) -> String {
    WATER_MODELS
        .get(name.trim().to_ascii_lowercase().as_str())
        .map(|leaprc| leaprc.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Splits `KEY=VALUE` at the first `=`.
pub fn parse_key_value(pair: &str) -> Result<(&str, &str), ParseError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(ParseError::InvalidSetFormat(pair.to_string())),
    }
}

pub fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_model_aliases_expand_case_insensitively() {
        assert_eq!(resolve_water_model("opc"), "leaprc.water.opc");
        assert_eq!(resolve_water_model("SPCE"), "leaprc.water.spce");
        assert_eq!(resolve_water_model("tip4"), "leaprc.water.tip4pew");
        assert_eq!(resolve_water_model("tip3p"), "leaprc.water.tip3p");
    }

    #[test]
    fn unknown_water_model_is_passed_through() {
        assert_eq!(resolve_water_model("leaprc.water.fb3"), "leaprc.water.fb3");
    }

    #[test]
    fn key_value_splits_at_first_equals() {
        assert_eq!(
            parse_key_value("tools.tleap=/opt/amber/bin/tleap").unwrap(),
            ("tools.tleap", "/opt/amber/bin/tleap")
        );
        assert_eq!(parse_key_value("a=b=c").unwrap(), ("a", "b=c"));
    }

    #[test]
    fn key_value_requires_a_key_and_separator() {
        assert!(matches!(
            parse_key_value("solvent.distance"),
            Err(ParseError::InvalidSetFormat(_))
        ));
        assert!(matches!(
            parse_key_value("=12"),
            Err(ParseError::InvalidSetFormat(_))
        ));
    }

    #[test]
    fn parse_value_reports_key_and_value() {
        assert_eq!(parse_value::<f64>("solvent.distance", "10.5"), Ok(10.5));
        assert_eq!(
            parse_value::<u64>("simulation.coord-dump-freq", "often"),
            Err(ParseError::InvalidValue {
                key: "simulation.coord-dump-freq".into(),
                value: "often".into()
            })
        );
    }
}
