use std::str::FromStr;

use anyhow::{anyhow, bail, Context};

use climate_common::ThermostatMode;

/// Operator command read from stdin, one per line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Away(bool),
    Target { low: f32, high: Option<f32> },
    Mode(ThermostatMode),
    Reading(f32),
    Status,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            bail!("empty command");
        };
        let args: Vec<&str> = parts.collect();

        match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("away", [value]) => Ok(Self::Away(parse_switch(value)?)),
            ("target", [value]) => Ok(Self::Target {
                low: parse_temp(value)?,
                high: None,
            }),
            ("target", [low, high]) => Ok(Self::Target {
                low: parse_temp(low)?,
                high: Some(parse_temp(high)?),
            }),
            ("mode", [value]) => match value.to_ascii_uppercase().as_str() {
                "OFF" => Ok(Self::Mode(ThermostatMode::Off)),
                "AUTO" => Ok(Self::Mode(ThermostatMode::Auto)),
                _ => bail!("invalid mode '{value}', use 'off' or 'auto'"),
            },
            ("temp", [value]) => Ok(Self::Reading(parse_temp(value)?)),
            ("status", []) => Ok(Self::Status),
            (verb, _) => Err(anyhow!("unrecognized command '{verb}' with {} args", args.len())),
        }
    }
}

fn parse_switch(value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => bail!("expected on/off, got '{value}'"),
    }
}

fn parse_temp(value: &str) -> anyhow::Result<f32> {
    let temp = value
        .parse::<f32>()
        .with_context(|| format!("invalid temperature '{value}'"))?;
    if !temp.is_finite() {
        bail!("temperature must be finite, got '{value}'");
    }
    Ok(temp)
}
