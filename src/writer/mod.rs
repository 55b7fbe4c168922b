//! Serializers for everything the tool writes back out.
pub mod png;

use anyhow::Result;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::model::{GinkaConfig, TowerData};

/// Header line `data.js` is re-emitted with.
pub const DATA_HEADER: &str = "var data_a1e2fb4a_e986_4524_b0da_9b7ba7c0874d = \n";

/// JSON with 4-space indentation.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(String::from_utf8(out)?)
}

pub fn data_script(data: &TowerData) -> Result<String> {
    Ok(format!("{DATA_HEADER}{}", to_pretty_json(data)?))
}

pub fn config_json(config: &GinkaConfig) -> Result<String> {
    to_pretty_json(config)
}
