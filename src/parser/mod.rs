use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::model::{FloorFile, FloorGrid, GinkaConfig, Icons, MapsEntry, TowerData};

/// Drops the first line of a legacy `var xxx = ` wrapped script.
///
/// A text without a newline has nothing left after the header.
pub fn strip_legacy_header(text: &str) -> &str {
    match text.find('\n') {
        Some(idx) => &text[idx + 1..],
        None => "",
    }
}

/// Parse a `.js` artifact whose first line is a variable assignment and
/// whose remainder is plain JSON.
pub fn parse_wrapped<T: DeserializeOwned>(text: &str) -> Result<T> {
    let body = strip_legacy_header(text);
    if body.trim().is_empty() {
        return Err(anyhow!("no JSON body after the header line"));
    }
    Ok(serde_json::from_str(body)?)
}

pub fn parse_data(text: &str) -> Result<TowerData> {
    parse_wrapped(text).with_context(|| "Parsing data.js")
}

pub fn parse_maps(text: &str) -> Result<BTreeMap<u32, MapsEntry>> {
    parse_wrapped(text).with_context(|| "Parsing maps.js")
}

/// Only sections mapping sprite names to plain indices are kept. Others
/// (the hero's walking frames, for one) are skipped.
pub fn parse_icons(text: &str) -> Result<Icons> {
    let sections: Map<String, Value> =
        parse_wrapped(text).with_context(|| "Parsing icons.js")?;

    let mut icons = Icons::new();
    for (name, section) in sections {
        match serde_json::from_value::<BTreeMap<String, u32>>(section) {
            Ok(entries) => {
                icons.insert(name, entries);
            }
            Err(e) => debug!("icons.js section `{name}` skipped: {e}"),
        }
    }
    Ok(icons)
}

pub fn parse_floor(text: &str) -> Result<FloorGrid> {
    let floor: FloorFile = parse_wrapped(text)?;
    Ok(floor.map)
}

/// `ginka-config.json` is plain JSON, no header line.
pub fn parse_config(text: &str) -> Result<GinkaConfig> {
    serde_json::from_str(text).with_context(|| "Parsing ginka-config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_line_is_discarded() {
        assert_eq!(strip_legacy_header("var x = \n{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_legacy_header("only a header"), "");
    }

    #[test]
    fn parses_data_and_keeps_unknown_fields() {
        let text = "var data_x = \n{\"main\": {\"floorIds\": [\"MT0\", \"MT1\"], \"title\": \"t\"}, \"firstData\": {}}";
        let data = parse_data(text).unwrap();
        assert_eq!(data.main.floor_ids, vec!["MT0", "MT1"]);
        assert!(data.main.tilesets.is_none());
        assert!(data.main.rest.contains_key("title"));
        assert!(data.rest.contains_key("firstData"));
    }

    #[test]
    fn parses_maps_with_numeric_keys() {
        let text = "var maps = \n{\"1\": {\"id\": \"yellowWall\", \"cls\": \"terrains\", \"canPass\": false}}";
        let maps = parse_maps(text).unwrap();
        assert_eq!(maps[&1].id, "yellowWall");
        assert_eq!(maps[&1].cls, "terrains");
    }

    #[test]
    fn parses_floor_grid() {
        let text = "main.floors.MT0=\n{\"floorId\": \"MT0\", \"map\": [[1, 2], [3, 4]]}";
        assert_eq!(parse_floor(text).unwrap(), vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn icons_skip_non_index_sections() {
        let text = "var icons_x = \n{\"hero\": {\"down\": {\"loc\": 0, \"stop\": 1, \"leftFoot\": 2}}, \"terrains\": {\"yellowWall\": 1}, \"enemys\": {\"bat\": 3}}";
        let icons = parse_icons(text).unwrap();
        assert!(!icons.contains_key("hero"));
        assert_eq!(icons["terrains"]["yellowWall"], 1);
        assert_eq!(icons["enemys"]["bat"], 3);
    }

    #[test]
    fn empty_body_is_an_error() {
        assert!(parse_icons("var icons = ").is_err());
    }
}
