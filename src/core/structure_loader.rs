// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::config::{ConfigError, GrowthConfig, VolumeConfig};
use crate::math::constants::{Float, Vector3f};

#[derive(Debug)]
pub enum StructureLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
    Invalid(ConfigError),
}

impl From<std::io::Error> for StructureLoadError {
    fn from(err: std::io::Error) -> Self {
        StructureLoadError::Io(err)
    }
}

impl From<ConfigError> for StructureLoadError {
    fn from(err: ConfigError) -> Self {
        StructureLoadError::Invalid(err)
    }
}

impl fmt::Display for StructureLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureLoadError::Io(e) => write!(f, "failed to read structure file: {}", e),
            StructureLoadError::Parse(msg) => write!(f, "failed to parse structure file: {}", msg),
            StructureLoadError::MissingField(name) => write!(f, "structure file is missing `{}`", name),
            StructureLoadError::Invalid(e) => write!(f, "invalid structure: {}", e),
        }
    }
}

impl std::error::Error for StructureLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StructureLoadError::Io(e) => Some(e),
            StructureLoadError::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

pub fn load_structure<P: AsRef<Path>>(path: P) -> Result<GrowthConfig, StructureLoadError> {
    let path = path.as_ref();
    log::info!("Loading vessel structure from: {}.", path.display());
    let xml = fs::read_to_string(path)?;
    parse_structure(&xml)
}

/// Parse a `<vessel>` structure description. Values may reference `<default>` entries as `$name`.
pub fn parse_structure(xml: &str) -> Result<GrowthConfig, StructureLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut defaults: HashMap<String, String> = HashMap::new();
    let mut in_vessel = false;

    let mut volume: Option<VolumeConfig> = None;
    let mut start_mm: Option<Vector3f> = None;
    let mut direction: Option<Vector3f> = None;
    let mut floats: HashMap<String, Float> = HashMap::new();
    let mut partial_volume: Option<bool> = None;
    let mut seed: Option<u64> = None;
    let mut max_generations: Option<u32> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"vessel" {
                    in_vessel = true;
                } else if in_vessel {
                    let attrs = collect_attributes(&e, &defaults)?;
                    match e.name().as_ref() {
                        b"default" => {
                            if let (Some(k), Some(v)) = (attrs.get("name"), attrs.get("value")) {
                                defaults.insert(k.clone(), v.clone());
                            }
                        }
                        b"volume" => {
                            let spacing = parse_float(required(&attrs, "spacing_mm")?)?;
                            let extent = [
                                parse_usize(required(&attrs, "x")?)?,
                                parse_usize(required(&attrs, "y")?)?,
                                parse_usize(required(&attrs, "z")?)?,
                            ];
                            volume = Some(VolumeConfig::new(spacing, extent));
                        }
                        b"point" | b"vector" => {
                            let name = required(&attrs, "name")?;
                            let v = parse_vec3_attrs(&attrs)?;
                            match name {
                                "start_mm" => start_mm = Some(v),
                                "direction" => direction = Some(v),
                                other => log::warn!("Ignoring unknown vector `{}`.", other),
                            }
                        }
                        b"float" => {
                            let name = required(&attrs, "name")?;
                            let value = parse_float(required(&attrs, "value")?)?;
                            floats.insert(name.to_string(), value);
                        }
                        b"boolean" => {
                            let name = required(&attrs, "name")?;
                            let value = parse_bool(required(&attrs, "value")?)?;
                            match name {
                                "partial_volume" => partial_volume = Some(value),
                                other => log::warn!("Ignoring unknown boolean `{}`.", other),
                            }
                        }
                        b"integer" => {
                            let name = required(&attrs, "name")?;
                            let value = required(&attrs, "value")?;
                            match name {
                                "seed" => seed = Some(parse_u64(value)?),
                                "max_generations" => max_generations = Some(parse_u32(value)?),
                                other => log::warn!("Ignoring unknown integer `{}`.", other),
                            }
                        }
                        other => {
                            log::warn!("Ignoring unknown element <{}>.", String::from_utf8_lossy(other));
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"vessel" {
                    in_vessel = false;
                }
            }
            Ok(_) => {}
            Err(e) => {
                return Err(StructureLoadError::Parse(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
        buf.clear();
    }

    let volume = volume.ok_or(StructureLoadError::MissingField("volume"))?;
    let start_mm = start_mm.ok_or(StructureLoadError::MissingField("start_mm"))?;
    let direction = direction.ok_or(StructureLoadError::MissingField("direction"))?;

    let mut config = GrowthConfig::new(start_mm, direction, volume);
    for (name, value) in floats {
        match name.as_str() {
            "radius_mm" => config.radius_mm = value,
            "curvature_factor" => config.curvature_factor = value,
            "radius_variation_factor" => config.radius_variation_factor = value,
            "bifurcation_length_mm" => config.bifurcation_length_mm = value,
            other => log::warn!("Ignoring unknown float `{}`.", other),
        }
    }
    if let Some(partial_volume) = partial_volume {
        config.partial_volume = partial_volume;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if let Some(max_generations) = max_generations {
        config.max_generations = max_generations;
    }

    config.validate()?;
    Ok(config)
}

fn collect_attributes(e: &BytesStart, defaults: &HashMap<String, String>) -> Result<HashMap<String, String>, StructureLoadError> {
    let mut out = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| StructureLoadError::Parse(format!("bad attribute `{}`: {}", key, err)))?;
        out.insert(key, resolve_value(&value, defaults));
    }
    Ok(out)
}

fn required<'a>(attrs: &'a HashMap<String, String>, key: &'static str) -> Result<&'a str, StructureLoadError> {
    attrs.get(key).map(|s| s.as_str()).ok_or(StructureLoadError::MissingField(key))
}

// Longer names go first so `$radius` is never split by a shorter `$r`.
fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut names: Vec<&String> = defaults.keys().collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut out = raw.to_string();
    for name in names {
        out = out.replace(&format!("${}", name), &defaults[name]);
    }
    out
}

fn parse_float(value: &str) -> Result<Float, StructureLoadError> {
    value.trim().parse::<Float>().map_err(|_| StructureLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_u64(value: &str) -> Result<u64, StructureLoadError> {
    value.trim().parse::<u64>().map_err(|_| StructureLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_u32(value: &str) -> Result<u32, StructureLoadError> {
    value.trim().parse::<u32>().map_err(|_| StructureLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_usize(value: &str) -> Result<usize, StructureLoadError> {
    value.trim().parse::<usize>().map_err(|_| StructureLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_bool(value: &str) -> Result<bool, StructureLoadError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(StructureLoadError::Parse(format!("invalid boolean: {}", other))),
    }
}

fn parse_vec3(value: &str) -> Result<Vector3f, StructureLoadError> {
    let mut parts = value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty());
    let x = parts.next().ok_or_else(|| StructureLoadError::Parse("invalid vec3".to_string()))?;
    let y = parts.next().ok_or_else(|| StructureLoadError::Parse("invalid vec3".to_string()))?;
    let z = parts.next().ok_or_else(|| StructureLoadError::Parse("invalid vec3".to_string()))?;
    Ok(Vector3f::new(parse_float(x)?, parse_float(y)?, parse_float(z)?))
}

// Accepts either `value="x, y, z"` or separate `x`, `y`, `z` attributes.
fn parse_vec3_attrs(attrs: &HashMap<String, String>) -> Result<Vector3f, StructureLoadError> {
    if let Some(value) = attrs.get("value") {
        return parse_vec3(value);
    }
    Ok(Vector3f::new(
        parse_float(required(attrs, "x")?)?,
        parse_float(required(attrs, "y")?)?,
        parse_float(required(attrs, "z")?)?,
    ))
}
