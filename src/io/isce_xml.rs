use crate::types::{PrepError, PrepResult};
use chrono::NaiveDateTime;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::path::Path;

/// Timestamp layouts written by ISCE components
const ISCE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// A node of an ISCE component XML document.
///
/// ISCE dumps every configurable object as nested `<component name=..>`
/// elements holding `<property name=..><value>..</value></property>`
/// entries. Image descriptors (`*.xml` next to a raster) and product
/// files (`IW1.xml`, stripmapApp frame dumps) share this layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Component {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "property", default)]
    pub properties: Vec<Property>,
    #[serde(rename = "component", default)]
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Case- and separator-insensitive key used for property lookup
pub fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != ' ' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Parse an ISCE timestamp such as `2017-01-02 13:45:08.123456`
pub fn parse_isce_datetime(value: &str) -> PrepResult<NaiveDateTime> {
    let value = value.trim();
    for format in ISCE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    Err(PrepError::InvalidFormat(format!(
        "Could not parse ISCE time: {}",
        value
    )))
}

/// Parse a `[x, y, z]` list literal
pub fn parse_vector3(value: &str) -> PrepResult<[f64; 3]> {
    let inner = value
        .trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')']);
    let parts: Vec<f64> = inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>().map_err(|e| {
                PrepError::InvalidFormat(format!("Invalid vector element '{}': {}", s, e))
            })
        })
        .collect::<PrepResult<_>>()?;

    if parts.len() != 3 {
        return Err(PrepError::InvalidFormat(format!(
            "Expected 3 vector elements, found {} in '{}'",
            parts.len(),
            value
        )));
    }
    Ok([parts[0], parts[1], parts[2]])
}

impl Component {
    /// Parse a component tree from XML text
    pub fn parse(xml_content: &str) -> PrepResult<Component> {
        from_str::<Component>(xml_content)
            .map_err(|e| PrepError::XmlParsing(format!("Failed to parse ISCE XML: {}", e)))
    }

    /// Read and parse an ISCE XML file
    pub fn load<P: AsRef<Path>>(path: P) -> PrepResult<Component> {
        let path = path.as_ref();
        log::debug!("Loading ISCE XML: {}", path.display());
        if !path.is_file() {
            return Err(PrepError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            PrepError::XmlParsing(msg) => {
                PrepError::XmlParsing(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// The product object of a ProductManager dump.
    ///
    /// Wrapper elements hold no properties and a single component; they
    /// are skipped until the real product is reached.
    pub fn product_root(&self) -> &Component {
        let mut node = self;
        while node.properties.is_empty() && node.components.len() == 1 {
            node = &node.components[0];
        }
        node
    }

    /// Raw value of a property, `None` when absent or empty
    pub fn property(&self, name: &str) -> Option<&str> {
        let key = normalize_key(name);
        self.properties
            .iter()
            .find(|p| normalize_key(&p.name) == key)
            .and_then(|p| p.value.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// First present property among several aliases
    pub fn find_property(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.property(name))
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    pub fn get_str(&self, name: &str) -> PrepResult<&str> {
        self.property(name).ok_or_else(|| {
            PrepError::Metadata(format!(
                "Missing property '{}' in component '{}'",
                name, self.name
            ))
        })
    }

    pub fn get_f64(&self, name: &str) -> PrepResult<f64> {
        let value = self.get_str(name)?;
        value.parse::<f64>().map_err(|e| {
            PrepError::InvalidFormat(format!("Invalid number for '{}': {} ({})", name, value, e))
        })
    }

    /// Integer property; integral floats such as `71.0` are accepted
    pub fn get_i64(&self, name: &str) -> PrepResult<i64> {
        let value = self.get_str(name)?;
        if let Ok(v) = value.parse::<i64>() {
            return Ok(v);
        }
        match value.parse::<f64>() {
            Ok(v) if v.fract() == 0.0 => Ok(v as i64),
            _ => Err(PrepError::InvalidFormat(format!(
                "Invalid integer for '{}': {}",
                name, value
            ))),
        }
    }

    pub fn get_datetime(&self, name: &str) -> PrepResult<NaiveDateTime> {
        parse_isce_datetime(self.get_str(name)?)
    }

    pub fn get_vector3(&self, name: &str) -> PrepResult<[f64; 3]> {
        parse_vector3(self.get_str(name)?)
    }

    /// Direct child component by name
    pub fn child(&self, name: &str) -> Option<&Component> {
        let key = normalize_key(name);
        self.components.iter().find(|c| normalize_key(&c.name) == key)
    }

    /// Direct child component, or an error naming the parent
    pub fn require_child(&self, name: &str) -> PrepResult<&Component> {
        self.child(name).ok_or_else(|| {
            PrepError::Metadata(format!(
                "Missing component '{}' in component '{}'",
                name, self.name
            ))
        })
    }

    /// First component named `name` anywhere below this one (depth first)
    pub fn find_descendant(&self, name: &str) -> Option<&Component> {
        let key = normalize_key(name);
        self.descendants()
            .into_iter()
            .find(|c| normalize_key(&c.name) == key)
    }

    /// Every component below this one, in document order
    pub fn descendants(&self) -> Vec<&Component> {
        let mut out = Vec::new();
        for child in &self.components {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }
}
