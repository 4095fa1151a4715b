use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SandpitError};

/// A single live setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SettingValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Number(n) => Some(*n),
            SettingValue::Text(s) => s.parse().ok(),
            SettingValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Number(n) => write!(f, "{n}"),
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Number(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        SettingValue::Number(value as f64)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

/// Selectable options of a setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Options {
    List(Vec<SettingValue>),
    Dictionary(IndexMap<String, SettingValue>),
}

impl Options {
    /// First selectable entry, used when nothing is selected
    pub fn first(&self) -> Option<&SettingValue> {
        match self {
            Options::List(items) => items.first(),
            Options::Dictionary(entries) => entries.values().next(),
        }
    }

    /// Finds the option a query value refers to.
    /// Dictionaries match by key before falling back to the value itself.
    pub fn select(&self, raw: &str) -> Option<&SettingValue> {
        match self {
            Options::List(items) => items.iter().find(|v| v.to_string() == raw),
            Options::Dictionary(entries) => entries
                .get(raw)
                .or_else(|| entries.values().find(|v| v.to_string() == raw)),
        }
    }

    /// (label, value) pairs in declaration order
    pub fn entries(&self) -> Vec<(String, &SettingValue)> {
        match self {
            Options::List(items) => items.iter().map(|v| (v.to_string(), v)).collect(),
            Options::Dictionary(entries) => entries.iter().map(|(k, v)| (k.clone(), v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Options::List(items) => items.len(),
            Options::Dictionary(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptorValue {
    Scalar(SettingValue),
    Options(Options),
}

fn default_editable() -> bool {
    true
}

/// Declares one setting: its initial value and how the panel presents it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingDescriptor {
    pub value: DescriptorValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default)]
    pub color: bool,
    #[serde(default = "default_editable")]
    pub editable: bool,
    /// Survives the panel's reset action
    #[serde(default)]
    pub sticky: bool,
}

impl SettingDescriptor {
    fn scalar(value: SettingValue) -> Self {
        Self {
            value: DescriptorValue::Scalar(value),
            min: None,
            max: None,
            step: None,
            color: false,
            editable: true,
            sticky: false,
        }
    }

    pub fn number(value: f64) -> Self {
        Self::scalar(SettingValue::Number(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::scalar(SettingValue::Bool(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::scalar(SettingValue::Text(value.into()))
    }

    /// A `#rrggbb` color edited with a color picker
    pub fn color(hex: impl Into<String>) -> Self {
        Self {
            color: true,
            ..Self::text(hex)
        }
    }

    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SettingValue>,
    {
        Self {
            value: DescriptorValue::Options(Options::List(items.into_iter().map(Into::into).collect())),
            ..Self::boolean(false)
        }
    }

    pub fn dictionary<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SettingValue>,
    {
        let entries = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self {
            value: DescriptorValue::Options(Options::Dictionary(entries)),
            ..Self::boolean(false)
        }
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    pub fn options(&self) -> Option<&Options> {
        match &self.value {
            DescriptorValue::Options(options) => Some(options),
            DescriptorValue::Scalar(_) => None,
        }
    }

    /// Value used when the query string does not mention this setting
    pub fn initial(&self) -> Option<SettingValue> {
        match &self.value {
            DescriptorValue::Scalar(value) => Some(value.clone()),
            DescriptorValue::Options(options) => options.first().cloned(),
        }
    }

    /// Turns a raw query value into a value for this setting.
    /// Returns `None` when an option setting has no matching entry, or when a
    /// color setting gets something other than a hex color.
    pub fn from_query(&self, raw: &str) -> Option<SettingValue> {
        match &self.value {
            DescriptorValue::Options(options) => options.select(raw).cloned(),
            DescriptorValue::Scalar(_) if self.color => {
                parse_hex_color(raw).map(|_| SettingValue::Text(raw.to_string()))
            }
            DescriptorValue::Scalar(initial) => Some(coerce(raw, initial)),
        }
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(SandpitError::descriptor(name, "name must not be empty"));
        }

        let scalar = match &self.value {
            DescriptorValue::Options(options) => {
                if options.is_empty() {
                    return Err(SandpitError::descriptor(name, "options must not be empty"));
                }
                None
            }
            DescriptorValue::Scalar(value) => Some(value),
        };

        let is_number = matches!(scalar, Some(SettingValue::Number(_)));
        for (field, bound) in [("min", self.min), ("max", self.max), ("step", self.step)] {
            if bound.is_some() && !is_number {
                return Err(SandpitError::descriptor(name, format!("`{field}` needs a numeric value")));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(SandpitError::descriptor(name, format!("min {min} is greater than max {max}")));
            }
        }
        if let Some(step) = self.step {
            if step <= 0.0 || !step.is_finite() {
                return Err(SandpitError::descriptor(name, format!("step {step} must be positive")));
            }
        }
        if self.color {
            let valid = scalar
                .and_then(SettingValue::as_str)
                .and_then(parse_hex_color)
                .is_some();
            if !valid {
                return Err(SandpitError::descriptor(name, "color settings need a `#rrggbb` value"));
            }
        }
        Ok(())
    }
}

/// Coerces a query string value using the setting's initial value as a type hint.
/// Only finite numbers become `Number`; `NaN` and `inf` stay text.
pub fn coerce(raw: &str, initial: &SettingValue) -> SettingValue {
    match raw {
        "true" => return SettingValue::Bool(true),
        "false" => return SettingValue::Bool(false),
        _ => {}
    }
    if let SettingValue::Number(_) = initial {
        if let Some(n) = raw.trim().parse::<f64>().ok().filter(|n| n.is_finite()) {
            return SettingValue::Number(n);
        }
    }
    SettingValue::Text(raw.to_string())
}

/// Parses `#rgb` or `#rrggbb`
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in digits.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 16 + v;
            }
            Some(rgb)
        }
        6 => {
            let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
            Some([channel(0)?, channel(2)?, channel(4)?])
        }
        _ => None,
    }
}

pub fn format_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Ordered set of setting declarations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingDescriptors(IndexMap<String, SettingDescriptor>);

impl SettingDescriptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, name: impl Into<String>, descriptor: SettingDescriptor) -> Self {
        self.0.insert(name.into(), descriptor);
        self
    }

    /// Reads `{"name": {"value": .., "min": ..}, ..}`
    pub fn from_json(json: &str) -> Result<Self> {
        let descriptors: Self = serde_json::from_str(json)?;
        descriptors.validate()?;
        Ok(descriptors)
    }

    pub fn validate(&self) -> Result<()> {
        self.0.iter().try_for_each(|(name, d)| d.validate(name))
    }

    pub fn get(&self, name: &str) -> Option<&SettingDescriptor> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SettingDescriptor)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds the live state. `overrides` holds query values keyed by setting name;
    /// unknown keys are ignored, unmatched options fall back to the first entry and
    /// malformed colors to the declared one.
    pub fn resolve(&self, overrides: Option<&IndexMap<String, String>>) -> Result<SettingsState> {
        self.validate()?;
        let mut values = IndexMap::with_capacity(self.0.len());
        for (name, descriptor) in &self.0 {
            let raw = overrides.and_then(|o| o.get(name));
            let from_query = raw.and_then(|raw| {
                let value = descriptor.from_query(raw);
                if value.is_none() {
                    tracing::warn!("`{raw}` is not a valid value for `{name}`, using the default");
                }
                value
            });
            let value = from_query
                .or_else(|| descriptor.initial())
                .ok_or_else(|| SandpitError::descriptor(name, "no initial value"))?;
            values.insert(name.clone(), value);
        }
        Ok(SettingsState(values))
    }
}

/// Current value of every declared setting.
/// Keys are fixed when the state is resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SettingsState(IndexMap<String, SettingValue>);

impl SettingsState {
    pub fn get(&self, name: &str) -> Option<&SettingValue> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SettingValue> {
        self.0.get_mut(name)
    }

    /// Overwrites an existing setting, returns false for unknown names
    pub fn set(&mut self, name: &str, value: SettingValue) -> bool {
        match self.0.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(SettingValue::as_f64)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(SettingValue::as_bool)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(SettingValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SettingValue)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multitouch() -> SettingDescriptors {
        SettingDescriptors::new()
            .add("demo", SettingDescriptor::text("multitouch").editable(false).sticky(true))
            .add("maxSize", SettingDescriptor::number(40.0).min(5.0).max(50.0).step(1.0))
            .add("force", SettingDescriptor::number(5.0).min(2.0).max(30.0).step(1.0))
            .add("blend", SettingDescriptor::list(["multiply", "lighter", "overlay"]))
    }

    fn query(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_resolve_without_query_uses_initial_values() {
        let descriptors = multitouch();
        let state = descriptors.resolve(None).unwrap();

        let keys: Vec<_> = state.keys().cloned().collect();
        assert_eq!(keys, vec!["demo", "maxSize", "force", "blend"]);
        assert_eq!(state.text("demo"), Some("multitouch"));
        assert_eq!(state.number("maxSize"), Some(40.0));
        assert_eq!(state.text("blend"), Some("multiply"));
    }

    #[test]
    fn test_dictionary_resolves_to_first_value() {
        let descriptors = SettingDescriptors::new().add(
            "speed",
            SettingDescriptor::dictionary([("slow", 0.5), ("fast", 2.0)]),
        );
        let state = descriptors.resolve(None).unwrap();
        assert_eq!(state.number("speed"), Some(0.5));

        let state = descriptors.resolve(Some(&query(&[("speed", "fast")]))).unwrap();
        assert_eq!(state.number("speed"), Some(2.0));

        // the serialized value selects as well as the key
        let state = descriptors.resolve(Some(&query(&[("speed", "2")]))).unwrap();
        assert_eq!(state.number("speed"), Some(2.0));
    }

    #[test]
    fn test_query_overrides_and_coerces() {
        let descriptors = multitouch().add("trails", SettingDescriptor::boolean(true));
        let overrides = query(&[("force", "12"), ("trails", "false"), ("blend", "overlay"), ("unknown", "1")]);
        let state = descriptors.resolve(Some(&overrides)).unwrap();

        assert_eq!(state.get("force"), Some(&SettingValue::Number(12.0)));
        assert_eq!(state.flag("trails"), Some(false));
        assert_eq!(state.text("blend"), Some("overlay"));
        assert!(state.get("unknown").is_none());
        assert_eq!(state.len(), descriptors.len());
    }

    #[test]
    fn test_unmatched_option_falls_back_to_first() {
        let state = multitouch()
            .resolve(Some(&query(&[("blend", "screen")])))
            .unwrap();
        assert_eq!(state.text("blend"), Some("multiply"));
    }

    #[test]
    fn test_non_numeric_query_stays_text() {
        let state = multitouch()
            .resolve(Some(&query(&[("force", "lots")])))
            .unwrap();
        assert_eq!(state.get("force"), Some(&SettingValue::Text("lots".into())));
    }

    #[test]
    fn test_non_finite_query_stays_text() {
        for raw in ["NaN", "inf", "-inf", "infinity"] {
            let state = multitouch()
                .resolve(Some(&query(&[("force", raw)])))
                .unwrap();
            assert_eq!(state.get("force"), Some(&SettingValue::Text(raw.into())), "{raw}");
        }
        assert_eq!(coerce(" 7.5 ", &SettingValue::Number(0.0)), SettingValue::Number(7.5));
    }

    #[test]
    fn test_malformed_color_query_falls_back() {
        let descriptors = multitouch().add("tint", SettingDescriptor::color("#ff4e50"));

        let state = descriptors.resolve(Some(&query(&[("tint", "blue")]))).unwrap();
        assert_eq!(state.text("tint"), Some("#ff4e50"));

        let state = descriptors.resolve(Some(&query(&[("tint", "#69d2e7")]))).unwrap();
        assert_eq!(state.text("tint"), Some("#69d2e7"));
    }

    #[test]
    fn test_validation_names_the_offending_setting() {
        let err = SettingDescriptors::new()
            .add("ok", SettingDescriptor::number(1.0))
            .add("broken", SettingDescriptor::number(1.0).min(10.0).max(2.0))
            .validate()
            .unwrap_err();
        assert!(matches!(err, SandpitError::InvalidSettingDescriptor { ref name, .. } if name == "broken"));

        let err = SettingDescriptor::text("a").min(1.0).validate("label").unwrap_err();
        assert!(matches!(err, SandpitError::InvalidSettingDescriptor { .. }));

        let empty: [&str; 0] = [];
        assert!(SettingDescriptor::list(empty).validate("blend").is_err());
        assert!(SettingDescriptor::number(1.0).step(0.0).validate("n").is_err());
        assert!(SettingDescriptor::color("red").validate("tint").is_err());
        assert!(SettingDescriptor::color("#f80").validate("tint").is_ok());
        assert!(SettingDescriptor::number(1.0).validate(" ").is_err());
    }

    #[test]
    fn test_from_json() {
        let json = r##"{
            "force": {"value": 5, "min": 2, "max": 30, "step": 1},
            "blend": {"value": ["multiply", "lighter", "overlay"]},
            "tint": {"value": "#69D2E7", "color": true},
            "mode": {"value": {"calm": 1, "wild": 10}},
            "demo": {"value": "multitouch", "editable": false, "sticky": true}
        }"##;
        let descriptors = SettingDescriptors::from_json(json).unwrap();
        assert_eq!(descriptors.len(), 5);

        let demo = descriptors.get("demo").unwrap();
        assert!(!demo.editable);
        assert!(demo.sticky);
        assert!(descriptors.get("tint").unwrap().color);

        let state = descriptors.resolve(None).unwrap();
        assert_eq!(state.number("force"), Some(5.0));
        assert_eq!(state.text("blend"), Some("multiply"));
        assert_eq!(state.number("mode"), Some(1.0));

        let err = SettingDescriptors::from_json(r#"{"force": {"value": 5, "min": 9, "max": 1}}"#);
        assert!(err.is_err());
        assert!(matches!(
            SettingDescriptors::from_json("not json"),
            Err(SandpitError::InvalidSettingsJson(_))
        ));
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(parse_hex_color("#69D2E7"), Some([0x69, 0xd2, 0xe7]));
        assert_eq!(parse_hex_color("#fff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("69d2e7"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(format_hex_color([0x69, 0xd2, 0xe7]), "#69d2e7");
    }

    #[test]
    fn test_set_never_adds_keys() {
        let mut state = multitouch().resolve(None).unwrap();
        assert!(state.set("force", SettingValue::Number(20.0)));
        assert!(!state.set("gravity", SettingValue::Number(1.0)));
        assert_eq!(state.number("force"), Some(20.0));
        assert_eq!(state.len(), 4);
    }
}
