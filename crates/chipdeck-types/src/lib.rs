//! Shared types for chipdeck components.
//!
//! This crate provides the data model used across chipdeck-core, chipdeck-rpc
//! and chipdeck-tui: chip configuration, template results, inline markup
//! segments and the render model handed to hosts. All types are serializable
//! so they can travel over RPC or live in a config file.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deserialize any JSON scalar into a display string.
///
/// Template engines happily return numbers and booleans; the chip only ever
/// shows text, so everything is flattened here. `null` becomes empty.
fn deserialize_display_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Returns true when the text must be evaluated by the template backend.
///
/// Anything containing an opening brace is treated as a template; plain text
/// is displayed as-is and never subscribed.
#[must_use]
pub fn is_template(text: &str) -> bool {
    text.contains('{')
}

// ============================================================================
// Fields
// ============================================================================

/// The content fields of a chip that may carry a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipField {
    Primary,
    Secondary,
    MaxWidth,
    Icon,
    IconColor,
    IconBackground,
    BadgeIcon,
    BadgeColor,
    Picture,
}

impl ChipField {
    /// Every field, in declaration order.
    pub const ALL: [ChipField; 9] = [
        ChipField::Primary,
        ChipField::Secondary,
        ChipField::MaxWidth,
        ChipField::Icon,
        ChipField::IconColor,
        ChipField::IconBackground,
        ChipField::BadgeIcon,
        ChipField::BadgeColor,
        ChipField::Picture,
    ];

    /// Number of fields.
    pub const COUNT: usize = Self::ALL.len();

    /// Config key for this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ChipField::Primary => "primary",
            ChipField::Secondary => "secondary",
            ChipField::MaxWidth => "max_width",
            ChipField::Icon => "icon",
            ChipField::IconColor => "icon_color",
            ChipField::IconBackground => "icon_background",
            ChipField::BadgeIcon => "badge_icon",
            ChipField::BadgeColor => "badge_color",
            ChipField::Picture => "picture",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ChipField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChipField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChipField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Error returned when parsing an unknown field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown chip field: {}", self.0)
    }
}

impl std::error::Error for UnknownField {}

/// Fixed-size map from [`ChipField`] to an optional value.
///
/// One slot per field; there is no dynamic registry behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap<T> {
    slots: [Option<T>; ChipField::COUNT],
}

impl<T> Default for FieldMap<T> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl<T> FieldMap<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, field: ChipField) -> Option<&T> {
        self.slots[field.index()].as_ref()
    }

    pub fn get_mut(&mut self, field: ChipField) -> Option<&mut T> {
        self.slots[field.index()].as_mut()
    }

    /// Store a value, returning the one it replaced.
    pub fn insert(&mut self, field: ChipField, value: T) -> Option<T> {
        self.slots[field.index()].replace(value)
    }

    pub fn remove(&mut self, field: ChipField) -> Option<T> {
        self.slots[field.index()].take()
    }

    #[must_use]
    pub fn contains(&self, field: ChipField) -> bool {
        self.slots[field.index()].is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// Iterate occupied slots in field order.
    pub fn iter(&self) -> impl Iterator<Item = (ChipField, &T)> {
        ChipField::ALL
            .into_iter()
            .zip(self.slots.iter())
            .filter_map(|(field, slot)| slot.as_ref().map(|value| (field, value)))
    }

    /// Fields that currently hold a value.
    pub fn fields(&self) -> impl Iterator<Item = ChipField> + '_ {
        self.iter().map(|(field, _)| field)
    }
}

impl<T> FromIterator<(ChipField, T)> for FieldMap<T> {
    fn from_iter<I: IntoIterator<Item = (ChipField, T)>>(iter: I) -> Self {
        let mut map = Self::default();
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Action bound to a tap, hold or double tap on the chip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ActionConfig {
    /// Explicitly do nothing
    None,
    /// Toggle the bound entity
    Toggle,
    /// Open the entity's detail dialog
    MoreInfo,
    /// Navigate to another dashboard view
    Navigate { navigation_path: String },
    /// Open an external URL
    Url { url_path: String },
    /// Call a backend action (`call-service` is the legacy spelling)
    #[serde(alias = "call-service")]
    PerformAction {
        #[serde(alias = "service")]
        perform_action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<serde_json::Value>,
    },
    /// Open the voice assistant
    Assist,
}

impl ActionConfig {
    /// True for every action except [`ActionConfig::None`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, ActionConfig::None)
    }
}

impl fmt::Display for ActionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionConfig::None => f.write_str("none"),
            ActionConfig::Toggle => f.write_str("toggle"),
            ActionConfig::MoreInfo => f.write_str("more-info"),
            ActionConfig::Navigate { navigation_path } => write!(f, "navigate {navigation_path}"),
            ActionConfig::Url { url_path } => write!(f, "url {url_path}"),
            ActionConfig::PerformAction { perform_action, .. } => {
                write!(f, "perform-action {perform_action}")
            }
            ActionConfig::Assist => f.write_str("assist"),
        }
    }
}

/// Which gesture triggered an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Tap,
    Hold,
    DoubleTap,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionKind::Tap => "tap",
            ActionKind::Hold => "hold",
            ActionKind::DoubleTap => "double_tap",
        }
    }
}

/// Configuration of a single template chip.
///
/// Each textual field holds either literal text or a template (see
/// [`is_template`]). Keys follow the dashboard's snake_case convention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChipConfig {
    /// Entity the templates are bound to (e.g. `light.kitchen`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    /// Width cap as a CSS-like length (`"120px"`, `"12"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap_action: Option<ActionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_action: Option<ActionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_tap_action: Option<ActionConfig>,
}

impl ChipConfig {
    /// Configured text of a field, template or literal.
    #[must_use]
    pub fn field(&self, field: ChipField) -> Option<&str> {
        match field {
            ChipField::Primary => self.primary.as_deref(),
            ChipField::Secondary => self.secondary.as_deref(),
            ChipField::MaxWidth => self.max_width.as_deref(),
            ChipField::Icon => self.icon.as_deref(),
            ChipField::IconColor => self.icon_color.as_deref(),
            ChipField::IconBackground => self.icon_background.as_deref(),
            ChipField::BadgeIcon => self.badge_icon.as_deref(),
            ChipField::BadgeColor => self.badge_color.as_deref(),
            ChipField::Picture => self.picture.as_deref(),
        }
    }

    pub fn set_field(&mut self, field: ChipField, value: Option<String>) {
        let slot = match field {
            ChipField::Primary => &mut self.primary,
            ChipField::Secondary => &mut self.secondary,
            ChipField::MaxWidth => &mut self.max_width,
            ChipField::Icon => &mut self.icon,
            ChipField::IconColor => &mut self.icon_color,
            ChipField::IconBackground => &mut self.icon_background,
            ChipField::BadgeIcon => &mut self.badge_icon,
            ChipField::BadgeColor => &mut self.badge_color,
            ChipField::Picture => &mut self.picture,
        };
        *slot = value;
    }

    /// Builder-style variant of [`ChipConfig::set_field`].
    #[must_use]
    pub fn with_field(mut self, field: ChipField, value: impl Into<String>) -> Self {
        self.set_field(field, Some(value.into()));
        self
    }

    /// Whether a field's configured text is a template.
    #[must_use]
    pub fn is_template(&self, field: ChipField) -> bool {
        self.field(field).is_some_and(is_template)
    }

    /// Fields whose configured text is a template.
    pub fn template_fields(&self) -> impl Iterator<Item = ChipField> + '_ {
        ChipField::ALL
            .into_iter()
            .filter(|field| self.is_template(*field))
    }

    /// Action bound to a gesture, if any.
    #[must_use]
    pub fn action(&self, kind: ActionKind) -> Option<&ActionConfig> {
        match kind {
            ActionKind::Tap => self.tap_action.as_ref(),
            ActionKind::Hold => self.hold_action.as_ref(),
            ActionKind::DoubleTap => self.double_tap_action.as_ref(),
        }
    }
}

/// The user the templates are rendered for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

// ============================================================================
// Template results
// ============================================================================

/// Which backend signals cause a template to be re-rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateListeners {
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub time: bool,
}

impl TemplateListeners {
    /// True when nothing will ever trigger a re-render.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.all && !self.time && self.domains.is_empty() && self.entities.is_empty()
    }
}

/// Last rendered value of a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateResult {
    #[serde(deserialize_with = "deserialize_display_string")]
    pub result: String,
    #[serde(default)]
    pub listeners: TemplateListeners,
}

impl TemplateResult {
    #[must_use]
    pub fn new(result: impl Into<String>, listeners: TemplateListeners) -> Self {
        Self {
            result: result.into(),
            listeners,
        }
    }

    /// Result standing in for a template that could not be subscribed: the
    /// raw configured text with nobody listening.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(text, TemplateListeners::default())
    }
}

// ============================================================================
// Render model
// ============================================================================

/// A piece of chip text: literal text or an inline icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text {
        text: String,
    },
    Icon {
        name: String,
        /// Tint for the glyph; `None` uses the theme default
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
}

impl Segment {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    #[must_use]
    pub fn icon(name: impl Into<String>, color: Option<String>) -> Self {
        Segment::Icon {
            name: name.into(),
            color,
        }
    }
}

/// Badge drawn over the chip icon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeView {
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Fully resolved chip, ready for a host to draw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<BadgeView>,
    #[serde(default)]
    pub primary: Vec<Segment>,
    #[serde(default)]
    pub secondary: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<String>,
    #[serde(default)]
    pub clickable: bool,
}

impl ChipView {
    /// True when the chip has neither text nor any kind of icon.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
            && self.secondary.is_empty()
            && self.icon.is_none()
            && self.picture.is_none()
    }
}


/// Property-based tests using proptest for serialization round-trips.
#[cfg(test)]
mod proptest_roundtrip_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_text() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[a-zA-Z0-9_:#{}()' .-]{0,40}").unwrap()
    }

    fn arb_opt_text() -> impl Strategy<Value = Option<String>> {
        proptest::option::of(arb_text())
    }

    fn arb_action() -> impl Strategy<Value = ActionConfig> {
        prop_oneof![
            Just(ActionConfig::None),
            Just(ActionConfig::Toggle),
            Just(ActionConfig::MoreInfo),
            Just(ActionConfig::Assist),
            arb_text().prop_map(|navigation_path| ActionConfig::Navigate { navigation_path }),
            arb_text().prop_map(|url_path| ActionConfig::Url { url_path }),
        ]
    }

    prop_compose! {
        fn arb_chip_config()(
            entity in arb_opt_text(),
            texts in proptest::collection::vec(arb_opt_text(), ChipField::COUNT),
            tap_action in proptest::option::of(arb_action()),
            hold_action in proptest::option::of(arb_action()),
        ) -> ChipConfig {
            let mut config = ChipConfig {
                entity,
                tap_action,
                hold_action,
                ..Default::default()
            };
            for (field, text) in ChipField::ALL.into_iter().zip(texts) {
                config.set_field(field, text);
            }
            config
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chip_config_roundtrip(config in arb_chip_config()) {
            let json = serde_json::to_string(&config).unwrap();
            let parsed: ChipConfig = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(config, parsed);
        }

        #[test]
        fn template_detection_matches_brace(text in arb_text()) {
            let config = ChipConfig::default().with_field(ChipField::Primary, text.clone());
            prop_assert_eq!(config.is_template(ChipField::Primary), text.contains('{'));
        }
    }
}
