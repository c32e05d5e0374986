//! Display preferences and the persisted `SavedMetric` unit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::series::{SeriesId, SeriesInfo};
use crate::error::InvalidInput;

pub const MIN_THICKNESS: u8 = 1;
pub const MAX_THICKNESS: u8 = 10;

/// Plotly's default first trace color.
pub const DEFAULT_COLOR: &str = "#1f77b4";
pub const DEFAULT_THICKNESS: u8 = 2;

/// Dash pattern for a chart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    LongDash,
    LongDashDot,
}

impl LineStyle {
    pub const ALL: [LineStyle; 6] = [
        LineStyle::Solid,
        LineStyle::Dash,
        LineStyle::Dot,
        LineStyle::DashDot,
        LineStyle::LongDash,
        LineStyle::LongDashDot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dash => "dash",
            LineStyle::Dot => "dot",
            LineStyle::DashDot => "dashdot",
            LineStyle::LongDash => "longdash",
            LineStyle::LongDashDot => "longdashdot",
        }
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineStyle {
    type Err = InvalidInput;

    /// Accepts the canonical names plus the menu labels ("Dashed", "Dash-Dot", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "solid" => Ok(LineStyle::Solid),
            "dash" | "dashed" => Ok(LineStyle::Dash),
            "dot" | "dotted" => Ok(LineStyle::Dot),
            "dashdot" => Ok(LineStyle::DashDot),
            "longdash" => Ok(LineStyle::LongDash),
            "longdashdot" => Ok(LineStyle::LongDashDot),
            _ => Err(InvalidInput::LineStyle(s.to_string())),
        }
    }
}

/// How one series is drawn. An empty `group` means ungrouped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPreference")]
pub struct DisplayPreference {
    pub color: String,
    pub line_style: LineStyle,
    pub thickness: u8,
    pub group: String,
}

/// Unchecked wire form, validated through `DisplayPreference::new`.
#[derive(Deserialize)]
struct RawPreference {
    color: String,
    #[serde(default)]
    line_style: LineStyle,
    thickness: u8,
    #[serde(default)]
    group: String,
}

impl TryFrom<RawPreference> for DisplayPreference {
    type Error = InvalidInput;

    fn try_from(raw: RawPreference) -> Result<Self, Self::Error> {
        DisplayPreference::new(&raw.color, raw.line_style, raw.thickness, &raw.group)
    }
}

impl Default for DisplayPreference {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            line_style: LineStyle::default(),
            thickness: DEFAULT_THICKNESS,
            group: String::new(),
        }
    }
}

impl DisplayPreference {
    /// Validated constructor; trims color and group.
    pub fn new(
        color: &str,
        line_style: LineStyle,
        thickness: u8,
        group: &str,
    ) -> Result<Self, InvalidInput> {
        let color = color.trim();
        if color.is_empty() {
            return Err(InvalidInput::EmptyColor);
        }
        if !(MIN_THICKNESS..=MAX_THICKNESS).contains(&thickness) {
            return Err(InvalidInput::Thickness(thickness));
        }
        Ok(Self {
            color: color.to_string(),
            line_style,
            thickness,
            group: group.trim().to_string(),
        })
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = group.trim().to_string();
        self
    }

    pub fn is_grouped(&self) -> bool {
        !self.group.is_empty()
    }
}

/// A tracked series and how to draw it. This is the unit the preference
/// store persists; fetched observations are never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMetric {
    pub series_id: SeriesId,
    pub preference: DisplayPreference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<SeriesInfo>,
}

impl SavedMetric {
    pub fn new(series_id: SeriesId, preference: DisplayPreference) -> Self {
        Self {
            series_id,
            preference,
            info: None,
        }
    }

    /// Provider title when known, otherwise the identifier.
    pub fn display_name(&self) -> &str {
        match self.info {
            Some(ref info) if !info.title.is_empty() => &info.title,
            _ => self.series_id.as_str(),
        }
    }

    pub fn group(&self) -> &str {
        &self.preference.group
    }
}
