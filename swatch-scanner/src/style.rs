use serde::{Deserialize, Serialize};

pub const TRANSPARENT: &str = "rgba(0, 0, 0, 0)";
pub const BLACK: &str = "rgb(0, 0, 0)";

/// Resolved style of one element, serialized the way a browser's
/// `getComputedStyle` reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputedStyle {
    pub font_size: String,
    pub font_weight: String,
    pub line_height: String,
    pub letter_spacing: String,
    pub background_image: String,
    pub box_shadow: String,
    pub border_style: String,
    pub border_width: String,
    pub border_color: String,
    pub border_radius: String,
    pub padding: String,
    pub margin: String,
    pub gap: String,
    pub color: String,
    pub background_color: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            font_size: "16px".to_string(),
            font_weight: "400".to_string(),
            line_height: "normal".to_string(),
            letter_spacing: "normal".to_string(),
            background_image: "none".to_string(),
            box_shadow: "none".to_string(),
            border_style: "none".to_string(),
            border_width: "0px".to_string(),
            border_color: BLACK.to_string(),
            border_radius: "0px".to_string(),
            padding: "0px".to_string(),
            margin: "0px".to_string(),
            gap: "normal".to_string(),
            color: BLACK.to_string(),
            background_color: TRANSPARENT.to_string(),
        }
    }
}

/// The properties sampled from each element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    FontSize,
    FontWeight,
    LineHeight,
    LetterSpacing,
    BackgroundImage,
    BoxShadow,
    BorderStyle,
    BorderWidth,
    BorderColor,
    BorderRadius,
    Padding,
    Margin,
    Gap,
    Color,
    BackgroundColor,
}

impl ComputedStyle {
    pub fn get(&self, property: StyleProperty) -> &str {
        match property {
            StyleProperty::FontSize => &self.font_size,
            StyleProperty::FontWeight => &self.font_weight,
            StyleProperty::LineHeight => &self.line_height,
            StyleProperty::LetterSpacing => &self.letter_spacing,
            StyleProperty::BackgroundImage => &self.background_image,
            StyleProperty::BoxShadow => &self.box_shadow,
            StyleProperty::BorderStyle => &self.border_style,
            StyleProperty::BorderWidth => &self.border_width,
            StyleProperty::BorderColor => &self.border_color,
            StyleProperty::BorderRadius => &self.border_radius,
            StyleProperty::Padding => &self.padding,
            StyleProperty::Margin => &self.margin,
            StyleProperty::Gap => &self.gap,
            StyleProperty::Color => &self.color,
            StyleProperty::BackgroundColor => &self.background_color,
        }
    }
}
