// Theme aggregation over sampled element styles

use crate::tally::{OrderedCounter, OrderedSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use swatch_scanner::style::TRANSPARENT;
use swatch_scanner::{ComputedStyle, ElementSample, StyleProperty};
use tracing::debug;

/// Caps applied when a report is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeLimits {
    pub typography: usize,
    pub spacing: usize,
    pub radii: usize,
    pub borders: usize,
    /// Characters of trimmed text kept as a typography sample.
    pub sample_length: usize,
}

impl Default for ThemeLimits {
    fn default() -> Self {
        Self {
            typography: 20,
            spacing: 20,
            radii: 10,
            borders: 15,
            sample_length: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographySample {
    pub font_size: String,
    pub font_weight: String,
    pub line_height: String,
    pub letter_spacing: String,
    pub tag: String,
    pub sample: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpacingEntry {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiusEntry {
    pub radius: String,
    pub count: usize,
}

/// The extracted theme. Field order is the serialized key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeReport {
    pub typography: Vec<TypographySample>,
    pub spacing: Vec<SpacingEntry>,
    pub gradients: Vec<String>,
    pub shadows: Vec<String>,
    pub borders: Vec<String>,
    pub radii: Vec<RadiusEntry>,
    pub colors: Vec<String>,
}

impl ThemeReport {
    pub fn is_empty(&self) -> bool {
        self.typography.is_empty()
            && self.spacing.is_empty()
            && self.gradients.is_empty()
            && self.shadows.is_empty()
            && self.borders.is_empty()
            && self.radii.is_empty()
            && self.colors.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum Aggregate {
    Spacing,
    Gradients,
    Shadows,
    Radii,
    Colors,
}

struct PropertyCheck {
    property: StyleProperty,
    accepts: fn(&str) -> bool,
    into: Aggregate,
}

fn is_spacing(value: &str) -> bool {
    !value.is_empty() && value != "0px" && value != "normal"
}

fn is_gradient(value: &str) -> bool {
    value != "none" && value.contains("gradient")
}

fn is_shadow(value: &str) -> bool {
    value != "none"
}

fn is_rounded(value: &str) -> bool {
    value != "0px"
}

fn is_visible_color(value: &str) -> bool {
    !value.is_empty() && value != TRANSPARENT
}

// Order within a category is the order values are first seen per element.
const PROPERTY_CHECKS: &[PropertyCheck] = &[
    PropertyCheck { property: StyleProperty::Padding, accepts: is_spacing, into: Aggregate::Spacing },
    PropertyCheck { property: StyleProperty::Margin, accepts: is_spacing, into: Aggregate::Spacing },
    PropertyCheck { property: StyleProperty::Gap, accepts: is_spacing, into: Aggregate::Spacing },
    PropertyCheck { property: StyleProperty::BackgroundImage, accepts: is_gradient, into: Aggregate::Gradients },
    PropertyCheck { property: StyleProperty::BoxShadow, accepts: is_shadow, into: Aggregate::Shadows },
    PropertyCheck { property: StyleProperty::BorderRadius, accepts: is_rounded, into: Aggregate::Radii },
    PropertyCheck { property: StyleProperty::Color, accepts: is_visible_color, into: Aggregate::Colors },
    PropertyCheck { property: StyleProperty::BackgroundColor, accepts: is_visible_color, into: Aggregate::Colors },
    PropertyCheck { property: StyleProperty::BorderColor, accepts: is_visible_color, into: Aggregate::Colors },
];

/// Single-pass accumulator for a [`ThemeReport`].
#[derive(Debug, Default)]
pub struct ThemeExtractor {
    limits: ThemeLimits,
    typography: Vec<TypographySample>,
    typography_keys: HashSet<String>,
    spacing: OrderedCounter,
    gradients: OrderedSet,
    shadows: OrderedSet,
    borders: OrderedSet,
    radii: OrderedCounter,
    colors: OrderedSet,
    observed: usize,
}

impl ThemeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ThemeLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Number of elements seen so far.
    pub fn observed(&self) -> usize {
        self.observed
    }

    pub fn observe(&mut self, tag: &str, text: &str, style: &ComputedStyle) {
        self.observed += 1;

        let key = format!(
            "{}|{}|{}|{}",
            style.font_size, style.font_weight, style.line_height, style.letter_spacing
        );
        if self.typography_keys.insert(key) {
            self.typography.push(TypographySample {
                font_size: style.font_size.clone(),
                font_weight: style.font_weight.clone(),
                line_height: style.line_height.clone(),
                letter_spacing: style.letter_spacing.clone(),
                tag: tag.to_string(),
                sample: text.trim().chars().take(self.limits.sample_length).collect(),
            });
        }

        if style.border_style != "none" && style.border_width != "0px" {
            self.borders.insert(&format!(
                "{} {} {} r:{}",
                style.border_width, style.border_style, style.border_color, style.border_radius
            ));
        }

        for check in PROPERTY_CHECKS {
            let value = style.get(check.property);
            if !(check.accepts)(value) {
                continue;
            }
            match check.into {
                Aggregate::Spacing => self.spacing.add(value),
                Aggregate::Radii => self.radii.add(value),
                Aggregate::Gradients => {
                    self.gradients.insert(value);
                }
                Aggregate::Shadows => {
                    self.shadows.insert(value);
                }
                Aggregate::Colors => {
                    self.colors.insert(value);
                }
            }
        }
    }

    pub fn observe_sample(&mut self, sample: &ElementSample) {
        self.observe(&sample.tag, &sample.text, &sample.style);
    }

    /// Ranks, deduplicates and truncates everything observed.
    pub fn finish(self) -> ThemeReport {
        let limits = self.limits;
        debug!(
            "Finishing theme over {} elements ({} font styles, {} spacing values, {} colors)",
            self.observed,
            self.typography.len(),
            self.spacing.len(),
            self.colors.len()
        );

        let mut typography = self.typography;
        typography.sort_by(|a, b| {
            font_size_rank(&b.font_size)
                .partial_cmp(&font_size_rank(&a.font_size))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        typography.truncate(limits.typography);

        let spacing = self
            .spacing
            .ranked(limits.spacing)
            .into_iter()
            .map(|(value, count)| SpacingEntry { value, count })
            .collect();

        let radii = self
            .radii
            .ranked(limits.radii)
            .into_iter()
            .map(|(radius, count)| RadiusEntry { radius, count })
            .collect();

        let mut borders = self.borders.into_vec();
        borders.truncate(limits.borders);

        ThemeReport {
            typography,
            spacing,
            gradients: self.gradients.into_vec(),
            shadows: self.shadows.into_vec(),
            borders,
            radii,
            colors: self.colors.into_vec(),
        }
    }
}

/// Runs one traversal over `elements` and finalizes the result.
pub fn extract_theme<'a>(elements: impl IntoIterator<Item = &'a ElementSample>) -> ThemeReport {
    extract_theme_with_limits(elements, ThemeLimits::default())
}

pub fn extract_theme_with_limits<'a>(
    elements: impl IntoIterator<Item = &'a ElementSample>,
    limits: ThemeLimits,
) -> ThemeReport {
    let mut extractor = ThemeExtractor::with_limits(limits);
    for element in elements {
        extractor.observe_sample(element);
    }
    extractor.finish()
}

// Sizes without a numeric prefix rank as zero.
fn font_size_rank(value: &str) -> f64 {
    parse_leading_float(value).unwrap_or(0.0)
}

/// Parses the longest numeric prefix of `value`, ignoring leading
/// whitespace. `"12.5px"` gives 12.5; `"px"` gives `None`.
pub fn parse_leading_float(value: &str) -> Option<f64> {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leading_float() {
        assert_eq!(parse_leading_float("16px"), Some(16.0));
        assert_eq!(parse_leading_float("  12.5px"), Some(12.5));
        assert_eq!(parse_leading_float(".5em"), Some(0.5));
        assert_eq!(parse_leading_float("-2px"), Some(-2.0));
        assert_eq!(parse_leading_float("1e2px"), Some(100.0));
        assert_eq!(parse_leading_float("3.px"), Some(3.0));
        assert_eq!(parse_leading_float("1em2"), Some(1.0));
        assert_eq!(parse_leading_float("px"), None);
        assert_eq!(parse_leading_float(""), None);
        assert_eq!(parse_leading_float("."), None);
    }

    #[test]
    fn test_default_limits() {
        let limits = ThemeLimits::default();
        assert_eq!(limits.typography, 20);
        assert_eq!(limits.spacing, 20);
        assert_eq!(limits.radii, 10);
        assert_eq!(limits.borders, 15);
        assert_eq!(limits.sample_length, 30);
    }

    #[test]
    fn test_property_checks() {
        assert!(!is_spacing(""));
        assert!(!is_spacing("0px"));
        assert!(!is_spacing("normal"));
        assert!(is_spacing("0px 8px"));

        assert!(is_gradient("linear-gradient(red, blue)"));
        assert!(!is_gradient("url(a.png)"));
        assert!(!is_gradient("none"));

        assert!(!is_visible_color(TRANSPARENT));
        assert!(is_visible_color("rgba(0, 0, 0, 0.5)"));
    }

    #[test]
    fn test_unparsable_font_size_sorts_last() {
        let mut extractor = ThemeExtractor::new();
        let mut odd = ComputedStyle::default();
        odd.font_size = "medium".to_string();
        let mut big = ComputedStyle::default();
        big.font_size = "20px".to_string();

        extractor.observe("SPAN", "", &odd);
        extractor.observe("H2", "", &big);

        let report = extractor.finish();
        assert_eq!(report.typography[0].font_size, "20px");
        assert_eq!(report.typography[1].font_size, "medium");
    }
}
