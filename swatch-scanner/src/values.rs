//! Value-level helpers: lengths, colors, keywords and the serialization
//! rules browsers use when reporting computed values.

use crate::error::ScanError;
use crate::style::TRANSPARENT;
use csscolorparser::Color;
use cssparser::{ParseError, Parser, ParserInput, Token};
use std::str::FromStr;

pub const ROOT_FONT_SIZE: f64 = 16.0;

/// Viewport used for `vw`/`vh` units and media queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

impl FromStr for Viewport {
    type Err = ScanError;

    /// Parses `WIDTHxHEIGHT`, e.g. `1440x900`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| ScanError::ParseError(format!("Invalid viewport '{}'", s)))?;

        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .ok()
                .filter(|n| *n > 0.0)
                .ok_or_else(|| ScanError::ParseError(format!("Invalid viewport '{}'", s)))
        };

        Ok(Self {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

/// What relative lengths resolve against.
#[derive(Debug, Clone, Copy)]
pub struct LengthContext {
    pub font_size: f64,
    pub viewport: Viewport,
    /// Base for percentages; `None` keeps them as specified.
    pub percent_base: Option<f64>,
}

impl LengthContext {
    pub fn new(font_size: f64, viewport: Viewport) -> Self {
        Self {
            font_size,
            viewport,
            percent_base: None,
        }
    }

    pub fn with_percent_base(mut self, base: f64) -> Self {
        self.percent_base = Some(base);
        self
    }
}

/// Formats a number with at most four decimals and no trailing zeros.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{:.4}", rounded);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn format_px(value: f64) -> String {
    format!("{}px", format_number(value))
}

/// Splits `12.5px` into `(12.5, "px")`.
pub fn split_dimension(value: &str) -> Option<(f64, &str)> {
    let value = value.trim();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in value.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !seen_digit {
        return None;
    }

    let number = value[..end].parse::<f64>().ok()?;
    Some((number, &value[end..]))
}

/// Resolves a length to pixels. Returns `None` for anything that is not a
/// plain dimension (keywords, `calc()`, percentages without a base).
pub fn resolve_length(value: &str, ctx: &LengthContext) -> Option<f64> {
    let (number, unit) = split_dimension(value)?;
    let unit = unit.to_ascii_lowercase();
    let vw = ctx.viewport.width / 100.0;
    let vh = ctx.viewport.height / 100.0;

    let px = match unit.as_str() {
        "" if number == 0.0 => 0.0,
        "px" => number,
        "em" => number * ctx.font_size,
        "rem" => number * ROOT_FONT_SIZE,
        "ex" | "ch" => number * ctx.font_size * 0.5,
        "pt" => number * 4.0 / 3.0,
        "pc" => number * 16.0,
        "in" => number * 96.0,
        "cm" => number * 96.0 / 2.54,
        "mm" => number * 96.0 / 25.4,
        "q" => number * 96.0 / 101.6,
        "vw" => number * vw,
        "vh" => number * vh,
        "vmin" => number * vw.min(vh),
        "vmax" => number * vw.max(vh),
        "%" => number * ctx.percent_base? / 100.0,
        _ => return None,
    };

    Some(px)
}

/// Computed form of a length-valued property: pixels when resolvable,
/// otherwise the specified value lowercased.
pub fn normalize_length(value: &str, ctx: &LengthContext) -> String {
    match resolve_length(value, ctx) {
        Some(px) => format_px(px),
        None => collapse_whitespace(&value.to_ascii_lowercase()),
    }
}

/// Absolute font-size keywords in pixels.
pub fn font_size_keyword(keyword: &str) -> Option<f64> {
    let px = match keyword {
        "xx-small" => 9.0,
        "x-small" => 10.0,
        "small" => 13.0,
        "medium" => 16.0,
        "large" => 18.0,
        "x-large" => 24.0,
        "xx-large" => 32.0,
        "xxx-large" => 48.0,
        _ => return None,
    };
    Some(px)
}

/// Resolves a `font-size` value against the parent's computed size.
pub fn compute_font_size(value: &str, parent: f64, viewport: Viewport) -> f64 {
    let value = value.trim().to_ascii_lowercase();
    if let Some(px) = font_size_keyword(&value) {
        return px;
    }
    match value.as_str() {
        "larger" => return parent * 1.2,
        "smaller" => return parent / 1.2,
        _ => {}
    }

    // em and % refer to the parent's size for font-size itself
    let ctx = LengthContext::new(parent, viewport).with_percent_base(parent);
    resolve_length(&value, &ctx)
        .filter(|px| *px >= 0.0)
        .unwrap_or(parent)
}

/// Resolves a `font-weight` value against the parent's computed weight.
pub fn compute_font_weight(value: &str, parent: u16) -> u16 {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" => 400,
        "bold" => 700,
        "bolder" => match parent {
            0..350 => 400,
            350..550 => 700,
            _ => 900,
        },
        "lighter" => match parent {
            0..550 => 100,
            550..750 => 400,
            _ => 700,
        },
        other => other
            .parse::<f64>()
            .ok()
            .filter(|w| (1.0..=1000.0).contains(w))
            .map(|w| w.round() as u16)
            .unwrap_or(parent),
    }
}

/// Resolves `line-height`; `normal` stays a keyword, everything else is
/// reported in pixels.
pub fn compute_line_height(value: &str, font_size: f64, viewport: Viewport) -> String {
    let value = value.trim().to_ascii_lowercase();
    if value == "normal" {
        return value;
    }
    if let Ok(factor) = value.parse::<f64>() {
        return format_px(factor * font_size);
    }
    let ctx = LengthContext::new(font_size, viewport).with_percent_base(font_size);
    normalize_length(&value, &ctx)
}

/// `letter-spacing` is `normal` or a length.
pub fn compute_letter_spacing(value: &str, font_size: f64, viewport: Viewport) -> String {
    let value = value.trim().to_ascii_lowercase();
    if value == "normal" {
        return value;
    }
    normalize_length(&value, &LengthContext::new(font_size, viewport))
}

pub fn format_color(rgba: [u8; 4]) -> String {
    let [r, g, b, a] = rgba;
    if a == 255 {
        format!("rgb({}, {}, {})", r, g, b)
    } else {
        let alpha = (f64::from(a) / 255.0 * 100.0).round() / 100.0;
        format!("rgba({}, {}, {}, {})", r, g, b, format_number(alpha))
    }
}

pub fn parse_color(value: &str) -> Option<[u8; 4]> {
    let value = value.trim();
    // csscolorparser also reads bare hex (`100`, `face`) as a color
    if !value.starts_with('#')
        && (!value.starts_with(|c: char| c.is_ascii_alphabetic())
            || value.chars().all(|c| c.is_ascii_hexdigit()))
    {
        return None;
    }
    let parsed: Color = value.parse().ok()?;
    Some(parsed.to_rgba8())
}

/// Computed color: `currentcolor` becomes `current`, anything the color
/// parser understands is serialized as `rgb()`/`rgba()`, the rest is kept.
pub fn normalize_color(value: &str, current: &str) -> String {
    let lowered = value.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "currentcolor" => current.to_string(),
        "transparent" => TRANSPARENT.to_string(),
        _ => parse_color(&lowered)
            .map(format_color)
            .unwrap_or_else(|| collapse_whitespace(&lowered)),
    }
}

pub fn is_color(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    lowered == "currentcolor" || lowered == "transparent" || parse_color(&lowered).is_some()
}

/// CSS shorthand serialization of four sides (top, right, bottom, left) or
/// four corners (top-left, top-right, bottom-right, bottom-left).
pub fn minimize_sides(sides: [&str; 4]) -> String {
    let [top, right, bottom, left] = sides;
    if right != left {
        format!("{} {} {} {}", top, right, bottom, left)
    } else if top != bottom {
        format!("{} {} {}", top, right, bottom)
    } else if top != right {
        format!("{} {}", top, right)
    } else {
        top.to_string()
    }
}

/// Expands 1-4 shorthand values to four sides.
pub fn expand_sides(values: &[&str]) -> Option<[String; 4]> {
    let sides = match values {
        [all] => [*all; 4],
        [vertical, horizontal] => [*vertical, *horizontal, *vertical, *horizontal],
        [top, horizontal, bottom] => [*top, *horizontal, *bottom, *horizontal],
        [top, right, bottom, left] => [*top, *right, *bottom, *left],
        _ => return None,
    };
    Some(sides.map(str::to_string))
}

/// Splits a value on top-level commas (`,`), semicolons (`;`) or
/// whitespace (` `). Separators inside functions, blocks and strings do not
/// count.
pub fn split_top_level(value: &str, separator: char) -> Vec<&str> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let mut parts = Vec::new();
    let mut start = parser.position();

    loop {
        let before = parser.position();
        let Ok(token) = parser.next_including_whitespace_and_comments().cloned() else {
            break;
        };
        let is_separator = match token {
            Token::Comma => separator == ',',
            Token::Semicolon => separator == ';',
            Token::WhiteSpace(_) => separator == ' ',
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                let _ = parser.parse_nested_block(|_| Ok::<_, ParseError<()>>(()));
                false
            }
            _ => false,
        };
        if is_separator {
            parts.push(parser.slice(start..before));
            start = parser.position();
        }
    }
    parts.push(parser.slice_from(start));

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rewrites every color inside a value (gradients, mostly) to its computed
/// form, with browser-style `, ` separators.
pub fn normalize_embedded_colors(value: &str, current: &str) -> String {
    split_top_level(value, ',')
        .into_iter()
        .map(|part| {
            split_top_level(part, ' ')
                .into_iter()
                .map(|token| normalize_component(token, current))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn normalize_component(token: &str, current: &str) -> String {
    if is_color(token) {
        return normalize_color(token, current);
    }
    match token.find('(') {
        Some(open) if token.ends_with(')') && !token[..open].eq_ignore_ascii_case("url") => {
            let name = token[..open].to_ascii_lowercase();
            let inner = &token[open + 1..token.len() - 1];
            format!("{}({})", name, normalize_embedded_colors(inner, current))
        }
        _ => token.to_string(),
    }
}

/// Serializes `box-shadow` as browsers report it: color first, four
/// lengths in pixels, `inset` last.
pub fn normalize_box_shadow(value: &str, ctx: &LengthContext, current: &str) -> String {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") {
        return "none".to_string();
    }

    split_top_level(value, ',')
        .into_iter()
        .map(|layer| {
            let mut color = None;
            let mut lengths = Vec::new();
            let mut inset = false;

            for token in split_top_level(layer, ' ') {
                if token.eq_ignore_ascii_case("inset") {
                    inset = true;
                } else if is_color(token) {
                    color = Some(normalize_color(token, current));
                } else {
                    lengths.push(normalize_length(token, ctx));
                }
            }
            while lengths.len() < 4 {
                lengths.push("0px".to_string());
            }

            let mut parts = vec![color.unwrap_or_else(|| current.to_string())];
            parts.extend(lengths);
            if inset {
                parts.push("inset".to_string());
            }
            parts.join(" ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}
