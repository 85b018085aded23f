//! The cascade: matches rules against each element, picks winning
//! declarations and turns them into computed values.

use crate::css::{Declaration, Origin, Specificity, Stylesheet, parse_declarations};
use crate::snapshot::ElementSample;
use crate::style::{BLACK, ComputedStyle};
use crate::values::{
    LengthContext, ROOT_FONT_SIZE, Viewport, compute_font_size, compute_font_weight,
    compute_letter_spacing, compute_line_height, format_px, minimize_sides, normalize_box_shadow,
    normalize_color, normalize_embedded_colors, normalize_length,
};
use scraper::{ElementRef, Html};
use selectors::matching::SelectorCaches;
use std::collections::HashMap;
use tracing::debug;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Built-in defaults, roughly what browsers ship.
pub const USER_AGENT_CSS: &str = r#"
body { margin: 8px }
h1 { font-size: 2em; margin: 0.67em 0; font-weight: bold }
h2 { font-size: 1.5em; margin: 0.83em 0; font-weight: bold }
h3 { font-size: 1.17em; margin: 1em 0; font-weight: bold }
h4 { margin: 1.33em 0; font-weight: bold }
h5 { font-size: 0.83em; margin: 1.67em 0; font-weight: bold }
h6 { font-size: 0.67em; margin: 2.33em 0; font-weight: bold }
p, ul, ol, dl, pre { margin: 1em 0 }
blockquote, figure { margin: 1em 40px }
ul, ol, menu { padding: 0 0 0 40px }
dd { margin: 0 0 0 40px }
b, strong, th { font-weight: bold }
small { font-size: smaller }
big { font-size: larger }
pre, code, kbd, samp, tt { font-size: 13px }
a[href] { color: #0000ee }
mark { background-color: yellow; color: black }
hr { border: 1px inset gray; margin: 0.5em auto }
fieldset { margin: 0 2px; padding: 0.35em 0.75em 0.625em; border: 2px groove #c0c0c0 }
input, textarea, select { font-size: 13.3333px; padding: 1px 2px; border: 2px inset #767676 }
button { font-size: 13.3333px; padding: 1px 6px; border: 2px outset #767676; background-color: #efefef }
td, th { padding: 1px }
"#;

struct Longhand {
    name: &'static str,
    inherited: bool,
    initial: &'static str,
}

const fn longhand(name: &'static str, inherited: bool, initial: &'static str) -> Longhand {
    Longhand {
        name,
        inherited,
        initial,
    }
}

// font-size comes first and color second: later values depend on both
const LONGHANDS: &[Longhand] = &[
    longhand("font-size", true, "medium"),
    longhand("color", true, BLACK),
    longhand("font-weight", true, "normal"),
    longhand("line-height", true, "normal"),
    longhand("letter-spacing", true, "normal"),
    longhand("background-color", false, "transparent"),
    longhand("background-image", false, "none"),
    longhand("box-shadow", false, "none"),
    longhand("padding-top", false, "0"),
    longhand("padding-right", false, "0"),
    longhand("padding-bottom", false, "0"),
    longhand("padding-left", false, "0"),
    longhand("margin-top", false, "0"),
    longhand("margin-right", false, "0"),
    longhand("margin-bottom", false, "0"),
    longhand("margin-left", false, "0"),
    longhand("row-gap", false, "normal"),
    longhand("column-gap", false, "normal"),
    longhand("border-top-style", false, "none"),
    longhand("border-right-style", false, "none"),
    longhand("border-bottom-style", false, "none"),
    longhand("border-left-style", false, "none"),
    longhand("border-top-width", false, "medium"),
    longhand("border-right-width", false, "medium"),
    longhand("border-bottom-width", false, "medium"),
    longhand("border-left-width", false, "medium"),
    longhand("border-top-color", false, "currentcolor"),
    longhand("border-right-color", false, "currentcolor"),
    longhand("border-bottom-color", false, "currentcolor"),
    longhand("border-left-color", false, "currentcolor"),
    longhand("border-top-left-radius", false, "0"),
    longhand("border-top-right-radius", false, "0"),
    longhand("border-bottom-right-radius", false, "0"),
    longhand("border-bottom-left-radius", false, "0"),
];

/// Computed longhands of one element, kept so children can inherit.
#[derive(Debug, Clone)]
struct Computed {
    values: HashMap<&'static str, String>,
    font_size: f64,
    font_weight: u16,
    /// Unitless line heights are inherited as the factor, not the pixels
    line_height_factor: Option<f64>,
}

impl Computed {
    fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or_default()
    }

    fn sides(&self, prefix: &str, suffix: &str) -> String {
        let [top, right, bottom, left] = ["top", "right", "bottom", "left"]
            .map(|side| self.get(&format!("{}-{}{}", prefix, side, suffix)).to_string());
        minimize_sides([&top, &right, &bottom, &left])
    }

    fn to_style(&self) -> ComputedStyle {
        let radius = ["top-left", "top-right", "bottom-right", "bottom-left"]
            .map(|corner| self.get(&format!("border-{}-radius", corner)).to_string());

        let row_gap = self.get("row-gap");
        let column_gap = self.get("column-gap");
        let gap = if row_gap == column_gap {
            row_gap.to_string()
        } else {
            format!("{} {}", row_gap, column_gap)
        };

        ComputedStyle {
            font_size: self.get("font-size").to_string(),
            font_weight: self.get("font-weight").to_string(),
            line_height: self.get("line-height").to_string(),
            letter_spacing: self.get("letter-spacing").to_string(),
            background_image: self.get("background-image").to_string(),
            box_shadow: self.get("box-shadow").to_string(),
            border_style: self.sides("border", "-style"),
            border_width: self.sides("border", "-width"),
            border_color: self.sides("border", "-color"),
            border_radius: minimize_sides([&radius[0], &radius[1], &radius[2], &radius[3]]),
            padding: self.sides("padding", ""),
            margin: self.sides("margin", ""),
            gap,
            color: self.get("color").to_string(),
            background_color: self.get("background-color").to_string(),
        }
    }
}

/// Sort key deciding which declaration wins; larger wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CascadeKey {
    layer: u8,
    specificity: Specificity,
    sheet: usize,
    rule: usize,
    position: usize,
}

fn cascade_layer(origin: Origin, important: bool) -> u8 {
    match (important, origin) {
        (false, Origin::UserAgent) => 0,
        (false, Origin::Author) => 1,
        (false, Origin::Inline) => 2,
        (true, Origin::Author) => 3,
        (true, Origin::Inline) => 4,
        (true, Origin::UserAgent) => 5,
    }
}

pub struct StyleResolver {
    sheets: Vec<Stylesheet>,
    viewport: Viewport,
}

impl StyleResolver {
    /// A resolver holding only the built-in user-agent sheet.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            sheets: vec![Stylesheet::parse(USER_AGENT_CSS, Origin::UserAgent, viewport)],
            viewport,
        }
    }

    /// Appends an author stylesheet; later sheets win ties.
    pub fn add_stylesheet(&mut self, css: &str) {
        self.sheets
            .push(Stylesheet::parse(css, Origin::Author, self.viewport));
    }

    pub fn with_stylesheets<'a>(viewport: Viewport, sheets: impl IntoIterator<Item = &'a str>) -> Self {
        let mut resolver = Self::new(viewport);
        for css in sheets {
            resolver.add_stylesheet(css);
        }
        resolver
    }

    pub fn rule_count(&self) -> usize {
        self.sheets.iter().map(Stylesheet::len).sum()
    }

    /// Resolves every element of `html`, in document order.
    pub fn sample(&self, html: &str) -> Vec<ElementSample> {
        let document = Html::parse_document(html);
        self.sample_document(&document)
    }

    pub fn sample_document(&self, document: &Html) -> Vec<ElementSample> {
        let mut computed = HashMap::new();
        let mut samples = Vec::new();
        let mut caches = SelectorCaches::default();

        for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
            let parent = element
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(|p| computed.get(&p.id()));

            let resolved = self.compute(element, parent, &mut caches);
            samples.push(ElementSample {
                tag: tag_name(&element),
                text: element.text().collect(),
                style: resolved.to_style(),
            });
            computed.insert(element.id(), resolved);
        }

        debug!("Resolved styles for {} elements", samples.len());
        samples
    }

    /// Winning specified value per longhand.
    fn cascade(&self, element: ElementRef, caches: &mut SelectorCaches) -> HashMap<String, String> {
        let mut matched: Vec<(CascadeKey, &Declaration)> = Vec::new();

        for (sheet_index, sheet) in self.sheets.iter().enumerate() {
            for (rule_index, rule) in sheet.rules.iter().enumerate() {
                if !rule.matches(&element, caches) {
                    continue;
                }
                for (position, declaration) in rule.declarations.iter().enumerate() {
                    let key = CascadeKey {
                        layer: cascade_layer(sheet.origin, declaration.important),
                        specificity: rule.specificity,
                        sheet: sheet_index,
                        rule: rule_index,
                        position,
                    };
                    matched.push((key, declaration));
                }
            }
        }

        let inline = element
            .value()
            .attr("style")
            .map(parse_declarations)
            .unwrap_or_default();
        for (position, declaration) in inline.iter().enumerate() {
            let key = CascadeKey {
                layer: cascade_layer(Origin::Inline, declaration.important),
                specificity: Specificity::default(),
                sheet: self.sheets.len(),
                rule: 0,
                position,
            };
            matched.push((key, declaration));
        }

        matched.sort_by_key(|(key, _)| *key);

        let mut specified = HashMap::new();
        for (_, declaration) in matched {
            specified.insert(declaration.property.clone(), declaration.value.clone());
        }
        specified
    }

    fn compute(
        &self,
        element: ElementRef,
        parent: Option<&Computed>,
        caches: &mut SelectorCaches,
    ) -> Computed {
        let specified = self.cascade(element, caches);

        let mut computed = Computed {
            values: HashMap::new(),
            font_size: parent.map(|p| p.font_size).unwrap_or(ROOT_FONT_SIZE),
            font_weight: parent.map(|p| p.font_weight).unwrap_or(400),
            line_height_factor: None,
        };

        for longhand in LONGHANDS {
            let specified_value = specified.get(longhand.name).map(String::as_str);
            let keyword = specified_value.map(str::to_ascii_lowercase);
            let inherit = match keyword.as_deref() {
                Some("inherit") => true,
                Some("unset" | "revert") | None => longhand.inherited,
                _ => false,
            };

            if inherit && let Some(parent) = parent {
                self.inherit_from(longhand.name, parent, &mut computed);
                continue;
            }

            let raw = match (specified_value, keyword.as_deref()) {
                (_, Some("inherit" | "initial" | "unset" | "revert")) | (None, _) => longhand.initial,
                (Some(value), _) => value,
            };
            self.compute_longhand(longhand.name, raw, parent, &mut computed);
        }

        // A side without a visible style has no width
        for side in ["top", "right", "bottom", "left"] {
            let style = computed.get(&format!("border-{}-style", side)).to_string();
            if style == "none" || style == "hidden" {
                computed
                    .values
                    .insert(border_width_name(side), "0px".to_string());
            }
        }

        computed
    }

    fn inherit_from(&self, name: &'static str, parent: &Computed, computed: &mut Computed) {
        match name {
            "font-size" => computed.font_size = parent.font_size,
            "font-weight" => computed.font_weight = parent.font_weight,
            "line-height" => {
                if let Some(factor) = parent.line_height_factor {
                    computed.line_height_factor = Some(factor);
                    computed
                        .values
                        .insert(name, format_px(factor * computed.font_size));
                    return;
                }
            }
            _ => {}
        }
        computed.values.insert(name, parent.get(name).to_string());
    }

    fn compute_longhand(
        &self,
        name: &'static str,
        raw: &str,
        parent: Option<&Computed>,
        computed: &mut Computed,
    ) {
        let viewport = self.viewport;
        let parent_font_size = parent.map(|p| p.font_size).unwrap_or(ROOT_FONT_SIZE);
        let lengths = LengthContext::new(computed.font_size, viewport);

        let value = match name {
            "font-size" => {
                computed.font_size = compute_font_size(raw, parent_font_size, viewport);
                format_px(computed.font_size)
            }
            "font-weight" => {
                computed.font_weight = compute_font_weight(raw, computed.font_weight);
                computed.font_weight.to_string()
            }
            "line-height" => {
                computed.line_height_factor = raw.trim().parse::<f64>().ok();
                compute_line_height(raw, computed.font_size, viewport)
            }
            "letter-spacing" => compute_letter_spacing(raw, computed.font_size, viewport),
            "color" => {
                // currentcolor on `color` itself means the inherited color
                let inherited = parent.map(|p| p.get("color")).unwrap_or(BLACK);
                normalize_color(raw, inherited)
            }
            "background-image" => {
                if raw.trim().eq_ignore_ascii_case("none") {
                    "none".to_string()
                } else {
                    normalize_embedded_colors(raw, computed.get("color"))
                }
            }
            "box-shadow" => normalize_box_shadow(raw, &lengths, computed.get("color")),
            n if n.ends_with("-color") => normalize_color(raw, computed.get("color")),
            n if n.ends_with("-style") => raw.trim().to_ascii_lowercase(),
            n if n.starts_with("border-") && n.ends_with("-width") => {
                match raw.trim().to_ascii_lowercase().as_str() {
                    "thin" => "1px".to_string(),
                    "medium" => "3px".to_string(),
                    "thick" => "5px".to_string(),
                    other => normalize_length(other, &lengths),
                }
            }
            _ => normalize_length(raw, &lengths),
        };

        computed.values.insert(name, value);
    }
}

/// `tagName`: upper-cased for HTML elements, as written for SVG and MathML.
fn tag_name(element: &ElementRef) -> String {
    let name = &element.value().name;
    if &*name.ns == HTML_NAMESPACE {
        name.local.to_ascii_uppercase().to_string()
    } else {
        name.local.to_string()
    }
}

fn border_width_name(side: &str) -> &'static str {
    match side {
        "top" => "border-top-width",
        "right" => "border-right-width",
        "bottom" => "border-bottom-width",
        _ => "border-left-width",
    }
}
