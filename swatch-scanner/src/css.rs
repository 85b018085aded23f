//! Stylesheet parsing on top of `cssparser`: rules, declarations,
//! shorthand expansion and media queries. Selectors are parsed with the
//! `selectors` crate through scraper's selector implementation, which also
//! supplies their specificity.

use crate::values::{
    LengthContext, ROOT_FONT_SIZE, Viewport, collapse_whitespace, expand_sides,
    font_size_keyword, is_color, resolve_length, split_dimension, split_top_level,
};
use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser, Token,
    parse_important,
};
use scraper::ElementRef;
use scraper::selector::{Parser as SelectorParser, Simple};
use selectors::matching::{
    MatchingContext, MatchingForInvalidation, MatchingMode, NeedsSelectorFlags, QuirksMode,
    SelectorCaches, matches_selector,
};
use selectors::parser::{ParseRelative, Selector, SelectorList};
use tracing::debug;

/// Where a declaration comes from. Later variants win for normal
/// declarations; `!important` reverses the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    UserAgent,
    Author,
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// (ids, classes/attributes/pseudo-classes, types/pseudo-elements)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl From<u32> for Specificity {
    /// Unpacks the 10 bits per component layout `selectors` reports.
    fn from(packed: u32) -> Self {
        Self(packed >> 20, (packed >> 10) & 0x3ff, packed & 0x3ff)
    }
}

#[derive(Debug, Clone)]
pub struct StyleRule {
    pub selector: Selector<Simple>,
    pub specificity: Specificity,
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    pub fn matches(&self, element: &ElementRef, caches: &mut SelectorCaches) -> bool {
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            caches,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            MatchingForInvalidation::No,
        );
        matches_selector(&self.selector, 0, None, element, &mut context)
    }
}

#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub origin: Origin,
    pub rules: Vec<StyleRule>,
}

impl Stylesheet {
    /// Parses a stylesheet, keeping only the rules that apply at `viewport`.
    pub fn parse(css: &str, origin: Origin, viewport: Viewport) -> Self {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut rule_parser = RuleListParser { viewport };
        let rules = parse_rule_list(&mut parser, &mut rule_parser);

        debug!("Parsed {} rules ({:?} origin)", rules.len(), origin);
        Self { origin, rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn parse_rule_list<'i>(input: &mut Parser<'i, '_>, rule_parser: &mut RuleListParser) -> Vec<StyleRule> {
    let mut rules = Vec::new();
    for result in StyleSheetParser::new(input, rule_parser) {
        match result {
            Ok(parsed) => rules.extend(parsed),
            Err((e, source)) => debug!("Skipping rule '{}': {:?}", source.trim(), e.kind),
        }
    }
    rules
}

/// Top-level and nested rule lists. Each item expands to one rule per
/// selector in its list; group rules expand to their applicable contents.
struct RuleListParser {
    viewport: Viewport,
}

enum GroupPrelude {
    Media(String),
    Conditional,
}

impl<'i> AtRuleParser<'i> for RuleListParser {
    type Prelude = GroupPrelude;
    type AtRule = Vec<StyleRule>;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let mut prelude = String::new();
        write_components(input, &mut prelude, false)?;

        match name.to_ascii_lowercase().as_str() {
            "media" => Ok(GroupPrelude::Media(collapse_whitespace(&prelude))),
            "supports" | "layer" | "container" | "document" => Ok(GroupPrelude::Conditional),
            _ => Err(input.new_custom_error(())),
        }
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        if let GroupPrelude::Media(query) = &prelude
            && !media_matches(query, self.viewport)
        {
            debug!("Skipping @media {}", query);
            return Ok(Vec::new());
        }
        Ok(parse_rule_list(input, self))
    }
}

impl<'i> QualifiedRuleParser<'i> for RuleListParser {
    type Prelude = Vec<Selector<Simple>>;
    type QualifiedRule = Vec<StyleRule>;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        // One unsupported selector only drops itself, not its siblings
        let selectors = input.parse_comma_separated_ignoring_errors(parse_selector);
        if selectors.is_empty() {
            return Err(input.new_custom_error(()));
        }
        Ok(selectors)
    }

    fn parse_block<'t>(
        &mut self,
        selectors: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let declarations = parse_declaration_list(input);
        if declarations.is_empty() {
            return Ok(Vec::new());
        }

        Ok(selectors
            .into_iter()
            .map(|selector| StyleRule {
                specificity: Specificity::from(selector.specificity()),
                selector,
                declarations: declarations.clone(),
            })
            .collect())
    }
}

/// Parses one complex selector. `:link` and `:any-link` match elements with
/// an `href`; `:visited` never matches since there is no history.
fn parse_selector<'i>(input: &mut Parser<'i, '_>) -> Result<Selector<Simple>, ParseError<'i, ()>> {
    let mut text = String::new();
    write_components(input, &mut text, true)?;

    let mut selector_input = ParserInput::new(&text);
    let mut selector_parser = Parser::new(&mut selector_input);
    match SelectorList::parse(&SelectorParser, &mut selector_parser, ParseRelative::No) {
        Ok(list) => list
            .slice()
            .first()
            .cloned()
            .ok_or_else(|| input.new_custom_error(())),
        Err(e) => {
            debug!("Skipping selector '{}': {:?}", text.trim(), e.kind);
            Err(input.new_custom_error(()))
        }
    }
}

/// Copies the component values left in `input` to `out` without comments.
/// With `selector` set, `:link`/`:any-link` become `[href]` and `:visited`
/// is an error. Returns whether the value ended in `!important`.
fn write_components<'i>(
    input: &mut Parser<'i, '_>,
    out: &mut String,
    selector: bool,
) -> Result<bool, ParseError<'i, ()>> {
    let mut colons = 0;

    loop {
        let state = input.state();
        let Ok(token) = input.next_including_whitespace_and_comments().cloned() else {
            return Ok(false);
        };
        let source = input.slice_from(state.position());

        match &token {
            Token::Comment(_) if selector => {}
            Token::Comment(_) => out.push(' '),
            Token::Delim('!') => {
                input.reset(&state);
                if input.try_parse(parse_important).is_ok() && input.is_exhausted() {
                    return Ok(true);
                }
                input.reset(&state);
                input.next_including_whitespace_and_comments()?;
                out.push('!');
            }
            Token::Ident(name) if selector && colons == 1 => {
                if name.eq_ignore_ascii_case("visited") {
                    return Err(input.new_custom_error(()));
                }
                if name.eq_ignore_ascii_case("link") || name.eq_ignore_ascii_case("any-link") {
                    out.pop();
                    out.push_str("[href]");
                } else {
                    out.push_str(source);
                }
            }
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                out.push_str(source);
                input.parse_nested_block(|nested| write_components(nested, out, selector))?;
                out.push(match &token {
                    Token::SquareBracketBlock => ']',
                    Token::CurlyBracketBlock => '}',
                    _ => ')',
                });
            }
            _ => out.push_str(source),
        }

        colons = if token == Token::Colon { colons + 1 } else { 0 };
    }
}

/// Declarations of a rule block or `style` attribute, expanded to longhands.
/// Nested rules and at-rules inside the block are skipped.
struct DeclarationListParser;

impl<'i> DeclarationParser<'i> for DeclarationListParser {
    type Declaration = Vec<Declaration>;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _declaration_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let property = name.to_ascii_lowercase();
        if property.starts_with("--") {
            return Err(input.new_custom_error(()));
        }

        let mut raw = String::new();
        let important = write_components(input, &mut raw, false)?;
        let value = collapse_whitespace(&raw);
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }

        Ok(expand_shorthand(&property, &value)
            .into_iter()
            .map(|(property, value)| Declaration {
                property,
                value,
                important,
            })
            .collect())
    }
}

impl<'i> AtRuleParser<'i> for DeclarationListParser {
    type Prelude = ();
    type AtRule = Vec<Declaration>;
    type Error = ();
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser {
    type Prelude = ();
    type QualifiedRule = Vec<Declaration>;
    type Error = ();
}

impl<'i> RuleBodyItemParser<'i, Vec<Declaration>, ()> for DeclarationListParser {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        // Lets nested rules be consumed whole instead of up to the next `;`
        true
    }
}

fn parse_declaration_list<'i>(input: &mut Parser<'i, '_>) -> Vec<Declaration> {
    let mut parser = DeclarationListParser;
    RuleBodyParser::new(input, &mut parser)
        .filter_map(Result::ok)
        .flatten()
        .collect()
}

/// Parses a declaration block (or an inline `style` attribute) into
/// longhand declarations.
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(block);
    let mut parser = Parser::new(&mut input);
    parse_declaration_list(&mut parser)
}

/// Evaluates a media query list against the viewport. Features this tool
/// cannot evaluate are treated as matching.
pub fn media_matches(query: &str, viewport: Viewport) -> bool {
    let query = query.trim().to_ascii_lowercase();
    if query.is_empty() {
        return true;
    }
    split_top_level(&query, ',')
        .into_iter()
        .any(|q| single_query_matches(q, viewport))
}

fn single_query_matches(query: &str, viewport: Viewport) -> bool {
    let (negated, query) = match query.strip_prefix("not ") {
        Some(rest) => (true, rest),
        None => (false, query.strip_prefix("only ").unwrap_or(query)),
    };

    let matched = query
        .split(" and ")
        .map(str::trim)
        .all(|condition| condition_matches(condition, viewport));

    negated != matched
}

fn condition_matches(condition: &str, viewport: Viewport) -> bool {
    match condition {
        "print" | "speech" => false,
        "screen" | "all" => true,
        c if c.starts_with('(') => {
            feature_matches(c.trim_start_matches('(').trim_end_matches(')'), viewport)
        }
        _ => true,
    }
}

fn feature_matches(feature: &str, viewport: Viewport) -> bool {
    let Some((name, value)) = feature.split_once(':') else {
        return range_matches(feature, viewport);
    };
    let value = value.trim();
    let px = resolve_length(value, &LengthContext::new(ROOT_FONT_SIZE, viewport));

    match (name.trim(), px) {
        ("min-width", Some(px)) => viewport.width >= px,
        ("max-width", Some(px)) => viewport.width <= px,
        ("min-height", Some(px)) => viewport.height >= px,
        ("max-height", Some(px)) => viewport.height <= px,
        ("orientation", _) => match value {
            "portrait" => viewport.height >= viewport.width,
            "landscape" => viewport.width > viewport.height,
            _ => true,
        },
        ("prefers-color-scheme", _) => value == "light",
        ("prefers-reduced-motion", _) => value == "no-preference",
        _ => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
}

impl Comparison {
    fn holds(self, left: f64, right: f64) -> bool {
        match self {
            Comparison::Less => left < right,
            Comparison::LessOrEqual => left <= right,
            Comparison::Greater => left > right,
            Comparison::GreaterOrEqual => left >= right,
            Comparison::Equal => (left - right).abs() < f64::EPSILON,
        }
    }
}

/// Range form of `width`/`height`: `width < 640px`, `40rem <= width` and
/// `400px < width <= 700px`.
fn range_matches(feature: &str, viewport: Viewport) -> bool {
    let mut input = ParserInput::new(feature);
    let mut parser = Parser::new(&mut input);
    let mut operands: Vec<&str> = Vec::new();
    let mut comparisons = Vec::new();

    loop {
        parser.skip_whitespace();
        let start = parser.position();
        let Ok(token) = parser.next().cloned() else {
            break;
        };
        let comparison = match token {
            Token::Delim('<') => Some(Comparison::Less),
            Token::Delim('>') => Some(Comparison::Greater),
            Token::Delim('=') => Some(Comparison::Equal),
            _ => None,
        };
        match comparison {
            Some(comparison) => {
                let or_equal = comparison != Comparison::Equal
                    && parser.try_parse(|p| p.expect_delim('=')).is_ok();
                comparisons.push(match (comparison, or_equal) {
                    (Comparison::Less, true) => Comparison::LessOrEqual,
                    (Comparison::Greater, true) => Comparison::GreaterOrEqual,
                    (comparison, _) => comparison,
                });
            }
            None => operands.push(parser.slice_from(start).trim()),
        }
    }

    if comparisons.is_empty()
        || operands.len() != comparisons.len() + 1
        || !operands.iter().any(|o| matches!(*o, "width" | "height"))
    {
        return true;
    }

    let lengths = LengthContext::new(ROOT_FONT_SIZE, viewport);
    let value = |operand: &str| match operand {
        "width" => Some(viewport.width),
        "height" => Some(viewport.height),
        other => resolve_length(other, &lengths),
    };

    operands
        .windows(2)
        .zip(comparisons)
        .all(|(pair, comparison)| match (value(pair[0]), value(pair[1])) {
            (Some(left), Some(right)) => comparison.holds(left, right),
            _ => true,
        })
}

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];
const CORNERS: [&str; 4] = ["top-left", "top-right", "bottom-right", "bottom-left"];
const BORDER_STYLES: [&str; 10] = [
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];
const GLOBAL_KEYWORDS: [&str; 4] = ["inherit", "initial", "unset", "revert"];

fn side_longhands(prefix: &str, suffix: &str) -> Vec<String> {
    SIDES
        .iter()
        .map(|side| format!("{}-{}{}", prefix, side, suffix))
        .collect()
}

fn corner_longhands() -> Vec<String> {
    CORNERS
        .iter()
        .map(|corner| format!("border-{}-radius", corner))
        .collect()
}

/// Longhands a shorthand sets, or `None` for a longhand.
fn shorthand_longhands(property: &str) -> Option<Vec<String>> {
    let longhands = match property {
        "padding" | "margin" => side_longhands(property, ""),
        "gap" | "grid-gap" => vec!["row-gap".to_string(), "column-gap".to_string()],
        "border" => [
            side_longhands("border", "-width"),
            side_longhands("border", "-style"),
            side_longhands("border", "-color"),
        ]
        .concat(),
        "border-top" | "border-right" | "border-bottom" | "border-left" => ["-width", "-style", "-color"]
            .iter()
            .map(|suffix| format!("{}{}", property, suffix))
            .collect(),
        "border-width" => side_longhands("border", "-width"),
        "border-style" => side_longhands("border", "-style"),
        "border-color" => side_longhands("border", "-color"),
        "border-radius" => corner_longhands(),
        "background" => vec![
            "background-image".to_string(),
            "background-color".to_string(),
        ],
        "font" => vec![
            "font-size".to_string(),
            "font-weight".to_string(),
            "line-height".to_string(),
        ],
        _ => return None,
    };
    Some(longhands)
}

/// Expands a declaration into the longhands it sets.
pub fn expand_shorthand(property: &str, value: &str) -> Vec<(String, String)> {
    let Some(longhands) = shorthand_longhands(property) else {
        let property = match property {
            "grid-row-gap" => "row-gap",
            "grid-column-gap" => "column-gap",
            other => other,
        };
        return vec![(property.to_string(), value.to_string())];
    };

    let lowered = value.to_ascii_lowercase();
    if GLOBAL_KEYWORDS.contains(&lowered.as_str()) {
        return longhands.into_iter().map(|l| (l, lowered.clone())).collect();
    }

    let tokens = split_top_level(value, ' ');
    let values: Option<Vec<String>> = match property {
        "padding" | "margin" | "border-width" | "border-style" | "border-color" => {
            expand_sides(&tokens).map(Vec::from)
        }
        "gap" | "grid-gap" => match tokens.as_slice() {
            [both] => Some(vec![both.to_string(), both.to_string()]),
            [row, column] => Some(vec![row.to_string(), column.to_string()]),
            _ => None,
        },
        "border" => {
            let (width, style, color) = parse_border(&tokens);
            Some(
                [[width; 4], [style; 4], [color; 4]]
                    .concat()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            )
        }
        "border-top" | "border-right" | "border-bottom" | "border-left" => {
            let (width, style, color) = parse_border(&tokens);
            Some(vec![width.to_string(), style.to_string(), color.to_string()])
        }
        "border-radius" => {
            // Horizontal radii only; the elliptical part after '/' is dropped
            let horizontal = value.split('/').next().unwrap_or(value);
            expand_sides(&split_top_level(horizontal, ' ')).map(Vec::from)
        }
        "background" => Some(parse_background(value)),
        "font" => parse_font(&tokens),
        _ => None,
    };

    match values {
        Some(values) if values.len() == longhands.len() => {
            longhands.into_iter().zip(values).collect()
        }
        _ => {
            debug!("Ignoring invalid {} value '{}'", property, value);
            Vec::new()
        }
    }
}

fn is_border_width(token: &str) -> bool {
    matches!(token, "thin" | "medium" | "thick") || split_dimension(token).is_some()
}

/// Splits a `border` value into width, style and color; omitted parts take
/// their initial values.
fn parse_border<'a>(tokens: &[&'a str]) -> (&'a str, &'a str, &'a str) {
    let mut width = "medium";
    let mut style = "none";
    let mut color = "currentcolor";

    for token in tokens {
        let lowered = token.to_ascii_lowercase();
        if BORDER_STYLES.contains(&lowered.as_str()) {
            style = token;
        } else if is_border_width(&lowered) {
            width = token;
        } else if is_color(token) {
            color = token;
        }
    }

    (width, style, color)
}

/// `background` shorthand: image layers and the final layer's color.
fn parse_background(value: &str) -> Vec<String> {
    let layers = split_top_level(value, ',');

    let images: Vec<&str> = layers
        .iter()
        .flat_map(|layer| split_top_level(*layer, ' '))
        .filter(|token| {
            let lowered = token.to_ascii_lowercase();
            lowered.contains("gradient(") || lowered.starts_with("url(") || lowered.starts_with("image-set(")
        })
        .collect();

    let color = layers
        .last()
        .and_then(|layer| {
            split_top_level(*layer, ' ')
                .into_iter()
                .find(|token| is_color(token) && !token.eq_ignore_ascii_case("none"))
        })
        .unwrap_or("transparent");

    let image = if images.is_empty() {
        "none".to_string()
    } else {
        images.join(", ")
    };

    vec![image, color.to_string()]
}

/// `font` shorthand: `[style] [variant] [weight] size[/line-height] family`.
fn parse_font(tokens: &[&str]) -> Option<Vec<String>> {
    let size_index = tokens.iter().position(|token| {
        let size = token.split('/').next().unwrap_or_default().to_ascii_lowercase();
        font_size_keyword(&size).is_some()
            || matches!(size.as_str(), "larger" | "smaller")
            || split_dimension(&size).is_some_and(|(_, unit)| !unit.is_empty())
    })?;

    let weight = tokens[..size_index]
        .iter()
        .find(|token| {
            let lowered = token.to_ascii_lowercase();
            matches!(lowered.as_str(), "bold" | "bolder" | "lighter")
                || lowered.parse::<u16>().is_ok()
        })
        .map(|token| token.to_string())
        .unwrap_or_else(|| "normal".to_string());

    let size_token = tokens[size_index];
    let (size, mut line_height) = match size_token.split_once('/') {
        Some((size, lh)) if !lh.is_empty() => (size, Some(lh.to_string())),
        Some((size, _)) => (size, tokens.get(size_index + 1).map(|t| t.to_string())),
        None => (size_token, None),
    };

    if line_height.is_none() {
        line_height = match tokens.get(size_index + 1) {
            Some(&"/") => tokens.get(size_index + 2).map(|t| t.to_string()),
            Some(next) if next.starts_with('/') => Some(next.trim_start_matches('/').to_string()),
            _ => None,
        };
    }

    Some(vec![
        size.to_string(),
        weight,
        line_height.unwrap_or_else(|| "normal".to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssparser::ToCss;

    fn decl_map(block: &str) -> Vec<(String, String)> {
        parse_declarations(block)
            .into_iter()
            .map(|d| (d.property, d.value))
            .collect()
    }

    fn value_of<'a>(decls: &'a [(String, String)], property: &str) -> Option<&'a str> {
        decls
            .iter()
            .rev()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    fn selectors_of(sheet: &Stylesheet) -> Vec<String> {
        sheet
            .rules
            .iter()
            .map(|r| r.selector.to_css_string())
            .collect()
    }

    fn specificity_of(selector: &str) -> Specificity {
        let sheet = Stylesheet::parse(
            &format!("{} {{ color: red }}", selector),
            Origin::Author,
            Viewport::default(),
        );
        sheet.rules[0].specificity
    }

    fn at(width: f64, height: f64) -> Viewport {
        Viewport { width, height }
    }

    // ============================================================================
    // Rules
    // ============================================================================

    #[test]
    fn test_parse_simple_rules() {
        let sheet = Stylesheet::parse(
            "h1, .title { color: red; } p { margin: 0 }",
            Origin::Author,
            Viewport::default(),
        );
        assert_eq!(sheet.len(), 3);
        assert_eq!(selectors_of(&sheet), vec!["h1", ".title", "p"]);
        assert_eq!(sheet.rules[2].declarations.len(), 4);
    }

    #[test]
    fn test_comments_and_statement_at_rules_are_ignored() {
        let sheet = Stylesheet::parse(
            "@charset \"utf-8\"; @import url(x.css); /* a { color: red } */ b { color: blue }",
            Origin::Author,
            Viewport::default(),
        );
        assert_eq!(selectors_of(&sheet), vec!["b"]);
    }

    #[test]
    fn test_unsupported_selectors_are_skipped() {
        let sheet = Stylesheet::parse(
            "a::before { color: red } a:hover, b { color: blue }",
            Origin::Author,
            Viewport::default(),
        );
        assert_eq!(selectors_of(&sheet), vec!["b"]);
    }

    #[test]
    fn test_escaped_quote_does_not_swallow_later_rules() {
        let sheet = Stylesheet::parse(
            r#".a::before { content: "\"" } .b { padding: 10px }"#,
            Origin::Author,
            Viewport::default(),
        );
        assert_eq!(selectors_of(&sheet), vec![".b"]);
        assert_eq!(sheet.rules[0].declarations[0].value, "10px");
    }

    #[test]
    fn test_comment_opener_inside_string_is_literal() {
        let sheet = Stylesheet::parse(
            r#".a { background-image: url("/*x.png") } .b { padding: 10px }"#,
            Origin::Author,
            Viewport::default(),
        );
        assert_eq!(selectors_of(&sheet), vec![".a", ".b"]);
        assert_eq!(
            sheet.rules[0].declarations[0].value,
            r#"url("/*x.png")"#
        );
    }

    #[test]
    fn test_braces_inside_strings_do_not_close_blocks() {
        let sheet = Stylesheet::parse(
            r#".a { content: "}" ; color: red } .b { color: blue }"#,
            Origin::Author,
            Viewport::default(),
        );
        assert_eq!(selectors_of(&sheet), vec![".a", ".b"]);
        assert_eq!(sheet.rules[0].declarations.len(), 2);
    }

    #[test]
    fn test_link_pseudo_classes() {
        let sheet = Stylesheet::parse(
            "a:link { color: red } a:any-link { color: green } a:visited { color: blue } :not(:link) { color: black }",
            Origin::Author,
            Viewport::default(),
        );
        assert_eq!(
            selectors_of(&sheet),
            vec!["a[href]", "a[href]", ":not([href])"]
        );
    }

    // ============================================================================
    // Media queries
    // ============================================================================

    #[test]
    fn test_media_blocks_follow_viewport() {
        let css = "@media (max-width: 600px) { .narrow { color: red } }
                   @media screen and (min-width: 1024px) { .wide { color: blue } }
                   @media print { .paper { color: black } }
                   @font-face { font-family: x; src: url(x.woff) }";
        let sheet = Stylesheet::parse(css, Origin::Author, Viewport::default());
        assert_eq!(selectors_of(&sheet), vec![".wide"]);

        let sheet = Stylesheet::parse(css, Origin::Author, at(400.0, 800.0));
        assert_eq!(selectors_of(&sheet), vec![".narrow"]);
    }

    #[test]
    fn test_nested_group_rules() {
        let css = "@supports (display: grid) { @media (min-width: 1px) { .grid { gap: 4px } } }
                   @layer base { .base { color: red } }";
        let sheet = Stylesheet::parse(css, Origin::Author, Viewport::default());
        assert_eq!(selectors_of(&sheet), vec![".grid", ".base"]);
    }

    #[test]
    fn test_media_matches() {
        let vp = Viewport::default();
        assert!(media_matches("", vp));
        assert!(media_matches("all", vp));
        assert!(!media_matches("print", vp));
        assert!(media_matches("print, screen", vp));
        assert!(media_matches("not print", vp));
        assert!(media_matches("(min-width: 40em)", vp));
        assert!(!media_matches("(prefers-color-scheme: dark)", vp));
        assert!(media_matches("(hover: hover)", vp));
    }

    #[test]
    fn test_media_range_syntax() {
        let vp = Viewport::default();
        assert!(!media_matches("(width < 640px)", vp));
        assert!(media_matches("(width >= 40rem)", vp));
        assert!(media_matches("(width > 1279px)", vp));
        assert!(!media_matches("(width <= 1279px)", vp));
        assert!(media_matches("(width = 1280px)", vp));
        assert!(!media_matches("(height > 800px)", vp));
        assert!(media_matches("(640px < width)", vp));
        assert!(!media_matches("(2000px <= width)", vp));
        assert!(media_matches("(400px < width <= 1280px)", vp));
        assert!(!media_matches("(400px < width < 700px)", vp));
        assert!(media_matches("(400px < width < 700px)", at(500.0, 800.0)));
        assert!(media_matches("screen and (width >= 768px)", vp));
        assert!(media_matches("not (width < 640px)", vp));
        assert!(media_matches("(aspect-ratio > 1)", vp));
    }

    #[test]
    fn test_range_media_block_is_skipped_when_false() {
        let sheet = Stylesheet::parse(
            ".b { padding: 10px } @media (width < 640px) { .b { padding: 2px } }",
            Origin::Author,
            Viewport::default(),
        );
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].value, "10px");
    }

    // ============================================================================
    // Declarations
    // ============================================================================

    #[test]
    fn test_important_flag() {
        let decls = parse_declarations("color: red !important; background-color: blue ! IMPORTANT; margin-top: 1px");
        assert_eq!(decls[0].value, "red");
        assert!(decls[0].important);
        assert_eq!(decls[1].value, "blue");
        assert!(decls[1].important);
        assert!(!decls[2].important);
    }

    #[test]
    fn test_comments_inside_values_are_dropped() {
        let decls = decl_map("padding: 10px /* base */ 4px; color: /* brand */ red");
        assert_eq!(value_of(&decls, "padding-top"), Some("10px"));
        assert_eq!(value_of(&decls, "padding-right"), Some("4px"));
        assert_eq!(value_of(&decls, "color"), Some("red"));
    }

    #[test]
    fn test_nested_rules_in_blocks_are_skipped() {
        let decls = decl_map("color: red; &:hover { color: blue } padding: 2px");
        assert_eq!(value_of(&decls, "color"), Some("red"));
        assert_eq!(value_of(&decls, "padding-top"), Some("2px"));
    }

    #[test]
    fn test_expand_padding_and_margin() {
        let decls = decl_map("padding: 1px 2px; margin: 0 auto 4px");
        assert_eq!(value_of(&decls, "padding-top"), Some("1px"));
        assert_eq!(value_of(&decls, "padding-left"), Some("2px"));
        assert_eq!(value_of(&decls, "margin-right"), Some("auto"));
        assert_eq!(value_of(&decls, "margin-left"), Some("auto"));
        assert_eq!(value_of(&decls, "margin-bottom"), Some("4px"));
    }

    #[test]
    fn test_expand_border() {
        let decls = decl_map("border: 1px solid #ccc");
        assert_eq!(decls.len(), 12);
        assert_eq!(value_of(&decls, "border-left-width"), Some("1px"));
        assert_eq!(value_of(&decls, "border-top-style"), Some("solid"));
        assert_eq!(value_of(&decls, "border-bottom-color"), Some("#ccc"));

        let decls = decl_map("border-top: dashed");
        assert_eq!(value_of(&decls, "border-top-width"), Some("medium"));
        assert_eq!(value_of(&decls, "border-top-color"), Some("currentcolor"));
    }

    #[test]
    fn test_border_ignores_hex_like_words() {
        let decls = decl_map("border: 2px solid face");
        assert_eq!(value_of(&decls, "border-top-color"), Some("currentcolor"));
    }

    #[test]
    fn test_expand_border_radius_drops_elliptical_part() {
        let decls = decl_map("border-radius: 4px 8px / 2px");
        assert_eq!(value_of(&decls, "border-top-left-radius"), Some("4px"));
        assert_eq!(value_of(&decls, "border-top-right-radius"), Some("8px"));
        assert_eq!(value_of(&decls, "border-bottom-right-radius"), Some("4px"));
    }

    #[test]
    fn test_expand_background() {
        let decls = decl_map("background: linear-gradient(to right, #fff, #000) no-repeat, #123456");
        assert_eq!(
            value_of(&decls, "background-image"),
            Some("linear-gradient(to right, #fff, #000)")
        );
        assert_eq!(value_of(&decls, "background-color"), Some("#123456"));

        let decls = decl_map("background: white");
        assert_eq!(value_of(&decls, "background-image"), Some("none"));
        assert_eq!(value_of(&decls, "background-color"), Some("white"));

        let decls = decl_map(r#"background: url("a, b.png") red"#);
        assert_eq!(value_of(&decls, "background-image"), Some(r#"url("a, b.png")"#));
        assert_eq!(value_of(&decls, "background-color"), Some("red"));
    }

    #[test]
    fn test_expand_font() {
        let decls = decl_map("font: italic bold 12px/30px Georgia, serif");
        assert_eq!(value_of(&decls, "font-size"), Some("12px"));
        assert_eq!(value_of(&decls, "font-weight"), Some("bold"));
        assert_eq!(value_of(&decls, "line-height"), Some("30px"));

        let decls = decl_map("font: 1.5rem sans-serif");
        assert_eq!(value_of(&decls, "font-weight"), Some("normal"));
        assert_eq!(value_of(&decls, "line-height"), Some("normal"));
    }

    #[test]
    fn test_expand_gap_and_global_keywords() {
        let decls = decl_map("gap: 8px 16px");
        assert_eq!(value_of(&decls, "row-gap"), Some("8px"));
        assert_eq!(value_of(&decls, "column-gap"), Some("16px"));

        let decls = decl_map("padding: inherit");
        assert_eq!(decls.len(), 4);
        assert!(decls.iter().all(|(_, v)| v == "inherit"));
    }

    #[test]
    fn test_invalid_shorthand_is_dropped() {
        assert!(decl_map("padding: 1px 2px 3px 4px 5px").is_empty());
        assert!(decl_map("--brand: red").is_empty());
        assert!(decl_map("color:").is_empty());
    }

    // ============================================================================
    // Specificity
    // ============================================================================

    #[test]
    fn test_specificity() {
        assert_eq!(specificity_of("*"), Specificity(0, 0, 0));
        assert_eq!(specificity_of("p"), Specificity(0, 0, 1));
        assert_eq!(specificity_of("div p.note"), Specificity(0, 1, 2));
        assert_eq!(specificity_of("#main > a[href]:first-child"), Specificity(1, 2, 1));
        assert_eq!(specificity_of(":where(#x) p"), Specificity(0, 0, 1));
        assert_eq!(specificity_of(":not(#x) p"), Specificity(1, 0, 1));
        assert_eq!(specificity_of(":is(.a, #b) span"), Specificity(1, 0, 1));
        assert_eq!(specificity_of("a:link"), Specificity(0, 1, 1));
    }

    #[test]
    fn test_specificity_is_per_selector_in_list() {
        let sheet = Stylesheet::parse(
            "#id, .class, tag { color: red }",
            Origin::Author,
            Viewport::default(),
        );
        let specificities: Vec<Specificity> =
            sheet.rules.iter().map(|r| r.specificity).collect();
        assert_eq!(
            specificities,
            vec![
                Specificity(1, 0, 0),
                Specificity(0, 1, 0),
                Specificity(0, 0, 1)
            ]
        );
    }
}
