//! Trigger positions: where a scroll range starts and ends.
//!
//! A position pairs an edge of the element with an edge of the viewport,
//! e.g. `"top 85%"` fires when the element's top reaches 85% of the way
//! down the viewport, `"center center"` when both centres line up.
//! Element edges accept `+=n` / `-=n` pixel adjustments (`"top+=200 top"`).
//!
//! End positions may also be relative to the start:
//!
//! | text       | meaning                                    |
//! |------------|--------------------------------------------|
//! | `+=400`    | 400 px after the start                     |
//! | `+=150%`   | 1.5 viewport heights after the start       |
//! | `+=1.5x`   | 1.5 × the element's height after the start |

use std::fmt;
use std::str::FromStr;

use scrolly_protocol::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::range::ScrollRange;

#[derive(Debug, Error, PartialEq)]
pub enum PositionError {
    #[error("empty trigger position")]
    Empty,
    #[error("expected \"<element> <viewport>\", got {0:?}")]
    Arity(String),
    #[error("unknown edge {0:?}")]
    UnknownEdge(String),
    #[error("invalid number in {0:?}")]
    BadNumber(String),
    #[error("relative position {0:?} is only valid as a range end")]
    RelativeStart(String),
}

/// A reference line on an element or on the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Top,
    Center,
    Bottom,
    /// Fraction of the height, stored as a percentage (`85.0` for `85%`).
    Percent(f64),
    Px(f64),
}

impl Edge {
    /// Distance from the top of a box of the given height to this edge.
    pub fn resolve(self, height: f64) -> f64 {
        match self {
            Edge::Top => 0.0,
            Edge::Center => height / 2.0,
            Edge::Bottom => height,
            Edge::Percent(p) => height * p / 100.0,
            Edge::Px(px) => px,
        }
    }
}

/// An edge plus an optional pixel adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRef {
    pub edge: Edge,
    pub adjust: f64,
}

impl EdgeRef {
    pub fn resolve(self, height: f64) -> f64 {
        self.edge.resolve(height) + self.adjust
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TriggerPosition {
    pub element: EdgeRef,
    pub viewport: EdgeRef,
}

impl TriggerPosition {
    pub const TOP_TOP: TriggerPosition = TriggerPosition::new(Edge::Top, Edge::Top);

    pub const fn new(element: Edge, viewport: Edge) -> Self {
        Self {
            element: EdgeRef {
                edge: element,
                adjust: 0.0,
            },
            viewport: EdgeRef {
                edge: viewport,
                adjust: 0.0,
            },
        }
    }

    /// Document scroll offset at which the two edges coincide.
    pub fn resolve(&self, element: &Rect, viewport_height: f64) -> f64 {
        element.top() + self.element.resolve(element.h) - self.viewport.resolve(viewport_height)
    }
}

/// Distance measured from a range's start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    /// Percentage of the viewport height.
    ViewportPercent(f64),
    /// Multiple of the element's height.
    ElementScale(f64),
}

impl Length {
    pub fn resolve(self, element: &Rect, viewport_height: f64) -> f64 {
        match self {
            Length::Px(px) => px,
            Length::ViewportPercent(p) => viewport_height * p / 100.0,
            Length::ElementScale(k) => element.h * k,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EndPosition {
    Absolute(TriggerPosition),
    Relative(Length),
}

impl EndPosition {
    pub fn resolve(&self, start: f64, element: &Rect, viewport_height: f64) -> f64 {
        match self {
            EndPosition::Absolute(pos) => pos.resolve(element, viewport_height),
            EndPosition::Relative(len) => start + len.resolve(element, viewport_height),
        }
    }
}

/// Start and end positions; measured against live layout on every refresh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    pub start: TriggerPosition,
    pub end: EndPosition,
}

impl RangeSpec {
    pub fn measure(&self, element: &Rect, viewport_height: f64) -> ScrollRange {
        let start = self.start.resolve(element, viewport_height);
        let end = self.end.resolve(start, element, viewport_height);
        ScrollRange::new(start, end)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn parse_number(text: &str, whole: &str) -> Result<f64, PositionError> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| PositionError::BadNumber(whole.to_string()))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PositionError::BadNumber(whole.to_string()))
    }
}

fn parse_edge(text: &str, whole: &str) -> Result<Edge, PositionError> {
    match text {
        "top" => Ok(Edge::Top),
        "center" => Ok(Edge::Center),
        "bottom" => Ok(Edge::Bottom),
        _ => {
            if let Some(p) = text.strip_suffix('%') {
                Ok(Edge::Percent(parse_number(p, whole)?))
            } else if let Some(px) = text.strip_suffix("px") {
                Ok(Edge::Px(parse_number(px, whole)?))
            } else if text.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.') {
                Ok(Edge::Px(parse_number(text, whole)?))
            } else {
                Err(PositionError::UnknownEdge(text.to_string()))
            }
        }
    }
}

fn parse_edge_ref(token: &str, whole: &str) -> Result<EdgeRef, PositionError> {
    let (base, adjust) = if let Some(i) = token.find("+=") {
        (&token[..i], parse_number(&token[i + 2..], whole)?)
    } else if let Some(i) = token.find("-=") {
        (&token[..i], -parse_number(&token[i + 2..], whole)?)
    } else {
        (token, 0.0)
    };
    Ok(EdgeRef {
        edge: parse_edge(base, whole)?,
        adjust,
    })
}

fn parse_relative(token: &str, whole: &str) -> Result<Length, PositionError> {
    let (sign, body) = if let Some(body) = token.strip_prefix("+=") {
        (1.0, body)
    } else if let Some(body) = token.strip_prefix("-=") {
        (-1.0, body)
    } else {
        return Err(PositionError::BadNumber(whole.to_string()));
    };
    let length = if let Some(p) = body.strip_suffix('%') {
        Length::ViewportPercent(sign * parse_number(p, whole)?)
    } else if let Some(k) = body.strip_suffix('x') {
        Length::ElementScale(sign * parse_number(k, whole)?)
    } else if let Some(px) = body.strip_suffix("px") {
        Length::Px(sign * parse_number(px, whole)?)
    } else {
        Length::Px(sign * parse_number(body, whole)?)
    };
    Ok(length)
}

impl FromStr for TriggerPosition {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PositionError::Empty);
        }
        if trimmed.starts_with("+=") || trimmed.starts_with("-=") {
            return Err(PositionError::RelativeStart(trimmed.to_string()));
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let [element, viewport] = tokens.as_slice() else {
            return Err(PositionError::Arity(trimmed.to_string()));
        };
        Ok(TriggerPosition {
            element: parse_edge_ref(element, trimmed)?,
            viewport: parse_edge_ref(viewport, trimmed)?,
        })
    }
}

impl FromStr for EndPosition {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with("+=") || trimmed.starts_with("-=") {
            if trimmed.split_whitespace().count() != 1 {
                return Err(PositionError::Arity(trimmed.to_string()));
            }
            return Ok(EndPosition::Relative(parse_relative(trimmed, trimmed)?));
        }
        Ok(EndPosition::Absolute(trimmed.parse()?))
    }
}

impl TryFrom<String> for TriggerPosition {
    type Error = PositionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for EndPosition {
    type Error = PositionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

fn fmt_number(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.fract() == 0.0 {
        write!(f, "{}", v as i64)
    } else {
        write!(f, "{v}")
    }
}

impl fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.edge {
            Edge::Top => f.write_str("top")?,
            Edge::Center => f.write_str("center")?,
            Edge::Bottom => f.write_str("bottom")?,
            Edge::Percent(p) => {
                fmt_number(f, p)?;
                f.write_str("%")?;
            }
            Edge::Px(px) => {
                fmt_number(f, px)?;
                f.write_str("px")?;
            }
        }
        if self.adjust > 0.0 {
            f.write_str("+=")?;
            fmt_number(f, self.adjust)?;
        } else if self.adjust < 0.0 {
            f.write_str("-=")?;
            fmt_number(f, -self.adjust)?;
        }
        Ok(())
    }
}

impl fmt::Display for TriggerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

impl fmt::Display for EndPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndPosition::Absolute(pos) => pos.fmt(f),
            EndPosition::Relative(len) => {
                let (value, suffix) = match *len {
                    Length::Px(px) => (px, ""),
                    Length::ViewportPercent(p) => (p, "%"),
                    Length::ElementScale(k) => (k, "x"),
                };
                f.write_str(if value < 0.0 { "-=" } else { "+=" })?;
                fmt_number(f, value.abs())?;
                f.write_str(suffix)
            }
        }
    }
}

impl From<TriggerPosition> for String {
    fn from(value: TriggerPosition) -> Self {
        value.to_string()
    }
}

impl From<EndPosition> for String {
    fn from(value: EndPosition) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT_H: f64 = 800.0;

    fn section() -> Rect {
        Rect::new(0.0, 2000.0, 1200.0, 600.0)
    }

    #[test]
    fn top_85_percent_fires_before_element_reaches_top() {
        let pos: TriggerPosition = "top 85%".parse().unwrap_or(TriggerPosition::TOP_TOP);
        assert_eq!(pos.resolve(&section(), VIEWPORT_H), 2000.0 - 680.0);
    }

    #[test]
    fn center_center() {
        let pos: TriggerPosition = "center center".parse().unwrap_or(TriggerPosition::TOP_TOP);
        assert_eq!(pos.resolve(&section(), VIEWPORT_H), 2000.0 + 300.0 - 400.0);
    }

    #[test]
    fn adjustments_on_either_side() {
        let pos: TriggerPosition = "top+=200 top".parse().unwrap_or(TriggerPosition::TOP_TOP);
        assert_eq!(pos.resolve(&section(), VIEWPORT_H), 2200.0);

        let pos: TriggerPosition = "top center+=100"
            .parse()
            .unwrap_or(TriggerPosition::TOP_TOP);
        assert_eq!(pos.resolve(&section(), VIEWPORT_H), 2000.0 - 500.0);
    }

    #[test]
    fn relative_ends() {
        let start = 2000.0;
        let cases = [
            ("+=400", 2400.0),
            ("+=400px", 2400.0),
            ("+=150%", 3200.0),
            ("+=1.5x", 2900.0),
        ];
        for (text, expected) in cases {
            let end: EndPosition = match text.parse() {
                Ok(end) => end,
                Err(e) => panic!("{text}: {e}"),
            };
            assert_eq!(end.resolve(start, &section(), VIEWPORT_H), expected, "{text}");
        }
    }

    #[test]
    fn rejects_malformed_positions() {
        assert_eq!("".parse::<TriggerPosition>(), Err(PositionError::Empty));
        assert!(matches!(
            "top".parse::<TriggerPosition>(),
            Err(PositionError::Arity(_))
        ));
        assert!(matches!(
            "middle top".parse::<TriggerPosition>(),
            Err(PositionError::UnknownEdge(_))
        ));
        assert!(matches!(
            "+=100".parse::<TriggerPosition>(),
            Err(PositionError::RelativeStart(_))
        ));
        assert!(matches!(
            "+=abc".parse::<EndPosition>(),
            Err(PositionError::BadNumber(_))
        ));
    }

    #[test]
    fn display_matches_input_grammar() {
        for text in ["top 85%", "center center", "top+=200 top", "bottom-=40 120px"] {
            let pos: TriggerPosition = match text.parse() {
                Ok(pos) => pos,
                Err(e) => panic!("{text}: {e}"),
            };
            assert_eq!(pos.to_string(), text);
        }
        let end: EndPosition = "+=1.5x".parse().unwrap_or(EndPosition::Relative(Length::Px(0.0)));
        assert_eq!(end.to_string(), "+=1.5x");
    }

    #[test]
    fn measures_pin_range_from_section() {
        let spec = RangeSpec {
            start: TriggerPosition::TOP_TOP,
            end: EndPosition::Relative(Length::ElementScale(1.5)),
        };
        let range = spec.measure(&section(), VIEWPORT_H);
        assert_eq!(range.start, 2000.0);
        assert_eq!(range.end, 2900.0);
    }
}
