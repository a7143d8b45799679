//! Canonical interchange text: a keyed, Lisp-style data notation.
//!
//! The persisted sidecar is an EDN document with colon-prefixed keys
//! and a top-level `:highlights` vector. This module recognizes the
//! subset the highlight workflow emits: maps, vectors, strings,
//! numbers, booleans, nil, and `#uuid` tagged literals, with commas
//! treated as whitespace.
//!
//! Document shape:
//!
//! ```text
//! {:highlights [{:page 1
//!                :properties {:color "yellow"}
//!                :position {:bounding {:x1 .. :y1 .. :x2 .. :y2 .. :width .. :height ..}
//!                           :rects [{...}]
//!                           :page 1}
//!                :content {:text "..."}
//!                :id #uuid "..."
//!                :author "..."} ...]}
//! ```
//!
//! Round-trip requirement: a record serialized here and reparsed
//! reproduces identical page, colour, rect coordinates, and id.

use indexmap::IndexMap;
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_while, take_while1},
    character::complete::{char, none_of},
    combinator::{map, map_res, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};
use uuid::Uuid;

use crate::color::ColorName;
use crate::error::{Error, Result};
use crate::geometry::{PageSize, Rect};
use crate::record::HighlightRecord;

/// An EDN value in the subset the highlight workflow uses.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer number
    Integer(i64),
    /// Floating-point number
    Float(f64),
    /// String literal
    String(String),
    /// Keyword used in value position (rare here, but legal EDN)
    Keyword(String),
    /// `#uuid "..."` tagged literal
    Uuid(Uuid),
    /// Boolean
    Bool(bool),
    /// nil
    Nil,
    /// Vector `[...]`
    Vector(Vec<Value>),
    /// Map `{:key value ...}` with keyword keys, insertion-ordered
    Map(IndexMap<String, Value>),
}

impl Value {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Integer(n) => u32::try_from(*n).ok(),
            Value::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Some(*f as u32),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    fn as_vector(&self) -> Option<&[Value]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }
}

// ===== Reader =====

/// EDN whitespace: ASCII whitespace plus commas.
fn ws(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_whitespace() || c == ',')(input)
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '+' | '*' | '?' | '!' | '/')
}

/// Keyword: `:` followed by symbol characters. Returned without the colon.
fn parse_keyword(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(is_symbol_char))(input)
}

/// String literal with `\"`, `\\`, `\n`, `\t`, `\r` escapes.
fn parse_string(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('"'),
            opt(escaped_transform(
                none_of("\\\""),
                '\\',
                alt((
                    value('\\', char('\\')),
                    value('"', char('"')),
                    value('\n', char('n')),
                    value('\t', char('t')),
                    value('\r', char('r')),
                )),
            )),
            char('"'),
        ),
        |s| s.unwrap_or_default(),
    )(input)
}

/// Number: integer when there is no fractional part or exponent.
fn parse_number(input: &str) -> IResult<&str, Value> {
    let (rest, text) = recognize(tuple((
        opt(alt((char('-'), char('+')))),
        take_while1(|c: char| c.is_ascii_digit()),
        opt(pair(char('.'), take_while1(|c: char| c.is_ascii_digit()))),
        opt(tuple((
            alt((char('e'), char('E'))),
            opt(alt((char('-'), char('+')))),
            take_while1(|c: char| c.is_ascii_digit()),
        ))),
    )))(input)?;

    let parsed = if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>().map(Value::Float)
    } else {
        text.parse::<i64>().map(Value::Integer).or_else(|_| {
            // Overflowing integer literals degrade to floats.
            text.parse::<f64>().map(Value::Float)
        })
    };
    match parsed {
        Ok(v) => Ok((rest, v)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

/// `#uuid "xxxxxxxx-xxxx-..."` tagged literal.
fn parse_uuid(input: &str) -> IResult<&str, Value> {
    map(
        map_res(
            preceded(pair(tag("#uuid"), ws), parse_string),
            |s| Uuid::parse_str(&s),
        ),
        Value::Uuid,
    )(input)
}

fn parse_vector(input: &str) -> IResult<&str, Value> {
    map(
        delimited(char('['), many0(parse_value), preceded(ws, char(']'))),
        Value::Vector,
    )(input)
}

fn parse_map(input: &str) -> IResult<&str, Value> {
    map(
        delimited(
            char('{'),
            many0(pair(
                preceded(ws, parse_keyword),
                parse_value,
            )),
            preceded(ws, char('}')),
        ),
        |pairs| {
            let mut m = IndexMap::new();
            for (k, v) in pairs {
                m.insert(k.to_string(), v);
            }
            Value::Map(m)
        },
    )(input)
}

fn parse_value(input: &str) -> IResult<&str, Value> {
    preceded(
        ws,
        alt((
            parse_map,
            parse_vector,
            parse_uuid,
            map(parse_string, Value::String),
            value(Value::Bool(true), tag("true")),
            value(Value::Bool(false), tag("false")),
            value(Value::Nil, tag("nil")),
            parse_number,
            map(parse_keyword, |k| Value::Keyword(k.to_string())),
        )),
    )(input)
}

/// Parse a single EDN value from `text`, requiring only trailing
/// whitespace after it.
pub fn parse(text: &str) -> Result<Value> {
    match parse_value(text) {
        Ok((rest, v)) if rest.trim_matches(|c: char| c.is_whitespace() || c == ',').is_empty() => {
            Ok(v)
        },
        Ok((rest, _)) => Err(Error::Interchange(format!(
            "trailing data after document: {:.40}",
            rest.trim_start()
        ))),
        Err(e) => Err(Error::Interchange(format!("malformed EDN: {}", e))),
    }
}

// ===== Writer =====

fn escape_str(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
}

fn write_value(v: &Value, indent: usize, out: &mut String) {
    let pad = "    ".repeat(indent);
    let inner_pad = "    ".repeat(indent + 1);
    match v {
        Value::Integer(n) => out.push_str(&n.to_string()),
        Value::Float(f) => out.push_str(&f.to_string()),
        Value::String(s) => escape_str(s, out),
        Value::Keyword(k) => {
            out.push(':');
            out.push_str(k);
        },
        Value::Uuid(id) => {
            out.push_str("#uuid ");
            escape_str(&id.to_string(), out);
        },
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Nil => out.push_str("nil"),
        Value::Vector(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                out.push_str(&inner_pad);
                write_value(item, indent + 1, out);
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&pad);
            out.push(']');
        },
        Value::Map(m) => {
            if m.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (i, (k, val)) in m.iter().enumerate() {
                out.push_str(&inner_pad);
                out.push(':');
                out.push_str(k);
                out.push(' ');
                write_value(val, indent + 1, out);
                if i + 1 < m.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&pad);
            out.push('}');
        },
    }
}

/// Serialize a value as pretty-printed EDN text.
pub fn write(v: &Value) -> String {
    let mut out = String::new();
    write_value(v, 0, &mut out);
    out
}

// ===== Record mapping =====

fn number(v: f64) -> Value {
    Value::Float(v)
}

fn bounding_map(rect: &Rect, page_size: &PageSize) -> Value {
    let mut m = IndexMap::new();
    m.insert("x1".to_string(), number(rect.x0));
    m.insert("y1".to_string(), number(rect.y0));
    m.insert("x2".to_string(), number(rect.x1));
    m.insert("y2".to_string(), number(rect.y1));
    m.insert("width".to_string(), number(page_size.width));
    m.insert("height".to_string(), number(page_size.height));
    Value::Map(m)
}

fn record_to_value(record: &HighlightRecord) -> Value {
    let mut properties = IndexMap::new();
    properties.insert(
        "color".to_string(),
        Value::String(record.color.as_str().to_string()),
    );

    let mut position = IndexMap::new();
    position.insert(
        "bounding".to_string(),
        bounding_map(&record.rect, &record.page_size),
    );
    position.insert(
        "rects".to_string(),
        Value::Vector(vec![bounding_map(&record.rect, &record.page_size)]),
    );
    position.insert("page".to_string(), Value::Integer(record.page as i64));

    let mut content = IndexMap::new();
    if let Some(text) = &record.text {
        content.insert("text".to_string(), Value::String(text.clone()));
    }

    let mut m = IndexMap::new();
    m.insert("page".to_string(), Value::Integer(record.page as i64));
    m.insert("properties".to_string(), Value::Map(properties));
    m.insert("position".to_string(), Value::Map(position));
    m.insert("content".to_string(), Value::Map(content));
    m.insert("id".to_string(), Value::Uuid(record.id));
    if let Some(author) = &record.author {
        m.insert("author".to_string(), Value::String(author.clone()));
    }
    Value::Map(m)
}

/// Serialize records to the persisted interchange document.
pub fn to_edn(records: &[HighlightRecord]) -> String {
    let mut top = IndexMap::new();
    top.insert(
        "highlights".to_string(),
        Value::Vector(records.iter().map(record_to_value).collect()),
    );
    write(&Value::Map(top))
}

fn require<'a>(m: &'a IndexMap<String, Value>, key: &str) -> Result<&'a Value> {
    m.get(key)
        .ok_or_else(|| Error::Interchange(format!("missing :{} entry", key)))
}

fn decode_bounding(v: &Value) -> Result<(Rect, PageSize)> {
    let m = v
        .as_map()
        .ok_or_else(|| Error::Interchange("rect entry is not a map".to_string()))?;
    let edge = |key: &str| -> Result<f64> {
        require(m, key)?
            .as_f64()
            .ok_or_else(|| Error::Interchange(format!(":{} is not a number", key)))
    };
    let rect = Rect::new(edge("x1")?, edge("y1")?, edge("x2")?, edge("y2")?);
    let page_size = PageSize::new(edge("width")?, edge("height")?);
    Ok((rect, page_size))
}

fn decode_record(v: &Value) -> Result<HighlightRecord> {
    let m = v
        .as_map()
        .ok_or_else(|| Error::Interchange("highlight entry is not a map".to_string()))?;

    let page = require(m, "page")?
        .as_u32()
        .ok_or_else(|| Error::Interchange(":page is not a positive integer".to_string()))?;

    let color_name = require(m, "properties")?
        .as_map()
        .and_then(|p| p.get("color"))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Interchange(":properties :color missing".to_string()))?;
    let color = ColorName::from_str_name(color_name)
        .ok_or_else(|| Error::Interchange(format!("unknown colour name {:?}", color_name)))?;

    let position = require(m, "position")?
        .as_map()
        .ok_or_else(|| Error::Interchange(":position is not a map".to_string()))?;
    // The first rect of the rect list is the one this system carries;
    // :bounding is the fallback for documents written without :rects.
    let rect_value = position
        .get("rects")
        .and_then(Value::as_vector)
        .and_then(|rects| rects.first())
        .or_else(|| position.get("bounding"))
        .ok_or_else(|| Error::Interchange(":position has neither :rects nor :bounding".to_string()))?;
    let (rect, page_size) = decode_bounding(rect_value)?;

    let text = m
        .get("content")
        .and_then(Value::as_map)
        .and_then(|c| c.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let id = match require(m, "id")? {
        Value::Uuid(id) => *id,
        Value::String(s) => Uuid::parse_str(s)
            .map_err(|e| Error::Interchange(format!("bad :id literal: {}", e)))?,
        _ => return Err(Error::Interchange(":id is not a uuid".to_string())),
    };

    let author = m.get("author").and_then(Value::as_str).map(str::to_string);

    Ok(HighlightRecord {
        page,
        page_size,
        rect,
        color,
        author,
        text,
        id,
    })
}

/// Parse a persisted interchange document back into records.
///
/// A document without a `:highlights` entry decodes to an empty
/// sequence; malformed entries are errors, not skips.
pub fn from_edn(text: &str) -> Result<Vec<HighlightRecord>> {
    let top = parse(text)?;
    let m = top
        .as_map()
        .ok_or_else(|| Error::Interchange("document is not a map".to_string()))?;
    let Some(highlights) = m.get("highlights") else {
        return Ok(Vec::new());
    };
    let items = highlights
        .as_vector()
        .ok_or_else(|| Error::Interchange(":highlights is not a vector".to_string()))?;
    items.iter().map(decode_record).collect()
}
