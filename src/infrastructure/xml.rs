//! Reader and writer for the ParameterList XML dialect used by input decks.
//!
//! The dialect is a small fixed shape: nested `<ParameterList name=..>`
//! elements with `<Parameter name=.. type=.. value=../>` leaves. Comments
//! are dropped on read. Writing always emits the canonical two-space
//! indented form with a `type="ParameterList"` attribute on every list, and
//! replaces the target file atomically.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;

use generational_arena::Index;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_until, take_while, take_while1};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::{cut, eof, opt, value};
use nom::error::{context, convert_error, ContextError, ErrorKind, ParseError, VerboseError};
use nom::multi::many0;
use nom::sequence::{delimited, preceded};
use nom::IResult;
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::domain::{NodeKind, ParamTree, ParamValue};
use crate::infrastructure::error::{InfraError, InfraResult};

type PResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// Parse a deck from a string.
pub fn parse_str(input: &str) -> InfraResult<ParamTree> {
    parse_document(input).map_err(|message| InfraError::Parse {
        context: "input".to_string(),
        message,
    })
}

/// Read and parse a deck file.
#[instrument(level = "debug")]
pub fn load(path: &Path) -> InfraResult<ParamTree> {
    let content = fs::read_to_string(path).map_err(|e| InfraError::read(path, e))?;
    parse_document(&content).map_err(|message| InfraError::Parse {
        context: path.display().to_string(),
        message,
    })
}

/// Render a deck to its canonical serialized form.
pub fn to_xml(tree: &ParamTree) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    write_node(tree, tree.root(), 0, &mut out);
    out
}

/// Serialize a deck to `path`, replacing any existing file atomically.
///
/// The content is staged in a temporary file next to the target so a crash
/// or full disk never leaves a half-written deck behind.
#[instrument(level = "debug", skip(tree))]
pub fn save(tree: &ParamTree, path: &Path) -> InfraResult<()> {
    let rendered = to_xml(tree);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| InfraError::write(path, e))?;
    tmp.write_all(rendered.as_bytes())
        .map_err(|e| InfraError::write(path, e))?;
    tmp.persist(path).map_err(|e| InfraError::write(path, e.error))?;
    debug!("wrote {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------- reading

#[derive(Debug)]
enum RawElem {
    List { name: String, children: Vec<RawElem> },
    Param { name: String, ty: String, value: String },
}

fn parse_document(input: &str) -> Result<ParamTree, String> {
    let root = match document(input) {
        Ok((_, root)) => root,
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            return Err(convert_error(input, e))
        }
        Err(nom::Err::Incomplete(_)) => return Err("unexpected end of input".to_string()),
    };
    build_tree(root)
}

fn document(input: &str) -> PResult<'_, RawElem> {
    let (input, _) = misc0(input)?;
    let (input, _) = opt(xml_decl)(input)?;
    let (input, _) = misc0(input)?;
    let (input, root) = context("root ParameterList", parameter_list)(input)?;
    let (input, _) = misc0(input)?;
    let (input, _) = eof(input)?;
    Ok((input, root))
}

/// Whitespace and comments, zero or more.
fn misc0(input: &str) -> PResult<'_, ()> {
    value((), many0(alt((value((), multispace1), comment))))(input)
}

fn comment(input: &str) -> PResult<'_, ()> {
    value((), delimited(tag("<!--"), take_until("-->"), tag("-->")))(input)
}

fn xml_decl(input: &str) -> PResult<'_, ()> {
    value((), delimited(tag("<?"), take_until("?>"), tag("?>")))(input)
}

fn element(input: &str) -> PResult<'_, RawElem> {
    // Lists first: "<Parameter" is a prefix of "<ParameterList"
    alt((parameter_list, parameter))(input)
}

fn parameter_list(input: &str) -> PResult<'_, RawElem> {
    let start = input;
    let (input, _) = tag("<ParameterList")(input)?;
    let (input, mut attrs) = attributes(input)?;
    let name = take_attr(&mut attrs, "name")
        .ok_or_else(|| missing_attr(start, "ParameterList name attribute"))?;
    let (input, _) = multispace0(input)?;
    let (input, self_closed) = alt((value(true, tag("/>")), value(false, char('>'))))(input)?;
    if self_closed {
        return Ok((
            input,
            RawElem::List {
                name,
                children: Vec::new(),
            },
        ));
    }
    let (input, children) = many0(preceded(misc0, element))(input)?;
    let (input, _) = misc0(input)?;
    let (input, _) = context("closing ParameterList tag", cut(tag("</ParameterList>")))(input)?;
    Ok((input, RawElem::List { name, children }))
}

fn parameter(input: &str) -> PResult<'_, RawElem> {
    let start = input;
    let (input, _) = tag("<Parameter")(input)?;
    let (input, mut attrs) = attributes(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = alt((tag("/>"), tag("></Parameter>")))(input)?;
    let name = take_attr(&mut attrs, "name")
        .ok_or_else(|| missing_attr(start, "Parameter name attribute"))?;
    let ty = take_attr(&mut attrs, "type")
        .ok_or_else(|| missing_attr(start, "Parameter type attribute"))?;
    let value = take_attr(&mut attrs, "value")
        .ok_or_else(|| missing_attr(start, "Parameter value attribute"))?;
    Ok((input, RawElem::Param { name, ty, value }))
}

fn attributes(input: &str) -> PResult<'_, Vec<(&str, String)>> {
    many0(preceded(multispace1, attribute))(input)
}

fn attribute(input: &str) -> PResult<'_, (&str, String)> {
    let (input, name) = attr_name(input)?;
    let (input, _) = delimited(multispace0, char('='), multispace0)(input)?;
    let (input, raw) = quoted(input)?;
    Ok((input, (name, decode_entities(raw))))
}

fn attr_name(input: &str) -> PResult<'_, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'))(input)
}

fn quoted(input: &str) -> PResult<'_, &str> {
    alt((
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
    ))(input)
}

fn take_attr(attrs: &mut Vec<(&str, String)>, key: &str) -> Option<String> {
    let pos = attrs.iter().position(|(k, _)| *k == key)?;
    Some(attrs.remove(pos).1)
}

fn missing_attr<'a>(input: &'a str, what: &'static str) -> nom::Err<VerboseError<&'a str>> {
    let err = VerboseError::from_error_kind(input, ErrorKind::Verify);
    nom::Err::Failure(VerboseError::add_context(input, what, err))
}

fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let (replacement, len) = if rest.starts_with("&amp;") {
            ("&", 5)
        } else if rest.starts_with("&lt;") {
            ("<", 4)
        } else if rest.starts_with("&gt;") {
            (">", 4)
        } else if rest.starts_with("&quot;") {
            ("\"", 6)
        } else if rest.starts_with("&apos;") {
            ("'", 6)
        } else {
            ("&", 1)
        };
        out.push_str(replacement);
        rest = &rest[len..];
    }
    out.push_str(rest);
    out
}

fn build_tree(root: RawElem) -> Result<ParamTree, String> {
    match root {
        RawElem::List { name, children } => {
            let mut tree = ParamTree::new(&name);
            let root_idx = tree.root();
            for child in children {
                build_into(&mut tree, root_idx, child)?;
            }
            Ok(tree)
        }
        RawElem::Param { name, .. } => {
            Err(format!("top level entry \"{name}\" is not a ParameterList"))
        }
    }
}

fn build_into(tree: &mut ParamTree, parent: Index, elem: RawElem) -> Result<(), String> {
    match elem {
        RawElem::List { name, children } => {
            let idx = tree
                .append_list(parent, &name)
                .map_err(|e| e.to_string())?;
            for child in children {
                build_into(tree, idx, child)?;
            }
        }
        RawElem::Param { name, ty, value } => {
            let value = decode_value(&name, &ty, value)?;
            tree.append_leaf(parent, &name, value)
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

fn decode_value(name: &str, ty: &str, raw: String) -> Result<ParamValue, String> {
    match ty {
        "string" => Ok(ParamValue::Str(raw)),
        "double" => raw.trim().parse::<f64>().map(ParamValue::Double).map_err(|_| {
            format!("entry \"{name}\" declares type double but value \"{raw}\" is not a number")
        }),
        _ => Ok(ParamValue::Other {
            ty: ty.to_string(),
            raw,
        }),
    }
}

// ---------------------------------------------------------------- writing

fn write_node(tree: &ParamTree, idx: Index, depth: usize, out: &mut String) {
    let node = tree.node(idx);
    let pad = "  ".repeat(depth);
    match &node.kind {
        NodeKind::List(children) => {
            if children.is_empty() {
                let _ = writeln!(
                    out,
                    "{pad}<ParameterList name=\"{}\" type=\"ParameterList\"/>",
                    escape(&node.name)
                );
            } else {
                let _ = writeln!(
                    out,
                    "{pad}<ParameterList name=\"{}\" type=\"ParameterList\">",
                    escape(&node.name)
                );
                for &child in children {
                    write_node(tree, child, depth + 1, out);
                }
                let _ = writeln!(out, "{pad}</ParameterList>");
            }
        }
        NodeKind::Leaf(value) => {
            let _ = writeln!(
                out,
                "{pad}<Parameter name=\"{}\" type=\"{}\" value=\"{}\"/>",
                escape(&node.name),
                escape(value.type_name()),
                escape(&value.to_string())
            );
        }
    }
}

fn escape(raw: &str) -> Cow<'_, str> {
    if !raw.bytes().any(|b| matches!(b, b'&' | b'<' | b'>' | b'"')) {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
