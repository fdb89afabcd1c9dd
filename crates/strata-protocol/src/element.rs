//! Element-stream encoding of a single ref.
//!
//! ```text
//! <response><success>true</success><Ref><name>HEAD</name>
//!   <objectId>..</objectId><target>refs/heads/main</target></Ref></response>
//! ```
//!
//! Only the handful of elements the protocol uses are understood. The reader
//! tolerates what other servers emit around them: attributes, self-closing
//! tags, CDATA sections and whitespace padding. It is not a general XML
//! parser.

use strata_refs::Ref;
use strata_types::ObjectId;

use crate::error::{ProtocolError, ProtocolResult};

const PROLOG: &str = "<?xml version='1.0' encoding='UTF-8'?>";
const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Root element wrapping the ref: `Ref` for lookups, `ChangedRef` for
/// updates and deletions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefElement {
    Ref,
    ChangedRef,
}

impl RefElement {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Ref => "Ref",
            Self::ChangedRef => "ChangedRef",
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn push_element(out: &mut String, tag: &str, text: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&escape(text));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// A successful response describing `r`, or no ref at all.
pub fn encode_ref_response(element: RefElement, r: Option<&Ref>) -> String {
    let mut out = String::from(PROLOG);
    out.push_str("<response><success>true</success>");
    if let Some(r) = r {
        let tag = element.tag();
        out.push_str(&format!("<{tag}>"));
        push_element(&mut out, "name", r.name());
        push_element(&mut out, "objectId", &r.object_id().to_hex());
        if let Some(target) = r.target() {
            push_element(&mut out, "target", target);
        }
        out.push_str(&format!("</{tag}>"));
    }
    out.push_str("</response>");
    out
}

pub fn encode_error_response(message: &str) -> String {
    let mut out = String::from(PROLOG);
    out.push_str("<response><success>false</success>");
    push_element(&mut out, "error", message);
    out.push_str("</response>");
    out
}

/// Where the content of the first `tag` element in `body` starts: `None`
/// if there is no such element, `Some(None)` if it is self-closing.
fn find_open(body: &str, tag: &str) -> Option<Option<usize>> {
    let mut from = 0;
    while let Some(lt) = body[from..].find('<') {
        let name_at = from + lt + 1;
        let rest = &body[name_at..];
        let boundary = rest
            .strip_prefix(tag)
            .and_then(|after| after.chars().next())
            .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace());
        if boundary {
            let gt = name_at + rest.find('>')?;
            return Some(if body[..gt].ends_with('/') {
                None
            } else {
                Some(gt + 1)
            });
        }
        from = name_at;
    }
    None
}

/// Offset of the `</tag>` closing an element whose content starts at
/// `from`. CDATA sections are skipped over.
fn find_close(body: &str, from: usize, tag: &str) -> Option<usize> {
    let mut at = from;
    loop {
        let pos = at + body[at..].find('<')?;
        let rest = &body[pos..];
        if rest.starts_with(CDATA_OPEN) {
            at = pos + rest.find(CDATA_CLOSE)? + CDATA_CLOSE.len();
            continue;
        }
        let closes = rest
            .strip_prefix("</")
            .and_then(|r| r.strip_prefix(tag))
            .is_some_and(|r| r.trim_start().starts_with('>'));
        if closes {
            return Some(pos);
        }
        at = pos + 1;
    }
}

/// Raw content of the first `tag` element in `body`.
fn element_text<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    match find_open(body, tag)? {
        None => Some(""),
        Some(start) => {
            let end = find_close(body, start, tag)?;
            Some(&body[start..end])
        }
    }
}

/// Character data of an element: CDATA sections verbatim, the rest
/// unescaped.
fn text(raw: &str) -> String {
    let mut out = String::new();
    let mut rest = raw;
    while let Some(start) = rest.find(CDATA_OPEN) {
        out.push_str(&unescape(&rest[..start]));
        let inner = &rest[start + CDATA_OPEN.len()..];
        match inner.find(CDATA_CLOSE) {
            Some(end) => {
                out.push_str(&inner[..end]);
                rest = &inner[end + CDATA_CLOSE.len()..];
            }
            None => {
                out.push_str(inner);
                rest = "";
            }
        }
    }
    out.push_str(&unescape(rest));
    out
}

/// Parse a ref response. `Ok(None)` when the response carries no ref.
pub fn parse_ref_response(body: &str) -> ProtocolResult<Option<Ref>> {
    if element_text(body, "success").map(|t| text(t).trim() == "false") == Some(true) {
        let message = element_text(body, "error").map(text).unwrap_or_default();
        return Err(ProtocolError::Remote(message.trim().to_string()));
    }
    let Some(inner) = element_text(body, RefElement::Ref.tag())
        .or_else(|| element_text(body, RefElement::ChangedRef.tag()))
    else {
        return Ok(None);
    };

    let name = element_text(inner, "name")
        .map(|t| text(t).trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ProtocolError::MalformedElement("missing <name>".into()))?;
    let object_id: ObjectId = element_text(inner, "objectId")
        .map(text)
        .ok_or_else(|| ProtocolError::MalformedElement("missing <objectId>".into()))?
        .trim()
        .parse()?;

    let target = element_text(inner, "target")
        .map(|t| text(t).trim().to_string())
        .filter(|t| !t.is_empty());
    Ok(Some(match target {
        Some(target) => Ref::Symbolic {
            name,
            target,
            object_id,
        },
        None => Ref::direct(name, object_id),
    }))
}
