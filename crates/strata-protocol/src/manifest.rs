//! Line-oriented ref listing and existence codecs.

use strata_refs::{Ref, HEAD, HEADS_PREFIX, TAGS_PREFIX};
use strata_types::ObjectId;

use crate::error::{ProtocolError, ProtocolResult};

/// `"<name> <hash>"` for a direct ref, `"<name> <target> <hash>"` for a
/// symbolic one.
pub fn format_ref_line(r: &Ref) -> String {
    match r {
        Ref::Direct { name, object_id } => format!("{name} {object_id}"),
        Ref::Symbolic {
            name,
            target,
            object_id,
        } => format!("{name} {target} {object_id}"),
    }
}

pub fn parse_ref_line(line: &str) -> ProtocolResult<Ref> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [name, hash] => Ok(Ref::direct(*name, hash.parse::<ObjectId>()?)),
        [name, target, hash] => Ok(Ref::Symbolic {
            name: (*name).to_string(),
            target: (*target).to_string(),
            object_id: hash.parse::<ObjectId>()?,
        }),
        _ => Err(ProtocolError::MalformedRefLine(line.to_string())),
    }
}

pub fn encode_manifest(refs: &[Ref]) -> String {
    let mut out = String::new();
    for r in refs {
        out.push_str(&format_ref_line(r));
        out.push('\n');
    }
    out
}

/// Branches and/or tags from a manifest body. Other lines are skipped.
pub fn parse_manifest(body: &str, heads: bool, tags: bool) -> ProtocolResult<Vec<Ref>> {
    body.lines()
        .filter(|line| {
            (heads && line.starts_with(HEADS_PREFIX)) || (tags && line.starts_with(TAGS_PREFIX))
        })
        .map(parse_ref_line)
        .collect()
}

/// The `HEAD` line of a manifest body, if the remote has one.
pub fn parse_head(body: &str) -> ProtocolResult<Option<Ref>> {
    body.lines()
        .find(|line| line.split_whitespace().next() == Some(HEAD))
        .map(parse_ref_line)
        .transpose()
}

pub fn encode_exists(exists: bool) -> &'static str {
    if exists {
        "1\n"
    } else {
        "0\n"
    }
}

/// An existence response is true if its first line starts with `1`.
pub fn parse_exists(body: &str) -> ProtocolResult<bool> {
    let line = body
        .lines()
        .next()
        .ok_or(ProtocolError::EmptyExistsResponse)?;
    Ok(line.starts_with('1'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    fn sample() -> Vec<Ref> {
        let main = Ref::direct("refs/heads/main", oid(1));
        vec![
            Ref::symbolic(HEAD, &main),
            main,
            Ref::direct("refs/remotes/origin/main", oid(3)),
            Ref::direct("refs/tags/v1", oid(2)),
        ]
    }

    #[test]
    fn symbolic_line_has_three_tokens() {
        let head = &sample()[0];
        let line = format_ref_line(head);
        assert_eq!(line.split(' ').count(), 3);
        assert_eq!(parse_ref_line(&line).unwrap(), *head);
    }

    #[test]
    fn manifest_filters_by_namespace() {
        let body = encode_manifest(&sample());
        let heads = parse_manifest(&body, true, false).unwrap();
        assert_eq!(heads.len(), 1);
        assert_eq!(heads[0].name(), "refs/heads/main");

        let both = parse_manifest(&body, true, true).unwrap();
        assert_eq!(both.len(), 2);
        assert!(parse_manifest(&body, false, false).unwrap().is_empty());
    }

    #[test]
    fn head_is_extracted() {
        let body = encode_manifest(&sample());
        let head = parse_head(&body).unwrap().unwrap();
        assert_eq!(head.target(), Some("refs/heads/main"));
        assert!(parse_head("").unwrap().is_none());
    }

    #[test]
    fn head_must_be_the_whole_name() {
        let lookalike = format!("HEADLESS {}\n", oid(9));
        assert!(parse_head(&lookalike).unwrap().is_none());

        let mut body = lookalike;
        body.push_str(&encode_manifest(&sample()));
        let head = parse_head(&body).unwrap().unwrap();
        assert_eq!(head.name(), HEAD);
        assert_eq!(head.object_id(), oid(1));
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert!(matches!(
            parse_ref_line("refs/heads/main"),
            Err(ProtocolError::MalformedRefLine(_))
        ));
        assert!(matches!(
            parse_ref_line("refs/heads/main nothex"),
            Err(ProtocolError::InvalidObjectId(_))
        ));
    }

    #[test]
    fn exists_lines() {
        assert!(parse_exists(encode_exists(true)).unwrap());
        assert!(!parse_exists(encode_exists(false)).unwrap());
        assert!(parse_exists("1 extra\n").unwrap());
        assert!(parse_exists("").is_err());
    }
}
