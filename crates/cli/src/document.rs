//! crates/cli/src/document.rs
//! Rendering and parsing of the ACL documents the CLI reads and prints.

use std::io::{self, Write};
use std::path::Path;

use model::{Acl, Subject, TextError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What `get --json` prints for one path.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AclDocument {
    /// The path the ACL was read from.
    pub file: String,
    /// Owning user id.
    pub owner: u32,
    /// Owning group id.
    pub group: u32,
    /// The ACL.
    pub acl: Acl,
}

/// Either a bare ACL or a full [`AclDocument`]; `set --json` accepts both.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonInput {
    Bare(Acl),
    Document { acl: Acl },
}

/// Failure to parse ACL input.
#[derive(Debug, Error)]
pub enum InputError {
    /// ACL text did not parse.
    #[error("invalid ACL text: {0}")]
    Text(#[from] TextError),
    /// JSON did not parse.
    #[error("invalid ACL JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses ACL text.
pub fn parse_text(input: &str) -> Result<Acl, InputError> {
    Ok(Acl::from_text(input)?)
}

/// Parses a JSON ACL or document.
pub fn parse_json(input: &str) -> Result<Acl, InputError> {
    Ok(match serde_json::from_str(input)? {
        JsonInput::Bare(acl) | JsonInput::Document { acl } => acl,
    })
}

/// Writes `acl` as text under a `getfacl`-style header.
pub fn write_text<W: Write>(
    out: &mut W,
    path: &Path,
    owner: &str,
    group: &str,
    acl: &Acl,
) -> io::Result<()> {
    writeln!(out, "# file: {}", path.display())?;
    writeln!(out, "# owner: {owner}")?;
    writeln!(out, "# group: {group}")?;
    write!(out, "{acl}")?;
    writeln!(out)
}

/// Writes `document` as one line of JSON.
pub fn write_json<W: Write>(out: &mut W, document: &AclDocument) -> io::Result<()> {
    serde_json::to_writer(&mut *out, document)?;
    writeln!(out)
}

/// Name for the header lines: the account name when known, else the id.
pub(crate) fn principal_label(name: Option<String>, subject: Subject) -> String {
    name.unwrap_or_else(|| match subject {
        Subject::User(id) | Subject::Group(id) => id.to_string(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{AclEntry, Permissions};

    #[test]
    fn text_output_has_header_then_entries() {
        let mut out = Vec::new();
        write_text(&mut out, Path::new("/srv/a"), "alice", "staff", &Acl::from_mode(0o640))
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "# file: /srv/a\n# owner: alice\n# group: staff\nuser::rw-\ngroup::r--\nother::---\n\n"
        );
    }

    #[test]
    fn json_accepts_bare_acls_and_documents() {
        let mut acl = Acl::from_mode(0o600);
        acl.push(AclEntry::new(Subject::User(1000), Permissions::READ));
        let bare = serde_json::to_string(&acl).unwrap();
        assert_eq!(parse_json(&bare).unwrap(), acl);

        let document = AclDocument {
            file: "/srv/a".to_owned(),
            owner: 0,
            group: 0,
            acl: acl.clone(),
        };
        let mut line = Vec::new();
        write_json(&mut line, &document).unwrap();
        assert_eq!(parse_json(std::str::from_utf8(&line).unwrap()).unwrap(), acl);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_text("user:bob:rwx"), Err(InputError::Text(_))));
        assert!(matches!(parse_json("{\"acl\": 3}"), Err(InputError::Json(_))));
    }

    #[test]
    fn labels_fall_back_to_ids() {
        assert_eq!(principal_label(None, Subject::User(501)), "501");
        assert_eq!(principal_label(Some("alice".into()), Subject::User(501)), "alice");
    }
}
