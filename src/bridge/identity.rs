// ABOUTME: Identity and version probes parsed from deploy CLI output.
// ABOUTME: JSON identity is preferred; the text heuristic is an isolated fallback.

use serde::Deserialize;

/// Who the deploy CLI is logged in as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub logged_in: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "username")]
    pub user: Option<String>,
}

/// Labels the CLI prints next to identity fields in its human output.
const IDENTITY_LABELS: &[&str] = &["Email:", "User:", "Username:", "Logged in as"];
const LOGGED_OUT_MARKER: &str = "not logged in";

impl Identity {
    /// Parse `whoami` output, preferring `--json` and falling back to text.
    pub fn parse(output: &str) -> Self {
        match serde_json::from_str::<Identity>(output.trim()) {
            Ok(identity) => identity,
            Err(_) => Self::from_text(output),
        }
    }

    /// Infer identity from human-readable output.
    ///
    /// Fails closed: anything that is not recognisably logged in counts as logged out.
    pub fn from_text(text: &str) -> Self {
        if text.to_lowercase().contains(LOGGED_OUT_MARKER) {
            return Identity::default();
        }

        let mut identity = Identity::default();
        for line in text.lines().map(str::trim) {
            for label in IDENTITY_LABELS {
                if let Some(rest) = line.strip_prefix(label) {
                    identity.logged_in = true;
                    let value = rest.trim().to_string();
                    if value.is_empty() {
                        continue;
                    }
                    if value.contains('@') && identity.email.is_none() {
                        identity.email = Some(value);
                    } else if identity.user.is_none() {
                        identity.user = Some(value);
                    }
                }
            }
        }
        identity
    }

    /// Best label for display (email, then user name).
    pub fn display_name(&self) -> Option<&str> {
        self.email.as_deref().or(self.user.as_deref())
    }
}

/// Extract the first `MAJOR.MINOR.PATCH` version from free text.
///
/// A leading `v` is skipped and a pre-release or build suffix
/// (`-beta.1`, `+sha`) is kept.
pub fn parse_version(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut start = 0;

    while start < bytes.len() {
        let at_boundary = start == 0
            || !bytes[start - 1].is_ascii_alphanumeric()
            || bytes[start - 1] == b'v';
        if bytes[start].is_ascii_digit()
            && at_boundary
            && let Some(end) = match_core_version(bytes, start)
        {
            let end = extend_suffix(bytes, end);
            return Some(text[start..end].to_string());
        }
        start += 1;
    }
    None
}

/// Match `\d+\.\d+\.\d+` at `start`, returning the end offset.
fn match_core_version(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start;
    for part in 0..3 {
        let digits_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == digits_start {
            return None;
        }
        if part < 2 {
            if pos >= bytes.len() || bytes[pos] != b'.' {
                return None;
            }
            pos += 1;
        }
    }
    Some(pos)
}

fn extend_suffix(bytes: &[u8], end: usize) -> usize {
    if end >= bytes.len() || !matches!(bytes[end], b'-' | b'+') {
        return end;
    }
    let mut pos = end + 1;
    while pos < bytes.len()
        && (bytes[pos].is_ascii_alphanumeric() || matches!(bytes[pos], b'.' | b'-' | b'+'))
    {
        pos += 1;
    }
    // A lone separator is not a suffix.
    if pos == end + 1 { end } else { pos }
}
