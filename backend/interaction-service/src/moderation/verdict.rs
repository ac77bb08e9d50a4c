/// Strict parsing of classifier replies into `ModerationVerdict`.
///
/// Replies are free text that should contain one JSON object. Markdown code
/// fences and surrounding prose are tolerated, even prose with stray braces.
/// Anything that does not yield a well-formed verdict is an error.
use serde::Deserialize;

use super::ModerationError;
use crate::models::{Issue, ModerationVerdict};

#[derive(Debug, Deserialize)]
struct RawVerdict {
    status: String,
    #[serde(default)]
    issues: Vec<RawIssue>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    subtype: Option<String>,
    severity: i64,
    #[serde(default)]
    reason: String,
}

pub fn parse_verdict(raw: &str) -> Result<ModerationVerdict, ModerationError> {
    let parsed = first_verdict_object(raw)?;

    let issues = parsed
        .issues
        .into_iter()
        .map(into_issue)
        .collect::<Result<Vec<_>, _>>()?;

    match parsed.status.trim().to_ascii_lowercase().as_str() {
        // A "clean" verdict that still lists issues is treated as flagged.
        "clean" if issues.is_empty() => Ok(ModerationVerdict::clean()),
        "clean" | "flagged" if !issues.is_empty() => Ok(ModerationVerdict::flagged(issues)),
        "flagged" => Err(ModerationError::InvalidShape(
            "flagged verdict without issues".to_string(),
        )),
        other => Err(ModerationError::InvalidShape(format!(
            "unknown status '{}'",
            other
        ))),
    }
}

fn into_issue(raw: RawIssue) -> Result<Issue, ModerationError> {
    let kind = raw.kind.trim().to_string();
    if kind.is_empty() {
        return Err(ModerationError::InvalidShape("issue without type".to_string()));
    }

    let severity = u8::try_from(raw.severity)
        .ok()
        .filter(|s| (Issue::MIN_SEVERITY..=Issue::MAX_SEVERITY).contains(s))
        .ok_or_else(|| {
            ModerationError::InvalidShape(format!("severity {} out of range 1-5", raw.severity))
        })?;

    let subtype = raw
        .subtype
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let reason = raw.reason.trim().to_string();
    if reason.is_empty() {
        return Err(ModerationError::InvalidShape(format!(
            "issue '{}' without reason",
            kind
        )));
    }

    Ok(Issue {
        kind,
        subtype,
        severity,
        reason,
    })
}

/// First `{` from which a verdict object deserializes. Text after the object
/// is ignored, so fences and trailing prose never reach the parser.
fn first_verdict_object(raw: &str) -> Result<RawVerdict, ModerationError> {
    let mut last_error = None;

    for (start, _) in raw.match_indices('{') {
        let mut stream =
            serde_json::Deserializer::from_str(&raw[start..]).into_iter::<RawVerdict>();
        match stream.next() {
            Some(Ok(verdict)) => return Ok(verdict),
            Some(Err(e)) => last_error = Some(e.to_string()),
            None => {}
        }
    }

    Err(ModerationError::Unparseable(
        last_error.unwrap_or_else(|| "no JSON object found".to_string()),
    ))
}
