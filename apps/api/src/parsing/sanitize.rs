//! Field Sanitizer — whitelists, trims and filters model output into a `Candidate`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parsing::errors::{ErrorKind, ParseError};
use crate::parsing::models::{Candidate, FoundFields, RawCandidate};

/// Substituted for absent name parts under `MissingNamePolicy::Placeholder`.
pub const NAME_PLACEHOLDER: &str = "Unknown";

/// What to do when the model found neither a first nor a last name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingNamePolicy {
    #[default]
    Reject,
    Placeholder,
}

impl std::str::FromStr for MissingNamePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(MissingNamePolicy::Reject),
            "placeholder" => Ok(MissingNamePolicy::Placeholder),
            other => Err(format!("unknown missing-name policy '{other}'")),
        }
    }
}

/// Sanitizes raw model output. The returned manifest is derived from the
/// sanitized record, so it lists exactly the populated fields.
pub fn sanitize(
    raw: &RawCandidate,
    policy: MissingNamePolicy,
) -> Result<(Candidate, FoundFields), ParseError> {
    let mut candidate = Candidate {
        first_name: text(&raw.first_name),
        last_name: text(&raw.last_name),
        email: text(&raw.email),
        phone: text(&raw.phone),
        linkedin_url: text(&raw.linkedin_url),
        skills: skills(&raw.skills),
        notes: text(&raw.summary),
        current_role: text(&raw.current_role),
        education: text(&raw.education),
        location: text(&raw.location),
        experience_years: years(&raw.experience_years),
    };

    if candidate.first_name.is_none() && candidate.last_name.is_none() {
        match policy {
            MissingNamePolicy::Reject => {
                return Err(ParseError::new(
                    ErrorKind::MissingName,
                    "Could not find the candidate's name in the resume",
                ));
            }
            MissingNamePolicy::Placeholder => {
                candidate.first_name = Some(NAME_PLACEHOLDER.to_string());
                candidate.last_name = Some(NAME_PLACEHOLDER.to_string());
            }
        }
    }

    let found = candidate.found_fields();
    Ok((candidate, found))
}

fn text(value: &Option<Value>) -> Option<String> {
    value
        .as_ref()?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Keeps non-empty string entries, trimmed, dropping case-insensitive repeats.
fn skills(value: &Option<Value>) -> Option<Vec<String>> {
    let items = value.as_ref()?.as_array()?;
    let mut seen = std::collections::HashSet::new();
    let skills: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .collect();
    (!skills.is_empty()).then_some(skills)
}

fn years(value: &Option<Value>) -> Option<f64> {
    value
        .as_ref()?
        .as_f64()
        .filter(|y| y.is_finite() && *y >= 0.0)
}
