use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parsing::errors::{ErrorKind, ParseError};

/// Candidate fields exactly as the model returned them.
///
/// Every field is kept as a raw JSON value so that a wrong type on one field
/// (a numeric string for `experience_years`, a number inside `skills`) drops
/// that field instead of failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCandidate {
    pub first_name: Option<Value>,
    pub last_name: Option<Value>,
    pub email: Option<Value>,
    pub phone: Option<Value>,
    pub linkedin_url: Option<Value>,
    pub skills: Option<Value>,
    pub experience_years: Option<Value>,
    pub current_role: Option<Value>,
    pub education: Option<Value>,
    pub location: Option<Value>,
    pub summary: Option<Value>,
}

/// Top-level object the model is asked to produce.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelExtraction {
    pub success: Option<bool>,
    pub candidate: Option<RawCandidate>,
    pub error: Option<String>,
}

/// A sanitized candidate: every string is trimmed and non-empty, every list
/// is non-empty, and absent fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<f64>,
}

impl Candidate {
    /// Names of the populated fields, in envelope order.
    pub fn found_fields(&self) -> FoundFields {
        let mut fields = Vec::new();
        let mut note = |name: &str, present: bool| {
            if present {
                fields.push(name.to_string());
            }
        };
        note("first_name", self.first_name.is_some());
        note("last_name", self.last_name.is_some());
        note("email", self.email.is_some());
        note("phone", self.phone.is_some());
        note("linkedin_url", self.linkedin_url.is_some());
        note("skills", self.skills.is_some());
        note("notes", self.notes.is_some());
        note("current_role", self.current_role.is_some());
        note("education", self.education.is_some());
        note("location", self.location.is_some());
        note("experience_years", self.experience_years.is_some());
        FoundFields(fields)
    }

    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&Candidate> for RawCandidate {
    fn from(c: &Candidate) -> Self {
        let text = |v: &Option<String>| v.as_ref().map(|s| Value::String(s.clone()));
        RawCandidate {
            first_name: text(&c.first_name),
            last_name: text(&c.last_name),
            email: text(&c.email),
            phone: text(&c.phone),
            linkedin_url: text(&c.linkedin_url),
            skills: c
                .skills
                .as_ref()
                .map(|s| Value::Array(s.iter().cloned().map(Value::String).collect())),
            experience_years: c.experience_years.map(Value::from),
            current_role: text(&c.current_role),
            education: text(&c.education),
            location: text(&c.location),
            summary: text(&c.notes),
        }
    }
}

/// Field names reported back to the user as "detected".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoundFields(pub Vec<String>);

impl FoundFields {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Successful pipeline result.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResume {
    pub candidate: Candidate,
    pub found_fields: FoundFields,
}

impl ParsedResume {
    pub fn message(&self) -> String {
        format!(
            "Successfully extracted {} fields from resume",
            self.found_fields.len()
        )
    }
}

/// Terminal result of one parse request.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Success {
        candidate: Candidate,
        found_fields: FoundFields,
        message: String,
    },
    Failure {
        reason: ErrorKind,
        message: String,
    },
}

impl From<Result<ParsedResume, ParseError>> for ParseOutcome {
    fn from(result: Result<ParsedResume, ParseError>) -> Self {
        match result {
            Ok(parsed) => {
                let message = parsed.message();
                ParseOutcome::Success {
                    candidate: parsed.candidate,
                    found_fields: parsed.found_fields,
                    message,
                }
            }
            Err(e) => ParseOutcome::Failure {
                reason: e.kind,
                message: e.message,
            },
        }
    }
}

/// JSON envelope returned by `POST /api/v1/parse-resume`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_fields: Option<FoundFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ErrorKind>,
}

impl ParseResponse {
    pub fn error_only(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

impl From<ParseOutcome> for ParseResponse {
    fn from(outcome: ParseOutcome) -> Self {
        match outcome {
            ParseOutcome::Success {
                candidate,
                found_fields,
                message,
            } => ParseResponse {
                success: true,
                candidate: Some(candidate),
                found_fields: Some(found_fields),
                message: Some(message),
                ..Default::default()
            },
            ParseOutcome::Failure { reason, message } => ParseResponse {
                success: false,
                error: Some(message),
                reason: Some(reason),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jane() -> Candidate {
        Candidate {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            email: Some("jane@x.com".into()),
            skills: Some(vec!["Go".into(), "Rust".into()]),
            ..Default::default()
        }
    }

    #[test]
    fn test_found_fields_follow_envelope_order() {
        let mut c = jane();
        c.experience_years = Some(4.0);
        c.notes = Some("Backend engineer".into());
        assert_eq!(
            c.found_fields().0,
            vec![
                "first_name",
                "last_name",
                "email",
                "skills",
                "notes",
                "experience_years"
            ]
        );
    }

    #[test]
    fn test_envelope_round_trip_matches_manifest() {
        let c = jane();
        let parsed = ParsedResume {
            found_fields: c.found_fields(),
            candidate: c,
        };
        let response = ParseResponse::from(ParseOutcome::from(Ok(parsed)));
        let json = serde_json::to_value(&response).unwrap();

        let keys: Vec<String> = json["candidate"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        let manifest: Vec<String> = serde_json::from_value(json["found_fields"].clone()).unwrap();

        let mut sorted_keys = keys.clone();
        sorted_keys.sort();
        let mut sorted_manifest = manifest.clone();
        sorted_manifest.sort();
        assert_eq!(sorted_keys, sorted_manifest);

        let back: ParseResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back.candidate.unwrap().found_fields().0, manifest);
    }

    #[test]
    fn test_failure_envelope_shape() {
        let outcome = ParseOutcome::from(Err(ParseError::insufficient_text()));
        let json = serde_json::to_value(ParseResponse::from(outcome)).unwrap();
        assert_eq!(json["success"], json!(false));
        assert_eq!(json["reason"], json!("insufficient_text"));
        assert!(json.get("candidate").is_none());
        assert!(json["error"].as_str().unwrap().contains("scanned image"));
    }

    #[test]
    fn test_raw_candidate_tolerates_wrong_types() {
        let raw: RawCandidate = serde_json::from_value(json!({
            "first_name": 42,
            "skills": "Rust, Go",
            "experience_years": "five",
            "unknown_field": true
        }))
        .unwrap();
        assert_eq!(raw.first_name, Some(json!(42)));
        assert_eq!(raw.experience_years, Some(json!("five")));
    }

    #[test]
    fn test_model_extraction_defaults_when_fields_missing() {
        let m: ModelExtraction = serde_json::from_value(json!({})).unwrap();
        assert!(m.success.is_none());
        assert!(m.candidate.is_none());
    }

    #[test]
    fn test_display_name_skips_missing_parts() {
        let c = Candidate {
            last_name: Some("Doe".into()),
            ..Default::default()
        };
        assert_eq!(c.display_name(), "Doe");
    }
}
