// Résumé structuring prompt templates and response schema.

use serde_json::{json, Value};

pub const SCHEMA_NAME: &str = "candidate_extraction";

pub const RESUME_PARSE_SYSTEM: &str = "\
You are a resume parser that extracts candidate information from resume text.

RULES:
- Return success=true if you find at least some candidate information (name, email, or clear professional content)
- Return success=false only if the text contains no candidate information at all, and explain why in error

FIELD GUIDELINES:
- first_name/last_name: Extract if the name is clearly visible
- email: Extract if a valid email address is found
- phone: Extract if a phone number is found (any format)
- linkedin_url: Extract if a LinkedIn profile URL is found
- skills: Technical skills, programming languages and tools mentioned
- experience_years: Calculate from work history dates if available
- current_role: Most recent job title
- education: Degree and school information
- location: Current location
- summary: A brief 1-2 sentence summary if sufficient information is available";

pub const RESUME_PARSE_PROMPT: &str = "Extract candidate information from this resume text:

{resume_text}";

/// Describes the expected object when the endpoint cannot enforce a schema.
pub const RESUME_OBJECT_SHAPE: &str = r#"Respond with a JSON object of exactly this shape:
{
  "success": boolean,
  "candidate": {
    "first_name": string | null, "last_name": string | null,
    "email": string | null, "phone": string | null, "linkedin_url": string | null,
    "skills": [string] | null, "experience_years": number | null,
    "current_role": string | null, "education": string | null,
    "location": string | null, "summary": string | null
  },
  "error": string | null
}"#;

pub fn build_prompt(resume_text: &str) -> String {
    RESUME_PARSE_PROMPT.replace("{resume_text}", resume_text)
}

fn optional(ty: &str, description: &str) -> Value {
    json!({ "type": [ty, "null"], "description": description })
}

/// Strict-mode response schema. Strict mode requires every property to be
/// listed as required, so absent fields are expressed as `null`.
pub fn candidate_schema() -> Value {
    let candidate_fields = [
        ("first_name", optional("string", "First name if found")),
        ("last_name", optional("string", "Last name if found")),
        ("email", optional("string", "Email address if found")),
        ("phone", optional("string", "Phone number if found")),
        ("linkedin_url", optional("string", "LinkedIn URL if found")),
        (
            "skills",
            json!({
                "type": ["array", "null"],
                "items": { "type": "string" },
                "description": "Technical skills if found"
            }),
        ),
        (
            "experience_years",
            optional("number", "Years of experience if determinable"),
        ),
        ("current_role", optional("string", "Current job title if found")),
        ("education", optional("string", "Education details if found")),
        ("location", optional("string", "Location if found")),
        (
            "summary",
            optional("string", "Professional summary if creatable from content"),
        ),
    ];

    let required: Vec<&str> = candidate_fields.iter().map(|(name, _)| *name).collect();
    let properties: serde_json::Map<String, Value> = candidate_fields
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect();

    json!({
        "type": "object",
        "properties": {
            "success": {
                "type": "boolean",
                "description": "Whether candidate information was found"
            },
            "candidate": {
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": false
            },
            "error": optional("string", "Error message if parsing failed")
        },
        "required": ["success", "candidate", "error"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_embeds_text() {
        let prompt = build_prompt("Jane Doe, jane@x.com");
        assert!(prompt.ends_with("Jane Doe, jane@x.com"));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[test]
    fn test_schema_requires_every_candidate_property() {
        let schema = candidate_schema();
        let candidate = &schema["properties"]["candidate"];
        let props = candidate["properties"].as_object().unwrap();
        let required: Vec<&str> = candidate["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(props.len(), 11);
        for key in props.keys() {
            assert!(required.contains(&key.as_str()), "{key} not required");
        }
        assert_eq!(candidate["additionalProperties"], json!(false));
    }

    #[test]
    fn test_schema_top_level_success_is_boolean() {
        let schema = candidate_schema();
        assert_eq!(schema["properties"]["success"]["type"], json!("boolean"));
        assert_eq!(schema["additionalProperties"], json!(false));
    }
}
