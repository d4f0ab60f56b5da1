// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it; this file holds the cross-cutting pieces.

/// Appended to system prompts when the endpoint cannot enforce a JSON schema.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Common instruction for every extraction prompt.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Extract ONLY information that is clearly present in the text. \
    If a field is not found or unclear, omit it (or set it to null). \
    Do NOT infer, guess, or invent details.";
