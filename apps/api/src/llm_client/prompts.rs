//! Cross-cutting prompt fragments shared by every LLM-facing module.

/// System fragment that forces bare-JSON output. Task prompts append their
/// own role description in front of this.
pub const JSON_ONLY_INSTRUCTION: &str = "You are an API service that outputs ONLY valid JSON. \
    Do not include markdown (no triple backticks), explanations, or formatting — \
    return a clean JSON object only.";

/// Hard rule against fabricating candidate experience. Appears in both the
/// analysis and the cover-letter prompts.
pub const NO_FABRICATION_INSTRUCTION: &str =
    "Do not invent, assume, or add experiences that are not present in the resume.";
