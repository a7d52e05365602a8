//! Prompt constants for the tailoring pipeline.
//!
//! The analysis prompt pins the exact JSON key paths the report extractor
//! reads (`ResumeImprovementSuggestions`, `JobDescription.CompanyName`,
//! `scoring.atsCompatibilityScore`) — change them together or not at all.

use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NO_FABRICATION_INSTRUCTION};

/// Role line for the ATS analysis call; composed via [`analysis_system`].
pub const ANALYSIS_SYSTEM: &str =
    "You are an Applicant Tracking System (ATS) simulator used by a hiring company.";

/// Full system prompt for the analysis call: role + bare-JSON + no-fabrication.
pub fn analysis_system() -> String {
    format!("{ANALYSIS_SYSTEM} {JSON_ONLY_INSTRUCTION} {NO_FABRICATION_INSTRUCTION}")
}

/// Sampling temperature for the analysis call — low, the output is a report.
pub const ANALYSIS_TEMPERATURE: f32 = 0.4;

/// Analysis prompt template. Replace `{jd_text}` and `{resume_text}`.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Compare the resume with the job description (JD) provided and simulate a full ATS screening and optimization pass.

Perform the following steps:

1. Parse the resume: contact information, professional summary, work experience, education, skills and tools, certifications.
2. Parse the JD: company name, job title, required skills and keywords, responsibilities, preferred qualifications.
3. Evaluate the resume against the JD: hard and soft skill match, title and role alignment, years and scope of experience, education compatibility, ATS-friendly formatting.
4. Assign an ATS compatibility score (0-100) based on keyword match, role alignment, skill match, education relevance, and formatting compliance.
5. Suggest phrase replacements that better align the resume with the JD:
   - Reframe existing experience using the JD's language.
   - For each suggestion include:
     "Was": the original phrase exactly as it appears in the resume
     "New": the improved phrase
     "Section": which resume section it came from
   - Classify Section into one of: Head, Target Position, Professional Profile, Expertises, Accomplishments, Career Experience, Skills, Certifications, Education, Others (fallback if unknown).

Return a single valid JSON object with this EXACT shape:
{
  "JobDescription": {
    "CompanyName": "...",
    "JobTitle": "..."
  },
  "scoring": {
    "atsCompatibilityScore": 78
  },
  "ResumeImprovementSuggestions": [
    {"Was": "...", "New": "...", "Section": "Skills"}
  ]
}

Job Description:
{jd_text}

Resume:
{resume_text}"#;

/// Role line for the cover-letter call; composed via [`cover_letter_system`].
pub const COVER_LETTER_SYSTEM: &str =
    "You are a professional career assistant generating compelling cover letters.";

/// Full system prompt for the cover-letter call.
pub fn cover_letter_system() -> String {
    format!("{COVER_LETTER_SYSTEM} {NO_FABRICATION_INSTRUCTION}")
}

/// Sampling temperature for the cover-letter call — higher, the output is prose.
pub const COVER_LETTER_TEMPERATURE: f32 = 0.7;

/// Cover-letter prompt template. Replace `{jd_text}` and `{resume_text}`.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Generate a professional cover letter based on the provided resume and job description.
Constraints:
- Do NOT directly mention the company name from the job description.
- Refer generically to "this opportunity", "this position", or "your organization".
- Focus on matching the candidate's skills with the position requirements.
- Maintain a professional and engaging tone.
- Make the cover letter concise and compelling.

Job Description:
{jd_text}

Resume:
{resume_text}"#;

/// Fills a prompt template's `{jd_text}` / `{resume_text}` placeholders.
pub fn fill_template(template: &str, jd_text: &str, resume_text: &str) -> String {
    template
        .replace("{jd_text}", jd_text)
        .replace("{resume_text}", resume_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_replaces_both_placeholders() {
        let filled = fill_template("JD: {jd_text} / CV: {resume_text}", "backend role", "my cv");
        assert_eq!(filled, "JD: backend role / CV: my cv");
    }

    #[test]
    fn test_analysis_prompt_pins_report_key_paths() {
        // The extractor depends on these exact keys.
        assert!(ANALYSIS_PROMPT_TEMPLATE.contains("ResumeImprovementSuggestions"));
        assert!(ANALYSIS_PROMPT_TEMPLATE.contains("atsCompatibilityScore"));
        assert!(ANALYSIS_PROMPT_TEMPLATE.contains("CompanyName"));
        assert!(ANALYSIS_PROMPT_TEMPLATE.contains("\"Was\""));
    }
}
