// Tailoring pipeline: LLM analysis → suggestion parsing → document patching →
// cover letter → activity log. All LLM calls go through llm_client — no
// direct Anthropic calls here.

pub mod analysis;
pub mod cover_letter;
pub mod handlers;
pub mod naming;
pub mod patcher;
pub mod prompts;
pub mod suggestions;
