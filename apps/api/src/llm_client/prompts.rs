// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Persona line that opens every generation prompt.
pub const EXPERT_PERSONA: &str = "You are an expert in creating professional cover letters.";

/// Closing instruction that keeps the model from wrapping output in commentary.
/// The markup normalizer only understands raw LaTeX, so this line is load-bearing.
pub const LATEX_ONLY_INSTRUCTION: &str =
    "Output only the complete LaTeX code for the new cover letter, nothing else.";
