// All LLM prompt text for cover letter generation.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{EXPERT_PERSONA, LATEX_ONLY_INSTRUCTION};

/// Numbered rules given to the model. The markup normalizer only understands
/// the sample's command set, so keeping the structure intact is a hard rule.
pub const COVER_LETTER_INSTRUCTIONS: &str = "\
1. Create a new cover letter that follows the EXACT structure and formatting of the sample LaTeX template
2. Maintain all LaTeX commands, document structure, and formatting from the sample
3. Replace the content with personalized information based on the resume and job description
4. Highlight relevant skills, experiences, and achievements from the resume that match the job requirements
5. Ensure the tone and style are professional and compelling
6. Keep the same LaTeX document class, packages, and overall structure as the sample
7. Only modify the actual content (text) while preserving all LaTeX formatting commands";

/// Composes the single generation prompt.
///
/// Inputs are interpolated in one pass so text inside one input can never be
/// mistaken for a placeholder of another.
pub fn build_cover_letter_prompt(
    resume: &str,
    job_description: &str,
    sample_template: &str,
) -> String {
    format!(
        "\n{EXPERT_PERSONA} Your task is to generate a new cover letter based on the following inputs:\n\
         \n\
         RESUME CONTENT:\n\
         {resume}\n\
         \n\
         JOB DESCRIPTION:\n\
         {job_description}\n\
         \n\
         SAMPLE COVER LETTER (LaTeX Template):\n\
         {sample_template}\n\
         \n\
         Instructions:\n\
         {COVER_LETTER_INSTRUCTIONS}\n\
         \n\
         {LATEX_ONLY_INSTRUCTION}\n"
    )
}
