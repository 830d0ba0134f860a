// Cover letter generation: multipart intake, input resolution, prompt,
// LLM draft, LaTeX → HTML normalization, PDF render.
// All LLM calls go through llm_client, never direct Gemini calls here.

pub mod form;
pub mod handlers;
pub mod inputs;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
