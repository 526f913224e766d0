// Resume Normalizer: turns one uploaded PDF/PNG/JPEG into a fixed-shape ResumeSummary.
// Model calls go through the llm_client provider trait only.

pub mod extract;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
