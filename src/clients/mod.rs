pub mod gemini;
pub mod openai_compat;
pub mod traits;

pub use gemini::GeminiCliRuntime;
pub use openai_compat::OpenAiCompatRuntime;
pub use traits::{AgentError, EventStream, ModelEvent, ModelRuntime};
