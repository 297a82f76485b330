//! Assistant modes — system prompts prepended to plain conversations.

/// Modes with a dedicated instruction block.
pub const MODES: &[&str] = &[
    "default",
    "programmer",
    "research",
    "physics_basic",
    "physics_advanced",
    "creative",
    "voice",
    "super_compute",
];

const BASE_PROMPT: &str = "You are NENO IA, an advanced multimodal assistant. \
Reply in the user's language. Be helpful, precise and thorough. \
Use markdown when it improves readability and give practical examples.";

const UNKNOWN_MODE: &str = "Specialist mode: give detailed, precise technical answers \
with analytical rigor.";

fn mode_instruction(mode: &str) -> &'static str {
    match mode {
        "default" => {
            "Default mode: give complete, clear, well-structured answers. \
             Be comprehensive but objective; use analogies and examples."
        }
        "programmer" => {
            "PROGRAMMER MODE:\n\
             - Provide documented, ready-to-use code\n\
             - Explain architecture decisions and trade-offs\n\
             - Consider performance, security and maintainability\n\
             - Include runnable examples and unit tests\n\
             - Discuss alternatives and optimizations"
        }
        "research" => {
            "RESEARCH MODE:\n\
             - Be meticulous and evidence-based\n\
             - Cite reliable sources and relevant studies\n\
             - Present data accurately and discuss limitations and biases\n\
             - Avoid unfounded speculation"
        }
        "physics_basic" => {
            "BASIC PHYSICS MODE:\n\
             - Explain physical concepts clearly for beginners\n\
             - Use everyday analogies and simple 3D objects as examples\n\
             - Show real-world applications"
        }
        "physics_advanced" => {
            "ADVANCED PHYSICS MODE:\n\
             - Go deep into mathematical modelling\n\
             - Cover multi-body systems, fluid and particle dynamics\n\
             - Use vector and tensor fields, differential equations and numerical methods"
        }
        "creative" => {
            "CREATIVE MODE:\n\
             - Be imaginative and explore unconventional perspectives\n\
             - Suggest original ideas and combine concepts in new ways\n\
             - Keep the narrative coherent and the language vivid"
        }
        "voice" => {
            "VOICE MODE:\n\
             - Keep answers short and natural to listen to\n\
             - Use conversational, fluid language\n\
             - Structure sentences for easy listening; avoid tables and code blocks"
        }
        "super_compute" => {
            "SUPER COMPUTE MODE:\n\
             - Optimize complex algorithms\n\
             - Reason about distributed processing, parallelism and load balancing\n\
             - Cover large-scale simulation, high-performance computing and asymptotic complexity"
        }
        _ => UNKNOWN_MODE,
    }
}

/// System prompt for `mode`, optionally pinned to `lang`.
///
/// `lang == "auto"` (or empty) leaves the language to the user's message.
pub fn build_system_prompt(mode: &str, lang: &str) -> String {
    let instruction = mode_instruction(mode.trim());
    let lang = lang.trim();

    if lang.is_empty() || lang.eq_ignore_ascii_case("auto") {
        format!("{BASE_PROMPT}\n\n{instruction}")
    } else {
        format!(
            "{BASE_PROMPT}\n\n{instruction}\n\nReply strictly in {lang}, keeping technical precision."
        )
    }
}
