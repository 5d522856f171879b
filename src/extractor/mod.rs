mod architecture_extractor;
mod reply;

pub use architecture_extractor::{
    build_prompt, fallback_record, truncate_chars, ArchitectureExtractor,
    DEFAULT_MODEL_TIMEOUT_SECS, FALLBACK_DESCRIPTION, MAX_CONTENT_CHARS,
};
pub use reply::{first_object_span, parse_reply, strip_code_fences, ParsedReply};
