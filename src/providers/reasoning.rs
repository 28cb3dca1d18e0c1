use regex::Regex;

lazy_static::lazy_static! {
    static ref THINK_BLOCK: Regex = Regex::new(r"(?s)<think>.*?</think>").unwrap();
    static ref UNCLOSED_THINK: Regex = Regex::new(r"(?s)<think>.*$").unwrap();
}

/// Remove `<think>...</think>` reasoning blocks that local models such as
/// qwen and deepseek prepend to their answers.
pub fn strip_reasoning(content: &str) -> String {
    let without_blocks = THINK_BLOCK.replace_all(content, "");
    // A block cut off by max_tokens never closes
    UNCLOSED_THINK.replace(&without_blocks, "").trim().to_string()
}
