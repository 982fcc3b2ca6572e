// Shared prompt constants and prompt-building utilities.
// Each feature module that relays prompts defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction appended to prompts whose output is split into one item per line.
pub const ONE_ITEM_PER_LINE: &str = "\
각 항목은 한 줄에 하나씩 작성하고, 항목 사이에 빈 줄을 넣지 마세요. \
머리말이나 맺음말 없이 항목만 출력하세요.";

/// Instruction that keeps generated questions free of decoration.
pub const NO_QUOTES: &str = "\
출력에는 따옴표(\"), 작은따옴표('), 백틱(`) 등을 포함하지 마세요.";

/// Fills `{name}` placeholders in a template in a single pass, so braces inside
/// substituted user text are never expanded. Unknown placeholders are left untouched.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
