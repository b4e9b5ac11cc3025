//! `@username` extraction from post bodies.

/// Usernames mentioned in `body`, in first-seen order, deduplicated
/// case-insensitively. A username is a run of ASCII letters, digits or `_`
/// directly after `@`, and the `@` must not follow a word character
/// (so `a@b.com` is not a mention).
pub fn extract_mentions(body: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut prev: Option<char> = None;
    let mut chars = body.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        let at_boundary = prev.map_or(true, |p| !is_name_char(p));
        prev = Some(ch);
        if ch != '@' || !at_boundary {
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while let Some(&(j, c)) = chars.peek() {
            if !is_name_char(c) {
                break;
            }
            end = j + c.len_utf8();
            prev = Some(c);
            chars.next();
        }
        if end > start {
            let name = &body[start..end];
            if !found.iter().any(|f| f.eq_ignore_ascii_case(name)) {
                found.push(name.to_string());
            }
        }
    }
    found
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
