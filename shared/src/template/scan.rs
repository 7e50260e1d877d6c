//! Lexical scan of template tags
//!
//! Works on the raw text without compiling, so it also returns useful
//! results for templates that do not yet compile.

use std::collections::HashSet;

use super::helpers::HELPER_NAMES;

/// Names of the variables referenced by a template, deduplicated, in the
/// order they first appear.
///
/// Control markers (`#`, `/`, `!`, `^`, `&`, `~`) are stripped. Helper names
/// are skipped in favour of their arguments, so
/// `{{#if CUSTOM_MESSAGE}}` yields `CUSTOM_MESSAGE`. Comments, closing tags
/// and partials contribute nothing.
pub fn extract_variables(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];

        // Long comments may contain `}}`.
        if let Some(comment) = after.strip_prefix("!--") {
            match comment.find("--}}") {
                Some(end) => {
                    rest = &comment[end + 4..];
                    continue;
                }
                None => break,
            }
        }

        let Some(end) = after.find("}}") else {
            break;
        };
        let tag = &after[..end];
        rest = after[end + 2..].trim_start_matches('}');

        for name in tag_variables(tag) {
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }

    names
}

fn tag_variables(tag: &str) -> Vec<String> {
    let tag = tag
        .trim_start_matches('{')
        .trim_matches('~')
        .trim();

    let body = match tag.chars().next() {
        None | Some('!') | Some('/') | Some('>') => return Vec::new(),
        Some('#') => {
            let inner = tag[1..].trim_start();
            // `{{#> partial}}` and `{{#*inline}}` are not variables
            if inner.starts_with('>') || inner.starts_with('*') {
                return Vec::new();
            }
            inner
        }
        Some('^') | Some('&') => tag[1..].trim_start(),
        Some(_) => tag,
    };

    let tokens = tokenize(body);
    let mut vars = Vec::new();
    let mut expect_helper = true;

    for token in tokens {
        match token.as_str() {
            "(" => {
                expect_helper = true;
                continue;
            }
            ")" => continue,
            _ => {}
        }

        if token == "as" || token.starts_with('|') {
            break;
        }

        // `{{else if B}}` chains another helper
        if expect_helper && token == "else" {
            continue;
        }

        if expect_helper {
            expect_helper = false;
            if HELPER_NAMES.contains(&token.as_str()) {
                continue;
            }
        }

        let value = match token.split_once('=') {
            Some((_, value)) if !token.starts_with(['"', '\'']) => value,
            _ => token.as_str(),
        };
        if let Some(name) = variable_name(value) {
            vars.push(name);
        }
    }

    vars
}

/// Split on whitespace, keeping quoted strings whole and parentheses as
/// their own tokens.
fn tokenize(body: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in body.chars() {
        match quote {
            Some(q) => {
                current.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    current.push(ch);
                }
                '(' | ')' => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                    tokens.push(ch.to_string());
                }
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            },
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn variable_name(token: &str) -> Option<String> {
    let token = token.trim();
    let first = token.chars().next()?;

    if first == '"' || first == '\'' || first == '@' || first.is_ascii_digit() {
        return None;
    }
    if first == '-' && token[1..].starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if matches!(token, "true" | "false" | "null" | "undefined" | "this" | "." | "else") {
        return None;
    }

    let name = token
        .strip_prefix("this.")
        .or_else(|| token.strip_prefix("./"))
        .unwrap_or(token);
    (!name.is_empty()).then(|| name.to_string())
}
