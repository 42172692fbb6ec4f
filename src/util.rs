//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Remove a Markdown code fence around model output (```json ... ```, ```html ... ```).
/// Text without a fence is returned trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
  let s = raw.trim();
  let Some(rest) = s.strip_prefix("```") else { return s };
  // Drop the info string ("json", "html", ...) on the opening line.
  let body = match rest.find('\n') {
    Some(nl) => &rest[nl + 1..],
    None => {
      let after_word = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
      let inner = after_word.strip_suffix("```").unwrap_or(after_word).trim();
      if inner.is_empty() { rest } else { after_word }
    }
  };
  body.strip_suffix("```").unwrap_or(body).trim()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}

/// Text between each `<li ...>` and `</li>` pair, in order.
pub fn list_items(html: &str) -> Vec<String> {
  let mut items = Vec::new();
  let mut rest = html;
  while let Some(start) = rest.find("<li") {
    let after = &rest[start + 3..];
    // Skip "<link" and similar tags that merely start with "li".
    if !after.starts_with('>') && !after.starts_with(' ') {
      rest = after;
      continue;
    }
    let Some(open_end) = after.find('>') else { break };
    let content = &after[open_end + 1..];
    let Some(close) = content.find("</li>") else { break };
    items.push(content[..close].trim().to_string());
    rest = &content[close + 5..];
  }
  items
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fills_named_slots() {
    let out = fill_template("Hi {user}, level {difficulty}.", &[("user", "Ana"), ("difficulty", "7")]);
    assert_eq!(out, "Hi Ana, level 7.");
  }

  #[test]
  fn strips_fenced_json() {
    assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    assert_eq!(strip_code_fences("```html\n<ul></ul>```"), "<ul></ul>");
    assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
  }

  #[test]
  fn strips_single_line_fence_with_info_word() {
    assert_eq!(strip_code_fences("```json {\"a\":1}```"), "{\"a\":1}");
    assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
    assert_eq!(strip_code_fences("```html <ul><li>Q?</li></ul> ```"), "<ul><li>Q?</li></ul>");
    assert_eq!(strip_code_fences("```true```"), "true");
  }

  #[test]
  fn extracts_list_items_in_order() {
    let html = "<ul><li>One?</li>\n<li class=\"q\"> Two? </li><link rel=x><li>Three?</li></ul>";
    assert_eq!(list_items(html), vec!["One?", "Two?", "Three?"]);
  }

  #[test]
  fn truncates_on_char_boundary() {
    assert_eq!(trunc_for_log("short", 10), "short");
    assert!(trunc_for_log("ééééééé", 3).starts_with("ééé…"));
  }
}
