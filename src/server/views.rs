// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! HTML pages.
//!
//! Pure functions from session state to markup. The page text is static, so
//! rendering cannot fail. Stored keys and values arrive brace-free but are
//! otherwise untrusted and get HTML-escaped here.

use std::borrow::Cow;

const TITLE: &str = "Jalesveva Jayamahe";

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{TITLE}</title>
</head>
<body>
<header>
<img src="/image.jpg" alt="insignia" width="96">
<h1>{TITLE}</h1>
<nav><a href="/">Submit</a> | <a href="/marine">Inspect</a></nav>
</header>
<main>
{body}
</main>
</body>
</html>
"#
    )
}

/// Submission form posting to `/airforce`.
pub fn index_page() -> String {
    layout(
        r#"<form method="post" action="/airforce">
<label>Key <input type="text" name="Jalesveva"></label>
<label>Value <input type="text" name="Jayamahe"></label>
<button type="submit">Stage</button>
</form>
<p>Staged pairs become visible on the next sweep.</p>"#,
    )
}

/// Table of a session's stored pairs.
pub fn marine_page(rows: &[(String, String)]) -> String {
    let mut table = String::from("<table>\n<tr><th>Key</th><th>Value</th></tr>\n");
    for (key, value) in rows {
        table.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape_html(key),
            escape_html(value)
        ));
    }
    table.push_str("</table>");
    layout(&table)
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_has_form_fields() {
        let page = index_page();
        assert!(page.contains(r#"action="/airforce""#));
        assert!(page.contains(r#"name="Jalesveva""#));
        assert!(page.contains(r#"name="Jayamahe""#));
    }

    #[test]
    fn test_marine_rows() {
        let rows = vec![
            ("a 1 ".to_string(), "v 2 ".to_string()),
            ("k".to_string(), "v".to_string()),
        ];
        let page = marine_page(&rows);
        assert!(page.contains("<tr><td>a 1 </td><td>v 2 </td></tr>"));
        assert!(page.contains("<tr><td>k</td><td>v</td></tr>"));
    }

    #[test]
    fn test_marine_escapes_values() {
        let rows = vec![("<b>".to_string(), "<script>alert('x')</script>".to_string())];
        let page = marine_page(&rows);
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;b&gt;"));
        assert!(page.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn test_escape_html_borrows_clean_input() {
        assert!(matches!(escape_html("plain text"), Cow::Borrowed(_)));
        assert_eq!(escape_html("a&b"), "a&amp;b");
        assert_eq!(escape_html("\"q\""), "&#34;q&#34;");
    }
}
