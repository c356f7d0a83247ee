//! Self-contained HTML cards for notebook-style display.

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders a titled card with one labelled row per entry.
pub fn card(kind: &str, title: &str, rows: &[(&str, String)]) -> String {
    let mut html = format!(
        "<div class=\"cf-card\" style=\"border:1px solid #ccc;border-radius:6px;padding:8px;font-family:sans-serif\">\
         <div style=\"font-weight:bold\">{}: {}</div>",
        escape(kind),
        escape(title)
    );
    for (label, value) in rows {
        html.push_str(&format!(
            "<div><strong>{}:</strong> {}</div>",
            escape(label),
            escape(value)
        ));
    }
    html.push_str("</div>");
    html
}

pub(crate) fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
