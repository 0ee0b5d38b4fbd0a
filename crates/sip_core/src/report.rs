//! Report document helpers: path footer, placeholder synthesis and path rewriting.

use regex::Regex;
use serde_json::Value;

use crate::{display_time, FormData, OperationKind, ValidationOutcome};

/// Appends a footer recording `path` and the retrieval time.
///
/// Content that already mentions `path`, raw or HTML-escaped, is returned unchanged. The footer goes
/// before a closing `</body></html>` when present, else at the end.
pub fn append_path_footer(html: &str, path: &str, retrieved_at: f64) -> String {
    let escaped = escape_html(path);
    if path.is_empty() || html.contains(path) || html.contains(&escaped) {
        return html.to_string();
    }

    let footer = format!(
        "\n<div class=\"report-path-footer\" style=\"margin-top: 20px; padding: 12px; \
         border-top: 2px solid #007bff; text-align: center; font-family: monospace;\">\n\
         <p><strong>Report Path:</strong> {}</p>\n\
         <p>Retrieved at {} UTC</p>\n</div>\n",
        escaped,
        display_time(retrieved_at),
    );

    let closing = Regex::new(r"(?i)</body>\s*</html>\s*$")
        .ok()
        .and_then(|pattern| pattern.find(html).map(|found| found.start()));
    match closing {
        Some(index) => {
            let mut out = String::with_capacity(html.len() + footer.len());
            out.push_str(&html[..index]);
            out.push_str(&footer);
            out.push_str(&html[index..]);
            out
        }
        None => format!("{html}{footer}"),
    }
}

/// Builds the stand-in document shown when every retrieval strategy failed.
pub fn placeholder_report(
    operation: OperationKind,
    form: &FormData,
    validation: Option<&ValidationOutcome>,
    path: &str,
) -> String {
    let goal = form_text(form, "goal_type");
    let risk = form_text(form, "risk_appetite");
    let currency = form_text(form, "currency");
    let target = form_text(form, "target_amount_min");
    let horizon = validation
        .and_then(|outcome| outcome.time_horizon_years)
        .map(|years| format!("{years} years"))
        .unwrap_or_else(|| "unknown".to_string());

    let title = match operation {
        OperationKind::SipCalculation => "SIP Investment Analysis Report",
        OperationKind::FundRecommendation => "Fund Recommendation Report",
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<div class=\"container\">\n\
         <h1>{title}</h1>\n\
         <p class=\"notice\">The generated report could not be loaded. \
         This summary was assembled from the submitted form.</p>\n\
         <ul>\n\
         <li><strong>Goal Type:</strong> {goal}</li>\n\
         <li><strong>Target Amount:</strong> {target} {currency}</li>\n\
         <li><strong>Time Horizon:</strong> {horizon}</li>\n\
         <li><strong>Risk Level:</strong> {risk}</li>\n\
         </ul>\n\
         <p><strong>Requested Report:</strong> {path}</p>\n\
         </div>\n</body>\n</html>\n",
        title = title,
        goal = escape_html(&goal),
        target = escape_html(&target),
        currency = escape_html(&currency),
        horizon = escape_html(&horizon),
        risk = escape_html(&risk),
        path = escape_html(if path.is_empty() { "unknown" } else { path }),
    )
}

/// Last path segment, accepting both separators.
pub fn file_name_from_path(path: &str) -> &str {
    path.rsplit(&['/', '\\'][..]).next().unwrap_or(path)
}

/// Rewrites an artifact path to its public `/media/...` URL path.
///
/// `C:\app\media\generated\1\r.html` becomes `/media/generated/1/r.html`.
pub fn static_asset_path(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");
    if let Some(index) = normalized.rfind("/media/") {
        return Some(normalized[index..].to_string());
    }
    normalized
        .starts_with("media/")
        .then(|| format!("/{normalized}"))
}

/// Extracts `media/generated/.../<file_name>` from free text.
pub fn extract_report_path(text: &str, file_name: &str) -> Option<String> {
    let pattern = format!(
        r"media[\\/]generated[\\/][\w\\/]+[\\/]{}",
        regex::escape(file_name)
    );
    let regex = Regex::new(&pattern).ok()?;
    regex.find(text).map(|found| found.as_str().to_string())
}

fn form_text(form: &FormData, key: &str) -> String {
    match form.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => "not provided".to_string(),
        Some(other) => other.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn form_text_renders_numbers_and_missing_values() {
        let mut form = FormData::new();
        form.insert("target_amount_min".into(), Value::from(5_000_000));
        assert_eq!(form_text(&form, "target_amount_min"), "5000000");
        assert_eq!(form_text(&form, "goal_type"), "not provided");
    }
}
