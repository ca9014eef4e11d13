// ============================================================
// Layer 1 — Web Page Rendering
// ============================================================
// Every piece of user-derived text passes through `escape` before
// it reaches the markup.
//
// The download link after an analysis carries the log snapshot taken
// right after the append, embedded as a base64 data URI.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::application::analyze_use_case::{AnalysisOutcome, LogDownload};

/// A status banner shown above the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

impl Notice {
    fn css_class(&self) -> &'static str {
        match self {
            Notice::Success(_) => "notice success",
            Notice::Warning(_) => "notice warning",
            Notice::Error(_) => "notice error",
        }
    }

    fn text(&self) -> &str {
        match self {
            Notice::Success(t) | Notice::Warning(t) | Notice::Error(t) => t,
        }
    }
}

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 820px; margin: 2rem auto; padding: 0 1rem;
       background-image: url('https://www.transparenttextures.com/patterns/cubes.png'); }
textarea { width: 100%; min-height: 7rem; }
.notice { padding: 10px; border-radius: 8px; margin: 1rem 0; }
.success { background: rgba(0, 160, 60, 0.2); }
.warning { background: rgba(230, 160, 0, 0.25); }
.error { background: rgba(220, 0, 0, 0.2); }
.prediction { padding: 10px; background-color: rgba(0, 128, 255, 0.2); border-radius: 10px; margin-bottom: 8px; }
.prediction progress { width: 100%; height: 16px; }
form.inline { display: inline; }
"#;

/// Escape the five HTML-significant characters.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the whole page.
///
/// `input` is echoed back into the text area; `outcome` adds the
/// tokens, the download link and the prediction cards.
pub fn render(input: &str, notices: &[Notice], outcome: Option<&AnalysisOutcome>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Token Classification Web App</title>\n");
    html.push_str(&format!("<style>{STYLE}</style>\n</head>\n<body>\n"));
    html.push_str("<h1>🧠 Token Classification Web App</h1>\n");

    html.push_str(
        "<form class=\"inline\" method=\"post\" action=\"/clear\">\
         <button type=\"submit\">🗑️ Clear CSV Log</button></form>\n",
    );

    for notice in notices {
        html.push_str(&format!(
            "<div class=\"{}\">{}</div>\n",
            notice.css_class(),
            escape(notice.text())
        ));
    }

    html.push_str(&format!(
        "<form method=\"post\" action=\"/analyze\">\n\
         <label for=\"text\">✍️ Enter your sentence:</label>\n\
         <textarea id=\"text\" name=\"text\">{}</textarea>\n\
         <button type=\"submit\">🔍 Analyze</button>\n</form>\n",
        escape(input)
    ));

    if let Some(outcome) = outcome {
        render_outcome(&mut html, outcome);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_outcome(html: &mut String, outcome: &AnalysisOutcome) {
    html.push_str(&format!(
        "<p><strong>🧬 Tokens:</strong> <code>{}</code></p>\n",
        escape(&format!("{:?}", outcome.tokens))
    ));

    if let Some(download) = &outcome.log_download {
        html.push_str(&format!(
            "<p><a href=\"{}\" download=\"{}\">Download Interaction Log (CSV)</a></p>\n",
            snapshot_href(download),
            escape(&download.file_name)
        ));
    }

    html.push_str("<h2>🧾 Prediction Results</h2>\n");
    for p in &outcome.predictions {
        html.push_str(&format!(
            "<div class=\"prediction\"><strong>{}</strong> — <code>{}</code><br/>\n\
             <progress value=\"{}\" max=\"1\"></progress>\n\
             <span>Score: {}</span></div>\n",
            escape(&p.text),
            escape(&p.label),
            p.score,
            p.display_score()
        ));
    }
}

/// `data:` URI holding the CSV snapshot.
fn snapshot_href(download: &LogDownload) -> String {
    format!("data:text/csv;charset=utf-8;base64,{}", STANDARD.encode(&download.content))
}
