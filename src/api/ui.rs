//! Server-rendered lookup page.

pub const PAGE_TITLE: &str = "💰 Crypto Agent Powered by Gemini + Coinlore";
pub const INPUT_LABEL: &str = "Enter crypto name or symbol (e.g., BTC, ethereum, solana):";
pub const BUTTON_LABEL: &str = "Get Price";
pub const LOADING_TEXT: &str = "Fetching price...";
pub const EMPTY_INPUT_WARNING: &str = "Please enter a coin name or symbol.";

/// Message area shown under the form after a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

/// Everything the page needs to render.
#[derive(Debug, Clone, Default)]
pub struct PageView {
    /// Text to keep in the input box.
    pub coin: String,
    pub notice: Option<Notice>,
}

/// Render the full HTML document.
pub fn render_page(view: &PageView) -> String {
    let notice = match &view.notice {
        Some(Notice::Success(text)) => {
            format!(r#"<div class="notice success" id="success">{}</div>"#, escape_html(text))
        }
        Some(Notice::Warning(text)) => {
            format!(r#"<div class="notice warning" id="warning">{}</div>"#, escape_html(text))
        }
        Some(Notice::Error(text)) => {
            format!(r#"<div class="notice error" id="error">{}</div>"#, escape_html(text))
        }
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
  body {{ font-family: sans-serif; max-width: 46rem; margin: 3rem auto; padding: 0 1rem; color: #262730; }}
  label {{ display: block; margin-bottom: .4rem; font-size: .9rem; }}
  input[type=text] {{ width: 100%; box-sizing: border-box; padding: .5rem; font-size: 1rem; }}
  button {{ margin-top: .8rem; padding: .45rem 1rem; font-size: 1rem; cursor: pointer; }}
  .notice {{ margin-top: 1rem; padding: .8rem 1rem; border-radius: .4rem; white-space: pre-wrap; }}
  .success {{ background: #e6f4ea; color: #1e6b34; }}
  .warning {{ background: #fff8e1; color: #8a6d00; }}
  .error {{ background: #fdecea; color: #a4262c; }}
  #loading {{ display: none; margin-top: 1rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<form method="post" action="/" id="lookup">
  <label for="coin">{label}</label>
  <input type="text" id="coin" name="coin" value="{coin}" placeholder="{label}" autocomplete="off">
  <button type="submit">{button}</button>
</form>
<div id="loading">{loading}</div>
{notice}
<script>
  document.getElementById("lookup").addEventListener("submit", function () {{
    if (document.getElementById("coin").value.trim() !== "") {{
      document.getElementById("loading").style.display = "block";
    }}
  }});
</script>
</body>
</html>
"#,
        title = escape_html(PAGE_TITLE),
        label = escape_html(INPUT_LABEL),
        button = escape_html(BUTTON_LABEL),
        loading = escape_html(LOADING_TEXT),
        coin = escape_html(&view.coin),
        notice = notice,
    )
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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
