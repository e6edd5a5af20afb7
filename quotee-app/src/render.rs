//! Console and JSON output.

use crate::consult::ConsultObserver;
use quotee_llm::{Credentials, ProviderId, QueryResult};
use serde::Serialize;
use std::borrow::Cow;
use std::io::{self, Write};

/// Consult-mode text output shows at most this many characters per provider.
pub const CONSOLE_CHAR_LIMIT: usize = 2000;
pub const TRUNCATION_MARKER: &str = "... [truncated]";

const BANNER_TITLE: &str = "MULTI-PROVIDER QUOTE VALIDATION";

/// Cuts `content` to [`CONSOLE_CHAR_LIMIT`] characters, appending the marker on its own line.
pub fn truncate_for_console(content: &str) -> Cow<'_, str> {
    match content.char_indices().nth(CONSOLE_CHAR_LIMIT) {
        None => Cow::Borrowed(content),
        Some((cut, _)) => Cow::Owned(format!("{}\n{TRUNCATION_MARKER}", &content[..cut])),
    }
}

pub fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(out, "{json}")
}

/// Single-mode text output. Returns `false` when the result is a failure.
pub fn write_single_text<O: Write, E: Write>(
    out: &mut O,
    err: &mut E,
    result: &QueryResult,
) -> io::Result<bool> {
    match result {
        QueryResult::Success { content, .. } => {
            writeln!(out, "{content}")?;
            Ok(true)
        }
        QueryResult::Failure { error } => {
            writeln!(err, "Error: {error}")?;
            Ok(false)
        }
    }
}

pub fn write_provider_listing<W: Write>(out: &mut W, credentials: &Credentials) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Available Providers:")?;
    writeln!(out, "{}", "-".repeat(40))?;
    for provider in ProviderId::ALL {
        let status = if credentials.is_set(provider) {
            "OK"
        } else {
            "NOT SET"
        };
        writeln!(out, "  {provider}: {} [{status}]", provider.env_var())?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Export the keys above (or add them to a .env file) and re-run."
    )
}

/// Streams consult-mode text as each provider starts and finishes.
pub struct ConsoleRenderer<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    pub fn banner(&mut self) {
        let rule = "=".repeat(60);
        let res = writeln!(self.out, "{rule}\n{BANNER_TITLE}\n{rule}");
        self.record(res);
    }

    /// Returns the writer, or the first write error seen.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn record(&mut self, res: io::Result<()>) {
        if let Err(e) = res {
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
    }
}

impl<W: Write> ConsultObserver for ConsoleRenderer<W> {
    fn started(&mut self, provider: ProviderId) {
        let header = provider.as_str().to_ascii_uppercase();
        let res = writeln!(self.out, "\n--- {header} ---").and_then(|()| self.out.flush());
        self.record(res);
    }

    fn finished(&mut self, _provider: ProviderId, result: &QueryResult) {
        let res = match result {
            QueryResult::Success { content, .. } => {
                writeln!(self.out, "{}", truncate_for_console(content))
            }
            QueryResult::Failure { error } => writeln!(self.out, "[ERROR: {error}]"),
        };
        self.record(res);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_unchanged() {
        let content = "x".repeat(CONSOLE_CHAR_LIMIT);
        assert!(matches!(truncate_for_console(&content), Cow::Borrowed(_)));
        assert_eq!(truncate_for_console(&content), content);
    }

    #[test]
    fn long_content_keeps_exactly_the_limit_then_marker() {
        let content = "y".repeat(CONSOLE_CHAR_LIMIT + 1);
        let shown = truncate_for_console(&content);
        let (kept, marker) = shown.split_once('\n').expect("marker line");
        assert_eq!(kept.chars().count(), CONSOLE_CHAR_LIMIT);
        assert_eq!(marker, TRUNCATION_MARKER);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let content = "é".repeat(CONSOLE_CHAR_LIMIT + 5);
        let shown = truncate_for_console(&content);
        let kept = shown.strip_suffix(&format!("\n{TRUNCATION_MARKER}")).expect("marker");
        assert_eq!(kept.chars().count(), CONSOLE_CHAR_LIMIT);
        assert!(kept.chars().all(|c| c == 'é'));
    }

    #[test]
    fn single_failure_goes_to_error_stream() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let ok = write_single_text(
            &mut out,
            &mut err,
            &QueryResult::failure("OPENAI_API_KEY not set"),
        )
        .expect("write");
        assert!(!ok);
        assert!(out.is_empty());
        assert_eq!(String::from_utf8(err).expect("utf8"), "Error: OPENAI_API_KEY not set\n");
    }

    #[test]
    fn single_success_prints_content_only() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = QueryResult::Success {
            content: "Confidence: 8".to_string(),
            provider: ProviderId::OpenAi,
            model: "gpt-4o".to_string(),
        };
        assert!(write_single_text(&mut out, &mut err, &result).expect("write"));
        assert_eq!(String::from_utf8(out).expect("utf8"), "Confidence: 8\n");
        assert!(err.is_empty());
    }

    #[test]
    fn listing_reports_each_credential() {
        let creds = Credentials::from_lookup(|name| {
            (name == "GOOGLE_API_KEY").then(|| "g".to_string())
        });
        let mut out = Vec::new();
        write_provider_listing(&mut out, &creds).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("\nAvailable Providers:\n"));
        assert!(text.contains("  openai: OPENAI_API_KEY [NOT SET]\n"));
        assert!(text.contains("  google: GOOGLE_API_KEY [OK]\n"));
        assert!(text.contains("  anthropic: ANTHROPIC_API_KEY [NOT SET]\n"));
    }

    #[test]
    fn console_renderer_interleaves_headers_and_results() {
        let mut renderer = ConsoleRenderer::new(Vec::new());
        renderer.banner();
        renderer.started(ProviderId::OpenAi);
        renderer.finished(ProviderId::OpenAi, &QueryResult::failure("boom"));
        renderer.started(ProviderId::Google);
        renderer.finished(
            ProviderId::Google,
            &QueryResult::Success {
                content: "fine".to_string(),
                provider: ProviderId::Google,
                model: "gemini-1.5-pro".to_string(),
            },
        );
        let text = String::from_utf8(renderer.finish().expect("no write errors")).expect("utf8");
        let rule = "=".repeat(60);
        assert_eq!(
            text,
            format!(
                "{rule}\nMULTI-PROVIDER QUOTE VALIDATION\n{rule}\n\n--- OPENAI ---\n[ERROR: boom]\n\n--- GOOGLE ---\nfine\n"
            )
        );
    }
}
