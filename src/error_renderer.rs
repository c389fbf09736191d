//! Error rendering using ariadne
//!
//! Renders Nailang errors with source snippets and annotations. Errors do
//! not own their source text, so every function takes the file name and
//! the source the error came from.

use std::io::Write;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};

use crate::{Diagnostic, Error, Severity};

/// Render an error with source snippets to stderr
///
/// # Example
/// ```no_run
/// use nailang::{Engine, EngineOptions, render_error};
/// use nailang::arena::MemoryPool;
///
/// let pool = MemoryPool::new();
/// let mut engine = Engine::new(&pool, EngineOptions::default(), |_| {});
///
/// let source = "x = 1 +;";
/// if let Err(e) = engine.run_source(source, "bad.nl") {
///     render_error(&e, "bad.nl", source);
/// }
/// ```
pub fn render_error(error: &Error, file_name: &str, source: &str) {
    render_error_to_writer(error, file_name, source, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
pub fn render_error_to(error: &Error, file_name: &str, source: &str, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, file_name, source, writer, true)
}

/// Render an error to a String (useful for logs, web UIs, etc.)
pub fn render_error_to_string(error: &Error, file_name: &str, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, file_name, source, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(error: &Error, file_name: &str, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, file_name, source, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    file_name: &str,
    source: &str,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match error {
        Error::Api(msg) => writeln!(writer, "API error: {}", msg),
        Error::Runtime(err) | Error::ResourceExceeded(err) => {
            if let Some(location) = &err.location {
                writeln!(writer, "{}:{}: in block [{}]", location.file, location.position, location.block)?;
            }
            render_diagnostics(file_name, source, &error.diagnostics(), writer, use_color)
        }
        Error::Parse { diagnostics } => render_diagnostics(file_name, source, diagnostics, writer, use_color),
    }
}

fn render_diagnostics(
    file_name: &str,
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    // Spans past the end (e.g. from a different source unit) would make
    // ariadne panic.
    let clamp = |span: &std::ops::Range<usize>| span.start.min(source.len())..span.end.min(source.len());
    for diag in diagnostics {
        let mut colors = ColorGenerator::new();
        colors.next(); // Skip the first color.

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let span = clamp(&diag.span.0);
        let mut report = Report::build(kind, (file_name, span.clone()))
            .with_message(&diag.message)
            .with_config(ariadne::Config::default().with_color(use_color));

        if let Some(code) = &diag.code {
            report = report.with_code(code);
        }

        let color = colors.next();
        report = report.with_label(Label::new((file_name, span)).with_message(&diag.message).with_color(color));

        for related in &diag.related {
            let color = colors.next();
            report = report.with_label(
                Label::new((file_name, clamp(&related.span.0)))
                    .with_message(&related.message)
                    .with_color(color),
            );
        }

        if let Some(help) = &diag.help {
            report = report.with_help(help);
        }

        report.finish().write((file_name, Source::from(source)), &mut *writer)?;
    }

    Ok(())
}
