//! Human-readable progress on stdout.

use crossterm::execute;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use std::io::{self, Write};

use super::types::{CheckResult, RunOutcome};

const PASS_GLYPH: &str = "\u{2714}";
const FAIL_GLYPH: &str = "\u{2718}";

/// `=== title ===` header between phases
pub fn phase<W: Write>(w: &mut W, title: &str) -> io::Result<()> {
    execute!(
        w,
        Print("\n"),
        SetAttribute(Attribute::Bold),
        Print(format!("=== {} ===\n", title)),
        SetAttribute(Attribute::Reset),
    )
}

/// One line per check; failures carry their joined errors
pub fn check<W: Write>(w: &mut W, check: &CheckResult) -> io::Result<()> {
    let (glyph, color) = if check.pass {
        (PASS_GLYPH, Color::Green)
    } else {
        (FAIL_GLYPH, Color::Red)
    };
    execute!(w, SetForegroundColor(color), Print(glyph), ResetColor, Print(" "), Print(&check.label))?;
    if !check.pass {
        execute!(w, Print(": "), Print(check.errors.join("; ")))?;
    }
    execute!(w, Print("\n"))
}

/// Totals, then every failure again with its errors
pub fn summary<W: Write>(w: &mut W, outcome: &RunOutcome) -> io::Result<()> {
    let s = outcome.summary;
    let color = if outcome.success() { Color::Green } else { Color::Red };
    execute!(
        w,
        Print("\n========================================\n"),
        SetForegroundColor(color),
        Print(format!(
            "  RESULTS: {} passed, {} failed out of {} total\n",
            s.passed, s.failed, s.total
        )),
        ResetColor,
        Print("========================================\n"),
    )?;
    if !outcome.failures.is_empty() {
        execute!(w, Print("\nFAILURES:\n"))?;
        for (label, errors) in &outcome.failures {
            execute!(w, Print(format!("  {}: {}\n", label, errors.join("; "))))?;
        }
    }
    execute!(w, Print(format!("\nResults written to {}\n", outcome.report_path.display())))
}
