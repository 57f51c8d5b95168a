use super::progress::CliProgressHandler;
use amberprep::engine::review::{ReviewCallback, ReviewDecision};
use std::io::{self, BufRead, Write};

/// Interprets an answer to the review prompt; anything but an explicit "no" proceeds.
pub fn decision_from_answer(answer: &str) -> ReviewDecision {
    match answer.trim().to_ascii_lowercase().as_str() {
        "n" | "no" | "q" | "quit" | "abort" => ReviewDecision::Abort,
        _ => ReviewDecision::Proceed,
    }
}

/// Shows the normalizer's messages for `subject` and asks whether to continue.
pub fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    subject: &str,
    diagnostics: &[String],
) -> io::Result<ReviewDecision> {
    writeln!(output, "\npdb4amber messages for '{}':", subject)?;
    for line in diagnostics {
        writeln!(output, "  {}", line)?;
    }
    write!(output, "Read the above messages. Continue? [Y/n] ")?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(ReviewDecision::Proceed);
    }
    Ok(decision_from_answer(&answer))
}

/// A review callback that asks on the terminal, pausing the spinner meanwhile.
///
/// A terminal that cannot be read counts as consent, as with `--uninteractive`.
pub fn interactive_review(progress: CliProgressHandler) -> ReviewCallback<'static> {
    Box::new(move |subject: &str, diagnostics: &[String]| {
        progress.suspend(|| {
            prompt(
                &mut io::stdin().lock(),
                &mut io::stderr(),
                subject,
                diagnostics,
            )
            .unwrap_or(ReviewDecision::Proceed)
        })
    })
}
