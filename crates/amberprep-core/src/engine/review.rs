//! Operator review of structure normalizer diagnostics.
//!
//! The pipeline pauses after a protein has been normalized so a human can inspect the
//! warnings before parameters are built on top of a possibly broken structure. The pause is
//! an injected callback; the default gate always proceeds.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Proceed,
    Abort,
}

pub type ReviewCallback<'a> = Box<dyn Fn(&str, &[String]) -> ReviewDecision + Send + Sync + 'a>;

#[derive(Default)]
pub struct ReviewGate<'a> {
    callback: Option<ReviewCallback<'a>>,
}

impl<'a> ReviewGate<'a> {
    pub fn always_proceed() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ReviewCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Asks whether to continue after `subject` produced `diagnostics`.
    pub fn confirm(&self, subject: &str, diagnostics: &[String]) -> ReviewDecision {
        match &self.callback {
            Some(cb) => cb(subject, diagnostics),
            None => ReviewDecision::Proceed,
        }
    }
}
