use std::fmt;

/// Which field a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CurrentPrice,
    OriginalPrice,
    Discount,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::CurrentPrice => "current price",
            Field::OriginalPrice => "original price",
            Field::Discount => "discount",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    OffscreenPrice { index: usize, text: String },
    RuleSkipped { rule: String },
    CurrentPriceMatched { rule: String, text: String },
    OriginalRuleAttempt { rule: String, matches: usize },
    OriginalCandidate { text: String, accepted: bool, reason: &'static str },
    DiscountRejected { rule: String, text: String },
    DiscountMatched { rule: String, text: String },
    WidenedSearch { candidates: usize },
    SourceFallback { text: Option<String> },
    Unparsable { field: Field, raw: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::OffscreenPrice { index, text } => {
                write!(f, "offscreen price #{}: {}", index + 1, text)
            }
            Diagnostic::RuleSkipped { rule } => {
                write!(f, "rule {} skipped: not supported by this page source", rule)
            }
            Diagnostic::CurrentPriceMatched { rule, text } => {
                write!(f, "current price found with {}: {}", rule, text)
            }
            Diagnostic::OriginalRuleAttempt { rule, matches } => {
                write!(f, "original price rule {}: {} element(s)", rule, matches)
            }
            Diagnostic::OriginalCandidate {
                text,
                accepted,
                reason,
            } => {
                let verdict = if *accepted { "accepted" } else { "rejected" };
                write!(f, "  candidate {:?} {} ({})", text, verdict, reason)
            }
            Diagnostic::DiscountRejected { rule, text } => {
                write!(f, "discount rule {} ignored {:?}", rule, text)
            }
            Diagnostic::DiscountMatched { rule, text } => {
                write!(f, "discount found with {}: {}", rule, text)
            }
            Diagnostic::WidenedSearch { candidates } => write!(
                f,
                "discount without original price, widened search saw {} priced element(s)",
                candidates
            ),
            Diagnostic::SourceFallback { text: Some(text) } => {
                write!(f, "price taken from raw markup: {}", text)
            }
            Diagnostic::SourceFallback { text: None } => {
                f.write_str("no price-shaped text in raw markup")
            }
            Diagnostic::Unparsable { field, raw } => {
                write!(f, "{} text {:?} is not a number", field, raw)
            }
        }
    }
}

/// Receives the resolver's trace. Has no effect on the resolved price.
pub trait Diagnostics {
    /// When false the resolver skips work done only for tracing.
    fn enabled(&self) -> bool {
        true
    }

    fn record(&mut self, event: Diagnostic);
}

/// Discards everything.
pub struct Silent;

impl Diagnostics for Silent {
    fn enabled(&self) -> bool {
        false
    }

    fn record(&mut self, _event: Diagnostic) {}
}

/// Forwards every event to `tracing` at debug level.
pub struct TraceLog;

impl Diagnostics for TraceLog {
    fn record(&mut self, event: Diagnostic) {
        tracing::debug!("{}", event);
    }
}

impl Diagnostics for Vec<Diagnostic> {
    fn record(&mut self, event: Diagnostic) {
        self.push(event);
    }
}

/// Record an event, building it only if the sink is listening.
pub(crate) fn note(sink: &mut dyn Diagnostics, event: impl FnOnce() -> Diagnostic) {
    if sink.enabled() {
        sink.record(event());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_sink_never_builds_events() {
        let mut built = false;
        note(&mut Silent, || {
            built = true;
            Diagnostic::WidenedSearch { candidates: 0 }
        });
        assert!(!built);
    }

    #[test]
    fn vec_sink_records_in_order() {
        let mut events: Vec<Diagnostic> = Vec::new();
        note(&mut events, || Diagnostic::SourceFallback { text: None });
        note(&mut events, || Diagnostic::WidenedSearch { candidates: 2 });
        assert_eq!(
            events,
            vec![
                Diagnostic::SourceFallback { text: None },
                Diagnostic::WidenedSearch { candidates: 2 },
            ]
        );
    }

    #[test]
    fn display_is_one_line() {
        let event = Diagnostic::OriginalCandidate {
            text: "79,99€".into(),
            accepted: true,
            reason: "differs from current price",
        };
        assert_eq!(
            event.to_string(),
            "  candidate \"79,99€\" accepted (differs from current price)"
        );
    }
}
