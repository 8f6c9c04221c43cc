//! Outcome of a command, a test case or a whole run
//!
//! Outcomes are ordered by severity and only ever combined upwards: the
//! total of a run is the most severe outcome it observed.

use std::fmt;

/// Severity ladder, least severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Success,
    Warning,
    Failure,
    Error,
    Interrupted,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Success => "Success",
            Severity::Warning => "Warning",
            Severity::Failure => "Failure",
            Severity::Error => "Error",
            Severity::Interrupted => "Interrupted",
        };
        f.write_str(name)
    }
}

/// Result of evaluating one command or an aggregate of many
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Success,
    Warning(String),
    Failure(String),
    Error(String),
    /// Stops the enclosing command loop
    Interrupted(String),
}

impl Outcome {
    pub fn severity(&self) -> Severity {
        match self {
            Outcome::Success => Severity::Success,
            Outcome::Warning(_) => Severity::Warning,
            Outcome::Failure(_) => Severity::Failure,
            Outcome::Error(_) => Severity::Error,
            Outcome::Interrupted(_) => Severity::Interrupted,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Success => None,
            Outcome::Warning(m) | Outcome::Failure(m) | Outcome::Error(m) | Outcome::Interrupted(m) => {
                Some(m)
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Failure or anything worse
    pub fn is_failed(&self) -> bool {
        self.severity() >= Severity::Failure
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Outcome::Interrupted(_))
    }

    /// Combine two outcomes into a new one.
    ///
    /// The more severe side wins. Equal severities merge their messages in
    /// sorted order, so `a.combine(b) == b.combine(a)`.
    pub fn combine(self, other: Outcome) -> Outcome {
        match self.severity().cmp(&other.severity()) {
            std::cmp::Ordering::Greater => self,
            std::cmp::Ordering::Less => other,
            std::cmp::Ordering::Equal => {
                let severity = self.severity();
                match (self.into_message(), other.into_message()) {
                    (Some(a), Some(b)) => Outcome::with_severity(severity, merge_messages(a, b)),
                    _ => Outcome::Success,
                }
            }
        }
    }

    fn into_message(self) -> Option<String> {
        match self {
            Outcome::Success => None,
            Outcome::Warning(m) | Outcome::Failure(m) | Outcome::Error(m) | Outcome::Interrupted(m) => {
                Some(m)
            }
        }
    }

    fn with_severity(severity: Severity, message: String) -> Outcome {
        match severity {
            Severity::Success => Outcome::Success,
            Severity::Warning => Outcome::Warning(message),
            Severity::Failure => Outcome::Failure(message),
            Severity::Error => Outcome::Error(message),
            Severity::Interrupted => Outcome::Interrupted(message),
        }
    }

    /// Process exit code for a finished run
    pub fn exit_code(&self) -> u8 {
        match self.severity() {
            Severity::Success | Severity::Warning => 0,
            Severity::Failure => 1,
            Severity::Error => 2,
            Severity::Interrupted => 3,
        }
    }
}

fn merge_messages(a: String, b: String) -> String {
    let mut lines: Vec<&str> = a.lines().chain(b.lines()).collect();
    lines.sort_unstable();
    lines.dedup();
    lines.join("\n")
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {}", self.severity(), message),
            None => write!(f, "{}", self.severity()),
        }
    }
}

impl FromIterator<Outcome> for Outcome {
    fn from_iter<I: IntoIterator<Item = Outcome>>(iter: I) -> Self {
        iter.into_iter().fold(Outcome::Success, Outcome::combine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Outcome> {
        vec![
            Outcome::Success,
            Outcome::Warning("slow page".into()),
            Outcome::Warning("deprecated command".into()),
            Outcome::Failure("title mismatch".into()),
            Outcome::Failure("text mismatch".into()),
            Outcome::Error("no such element".into()),
            Outcome::Interrupted("aborted".into()),
        ]
    }

    #[test]
    fn test_combine_is_commutative() {
        for a in samples() {
            for b in samples() {
                assert_eq!(a.clone().combine(b.clone()), b.clone().combine(a.clone()));
            }
        }
    }

    #[test]
    fn test_combine_never_lowers_severity() {
        for a in samples() {
            for b in samples() {
                let combined = a.clone().combine(b.clone());
                assert!(combined.severity() >= a.severity().max(b.severity()));
            }
        }
    }

    #[test]
    fn test_equal_severity_merges_messages() {
        let combined = Outcome::Failure("b".into()).combine(Outcome::Failure("a".into()));
        assert_eq!(combined, Outcome::Failure("a\nb".into()));

        let same = Outcome::Error("x".into()).combine(Outcome::Error("x".into()));
        assert_eq!(same, Outcome::Error("x".into()));
    }

    #[test]
    fn test_collect_picks_most_severe() {
        let total: Outcome = vec![
            Outcome::Success,
            Outcome::Failure("f".into()),
            Outcome::Success,
        ]
        .into_iter()
        .collect();
        assert_eq!(total, Outcome::Failure("f".into()));
        assert_eq!(total.exit_code(), 1);
    }

    #[test]
    fn test_interrupted_is_most_severe() {
        assert!(Severity::Interrupted > Severity::Error);
        assert!(Outcome::Interrupted("stop".into()).is_failed());
        assert!(!Outcome::Warning("w".into()).is_failed());
    }
}
