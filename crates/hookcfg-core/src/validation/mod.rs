//! The validator contract and the single place validators are run.
//!
//! # How validation reports problems
//!
//! A validator never returns `Err` and never panics on bad input.  It returns
//! a list of [`Finding`]s instead:
//!
//! - [`Finding::Field`] carries the structured [`FieldCheck`] result of one
//!   field rule: valid, invalid with messages, or an internal fault.
//! - [`Finding::Form`] carries a message about the submission as a whole.
//!
//! [`validate_fields`] folds the findings into a fresh [`ValidationReport`].
//! Faults are logged and dropped there: a rule that could not decide adds no
//! message, and every other rule still runs.

pub mod rules;

use tracing::warn;

use crate::domain::field_errors::FieldErrors;
use crate::domain::field_map::FieldMap;
use crate::domain::identity::UserIdentity;

/// Outcome of checking one field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCheck {
    /// The value is acceptable.
    Valid,
    /// The value is rejected; each message is shown next to the field.
    Invalid(Vec<String>),
    /// The rule could not evaluate the value.  Contributes no message.
    Fault(String),
}

impl FieldCheck {
    /// Shorthand for a rejection with a single message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(vec![message.into()])
    }
}

/// One observation produced by a [`Validator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    Field { field: String, check: FieldCheck },
    Form(String),
}

/// A single rule attached to one named field.
pub trait FieldRule: Send + Sync {
    /// Name of the field this rule inspects.
    fn field(&self) -> &str;

    /// Checks a set value.  Rules are not consulted for unset fields.
    fn check(&self, value: &str) -> FieldCheck;
}

/// Pluggable acceptance rules for a settings submission.
///
/// `actor` is `None` for non-interactive passes, such as re-validating the
/// stored snapshot before it is displayed.
pub trait Validator: Send + Sync {
    fn validate(&self, fields: &FieldMap, actor: Option<&UserIdentity>) -> Vec<Finding>;
}

/// A validator fault that was logged and suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressedFault {
    pub field: String,
    pub reason: String,
}

/// Everything one validation run produced for one [`FieldMap`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub field_errors: FieldErrors,
    /// Submission-wide messages.  Carried for callers but not rendered by the
    /// settings page.
    pub form_errors: Vec<String>,
    pub suppressed: Vec<SuppressedFault>,
}

impl ValidationReport {
    /// `true` when no field was rejected.  Form-level messages and
    /// suppressed faults do not count.
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty()
    }
}

/// Runs `validator` against `fields` and collects a fresh report.
pub fn validate_fields(
    validator: &dyn Validator,
    fields: &FieldMap,
    actor: Option<&UserIdentity>,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for finding in validator.validate(fields, actor) {
        match finding {
            Finding::Field { field, check } => match check {
                FieldCheck::Valid => {}
                FieldCheck::Invalid(messages) => report.field_errors.extend(&field, messages),
                FieldCheck::Fault(reason) => {
                    warn!("validator fault on field {field} suppressed: {reason}");
                    report.suppressed.push(SuppressedFault { field, reason });
                }
            },
            Finding::Form(message) => report.form_errors.push(message),
        }
    }

    report
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed list of findings regardless of input.
    struct Scripted(Vec<Finding>);

    impl Validator for Scripted {
        fn validate(&self, _fields: &FieldMap, _actor: Option<&UserIdentity>) -> Vec<Finding> {
            self.0.clone()
        }
    }

    fn field(name: &str, check: FieldCheck) -> Finding {
        Finding::Field {
            field: name.to_string(),
            check,
        }
    }

    #[test]
    fn test_all_valid_findings_produce_valid_report() {
        let validator = Scripted(vec![field("a", FieldCheck::Valid), field("b", FieldCheck::Valid)]);
        let report = validate_fields(&validator, &FieldMap::new(), None);
        assert!(report.is_valid());
        assert!(report.suppressed.is_empty());
    }

    #[test]
    fn test_invalid_findings_are_collected_per_field() {
        // Arrange
        let validator = Scripted(vec![
            field("a", FieldCheck::invalid("bad a")),
            field("b", FieldCheck::Valid),
            field("a", FieldCheck::invalid("worse a")),
        ]);

        // Act
        let report = validate_fields(&validator, &FieldMap::new(), None);

        // Assert
        assert!(!report.is_valid());
        assert_eq!(
            report.field_errors.get("a").unwrap(),
            &["bad a".to_string(), "worse a".to_string()]
        );
        assert!(report.field_errors.get("b").is_none());
    }

    #[test]
    fn test_fault_is_suppressed_and_other_fields_still_checked() {
        // Arrange
        let validator = Scripted(vec![
            field("a", FieldCheck::Fault("regex too big".into())),
            field("b", FieldCheck::invalid("bad b")),
        ]);

        // Act
        let report = validate_fields(&validator, &FieldMap::new(), None);

        // Assert: the faulting field has no message, the other one does
        assert!(report.field_errors.get("a").is_none());
        assert_eq!(report.field_errors.len(), 1);
        assert_eq!(
            report.suppressed,
            vec![SuppressedFault {
                field: "a".into(),
                reason: "regex too big".into()
            }]
        );
    }

    #[test]
    fn test_only_faults_leave_report_valid() {
        let validator = Scripted(vec![field("a", FieldCheck::Fault("boom".into()))]);
        let report = validate_fields(&validator, &FieldMap::new(), None);
        assert!(report.is_valid());
    }

    #[test]
    fn test_form_errors_are_carried_but_do_not_invalidate() {
        let validator = Scripted(vec![Finding::Form("settings incomplete".into())]);
        let report = validate_fields(&validator, &FieldMap::new(), None);
        assert!(report.is_valid());
        assert_eq!(report.form_errors, vec!["settings incomplete".to_string()]);
    }

    #[test]
    fn test_each_run_starts_from_a_clean_report() {
        // Arrange
        let validator = Scripted(vec![field("a", FieldCheck::invalid("bad"))]);
        let fields = FieldMap::new();

        // Act
        let first = validate_fields(&validator, &fields, None);
        let second = validate_fields(&validator, &fields, None);

        // Assert: messages do not pile up across runs
        assert_eq!(first, second);
        assert_eq!(second.field_errors.get("a").unwrap().len(), 1);
    }
}
