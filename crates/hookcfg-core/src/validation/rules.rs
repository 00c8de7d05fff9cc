//! Reusable field rules and the rule-set validator built from them.
//!
//! [`RuleSetValidator::commit_checker`] is the rule set the hook ships with:
//! regular-expression fields must compile and flag fields must be `true` or
//! `false`.  Unset fields are never checked.

use regex::RegexBuilder;

use super::{FieldCheck, FieldRule, Finding, Validator};
use crate::domain::field_map::FieldMap;
use crate::domain::identity::UserIdentity;

/// Message attached to a pattern field whose value does not parse.
pub const INVALID_PATTERN_MESSAGE: &str = "not a valid pattern";

/// Message attached to a flag field whose value is not `true`/`false`.
pub const INVALID_BOOLEAN_MESSAGE: &str = "must be true or false";

/// Compiled-program size limit applied to pattern fields (1 MiB).
pub const DEFAULT_PATTERN_SIZE_LIMIT: usize = 1 << 20;

const PATTERN_FIELDS: &[&str] = &[
    "issueKeyPattern",
    "committerEmailRegex",
    "commitMessageRegex",
    "excludeByRegex",
    "excludeBranchRegex",
];

const BOOLEAN_FIELDS: &[&str] = &[
    "requireMatchingAuthorEmail",
    "requireMatchingAuthorName",
    "requireJiraIssue",
    "ignoreUnknownIssueProjectKeys",
    "excludeMergeCommits",
    "excludeServiceUserCommits",
];

// ── Rules ─────────────────────────────────────────────────────────────────────

/// The value must compile as a regular expression.
///
/// A syntax error rejects the field.  A pattern that parses but exceeds the
/// size limit is reported as a fault: the rule cannot tell whether the
/// pattern is acceptable, only that it could not build it.
#[derive(Debug, Clone)]
pub struct PatternRule {
    field: String,
    size_limit: usize,
}

impl PatternRule {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            size_limit: DEFAULT_PATTERN_SIZE_LIMIT,
        }
    }

    pub fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }
}

impl FieldRule for PatternRule {
    fn field(&self) -> &str {
        &self.field
    }

    fn check(&self, value: &str) -> FieldCheck {
        match RegexBuilder::new(value).size_limit(self.size_limit).build() {
            Ok(_) => FieldCheck::Valid,
            Err(regex::Error::Syntax(_)) => FieldCheck::invalid(INVALID_PATTERN_MESSAGE),
            Err(e) => FieldCheck::Fault(e.to_string()),
        }
    }
}

/// The value must be exactly `true` or `false`.
#[derive(Debug, Clone)]
pub struct BooleanRule {
    field: String,
}

impl BooleanRule {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl FieldRule for BooleanRule {
    fn field(&self) -> &str {
        &self.field
    }

    fn check(&self, value: &str) -> FieldCheck {
        match value {
            "true" | "false" => FieldCheck::Valid,
            _ => FieldCheck::invalid(INVALID_BOOLEAN_MESSAGE),
        }
    }
}

/// The value must be at most `max` characters long.
#[derive(Debug, Clone)]
pub struct MaxLengthRule {
    field: String,
    max: usize,
}

impl MaxLengthRule {
    pub fn new(field: impl Into<String>, max: usize) -> Self {
        Self {
            field: field.into(),
            max,
        }
    }
}

impl FieldRule for MaxLengthRule {
    fn field(&self) -> &str {
        &self.field
    }

    fn check(&self, value: &str) -> FieldCheck {
        if value.chars().count() > self.max {
            FieldCheck::invalid(format!("must be at most {} characters", self.max))
        } else {
            FieldCheck::Valid
        }
    }
}

// ── Rule set ──────────────────────────────────────────────────────────────────

/// A [`Validator`] that applies a list of [`FieldRule`]s in order.
#[derive(Default)]
pub struct RuleSetValidator {
    rules: Vec<Box<dyn FieldRule>>,
}

impl RuleSetValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule.  Several rules may target the same field.
    pub fn with_rule(mut self, rule: impl FieldRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// The commit-checker hook's settings: pattern fields and flag fields.
    pub fn commit_checker() -> Self {
        let mut validator = Self::new();
        for field in PATTERN_FIELDS {
            validator = validator.with_rule(PatternRule::new(*field));
        }
        for field in BOOLEAN_FIELDS {
            validator = validator.with_rule(BooleanRule::new(*field));
        }
        validator
    }

    /// Fields that have at least one rule, in the order rules were added.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !names.contains(&rule.field()) {
                names.push(rule.field());
            }
        }
        names
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Validator for RuleSetValidator {
    fn validate(&self, fields: &FieldMap, _actor: Option<&UserIdentity>) -> Vec<Finding> {
        self.rules
            .iter()
            .filter_map(|rule| {
                fields.get(rule.field()).map(|value| Finding::Field {
                    field: rule.field().to_string(),
                    check: rule.check(value),
                })
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
