//! Field role rules
//!
//! Roles are assigned by an ordered table of rules. The first rule whose
//! predicate accepts a field decides its role; every field gets exactly one.

use crate::error::FieldError;
use crate::keywords::Vocabulary;
use ledgerlift_domain::{FieldRole, ScalarValue};
use regex::Regex;

/// Exact identifier of the document number field
pub const NUMBER_FIELD: &str = "_NUMBER";

/// Exact identifier of the document date field
pub const DATE_FIELD: &str = "_DATE_TIME";

/// One scalar field under classification
#[derive(Debug, Clone, Copy)]
pub struct FieldProbe<'a> {
    /// Field name
    pub name: &'a str,
    /// Field value
    pub value: &'a ScalarValue,
    /// Minimum length of free text treated as a description
    pub description_min_len: usize,
    /// Content patterns
    pub patterns: &'a Patterns,
}

impl FieldProbe<'_> {
    fn text(&self) -> Option<&str> {
        self.value.as_text().map(str::trim)
    }
}

/// A classification rule
#[derive(Debug, Clone)]
pub struct RoleRule {
    /// Rule name recorded in the role assignment
    pub name: &'static str,
    /// Role assigned when the predicate matches
    pub role: FieldRole,
    /// Heuristic confidence of the rule
    pub confidence: f64,
    /// Match predicate
    pub predicate: fn(&FieldProbe<'_>) -> bool,
}

impl RoleRule {
    /// Whether the rule accepts the field
    pub fn matches(&self, probe: &FieldProbe<'_>) -> bool {
        (self.predicate)(probe)
    }
}

/// The built-in rule table, in evaluation order
pub fn default_rules() -> Vec<RoleRule> {
    vec![
        RoleRule {
            name: "exact_number",
            role: FieldRole::Number,
            confidence: 1.0,
            predicate: |p| p.name.eq_ignore_ascii_case(NUMBER_FIELD),
        },
        RoleRule {
            name: "exact_date",
            role: FieldRole::Date,
            confidence: 1.0,
            predicate: |p| p.name.eq_ignore_ascii_case(DATE_FIELD),
        },
        RoleRule {
            name: "typed_datetime",
            role: FieldRole::Date,
            confidence: 0.9,
            predicate: |p| matches!(p.value, ScalarValue::DateTime(_)),
        },
        RoleRule {
            name: "numeric_string",
            role: FieldRole::Number,
            confidence: 0.7,
            predicate: |p| p.text().is_some_and(|t| p.patterns.numeric.is_match(t)),
        },
        RoleRule {
            name: "date_string",
            role: FieldRole::Date,
            confidence: 0.6,
            predicate: |p| p.text().is_some_and(|t| p.patterns.date.is_match(t)),
        },
        RoleRule {
            name: "amount",
            role: FieldRole::Amount,
            confidence: 0.6,
            predicate: |p| match p.value {
                ScalarValue::Float(_) | ScalarValue::Decimal(_) => true,
                ScalarValue::Text(t) => p.patterns.amount.is_match(t.trim()),
                _ => false,
            },
        },
        RoleRule {
            name: "type_vocabulary",
            role: FieldRole::Type,
            confidence: 0.5,
            predicate: |p| {
                p.text().is_some_and(|t| {
                    let lowered = t.to_lowercase();
                    Vocabulary::DocumentType
                        .keywords()
                        .iter()
                        .any(|k| lowered.contains(k))
                })
            },
        },
        RoleRule {
            name: "long_text",
            role: FieldRole::Description,
            confidence: 0.3,
            predicate: |p| {
                p.text()
                    .is_some_and(|t| t.chars().count() >= p.description_min_len)
            },
        },
    ]
}

/// Name of the pseudo-rule for fields no rule accepted
pub const FALLBACK_RULE: &str = "fallback";

/// Name of the pseudo-rule for fields whose classification failed
pub const FIELD_ERROR_RULE: &str = "field_error";

/// Compiled content patterns used by the rules
#[derive(Debug, Clone)]
pub struct Patterns {
    /// Optional short alphabetic prefix, then at least three digits
    numeric: Regex,
    /// Four-digit year 19xx/20xx, or d.m.y with common separators
    date: Regex,
    /// Grouped digits with a decimal part and/or a currency marker
    amount: Regex,
}

impl Patterns {
    /// Compile the built-in patterns
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            numeric: Regex::new(r"^\p{L}{0,4}[-/]?\d{3,}$")?,
            date: Regex::new(r"\b(?:19|20)\d{2}\b|\b\d{1,2}[./-]\d{1,2}[./-]\d{2,4}\b")?,
            amount: Regex::new(
                r"(?i)^-?\d[\d\s]*(?:[.,]\d{1,2})?\s*(?:руб\.?|р\.|₽|rub)$|^-?\d[\d\s]*[.,]\d{1,2}$",
            )?,
        })
    }
}

/// Numeric value of an amount field
pub fn parse_amount(name: &str, value: &ScalarValue) -> Result<f64, FieldError> {
    let parsed = match value {
        ScalarValue::Float(f) => Some(*f),
        ScalarValue::Int(i) => Some(*i as f64),
        ScalarValue::Decimal(d) => d.trim().parse::<f64>().ok(),
        ScalarValue::Text(t) => {
            let digits: String = t
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            digits.trim_end_matches('.').parse::<f64>().ok()
        }
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(FieldError::NonFiniteNumber {
            field: name.to_string(),
            value: v.to_string(),
        }),
        None => Err(FieldError::UnparsableAmount {
            field: name.to_string(),
            value: value.to_string(),
        }),
    }
}
