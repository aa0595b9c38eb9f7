//! Record classification into normalized documents

use crate::blob::{BlobContentExtractor, TypeHint};
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::keywords::{Vocabulary, DECOR, FLOWER};
use crate::rules::{
    default_rules, parse_amount, FieldProbe, Patterns, RoleRule, DATE_FIELD, FALLBACK_RULE,
    FIELD_ERROR_RULE, NUMBER_FIELD,
};
use ledgerlift_domain::{
    BlobCategory, BlobSummary, Container, Document, FieldRole, FieldValue, LineItem, Record,
    RoleAssignment, ScalarValue, Table,
};
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// Legal-form markers that identify counterpart names
const LEGAL_FORMS: [&str; 6] = ["ООО", "ИП", "АО", "ЗАО", "ОАО", "ПАО"];

/// Field holding a record's own reference
pub const REF_FIELD: &str = "_IDRREF";

/// Classifies record fields into semantic roles
#[derive(Debug, Clone)]
pub struct DocumentStructureAnalyzer {
    rules: Vec<RoleRule>,
    patterns: Patterns,
    store_name: Regex,
    store_code: Regex,
    extractor: BlobContentExtractor,
    description_min_len: usize,
}

impl DocumentStructureAnalyzer {
    /// Create an analyzer with the built-in rule table
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        Ok(Self {
            rules: default_rules(),
            patterns: Patterns::compile()?,
            store_name: Regex::new(
                r#"(?i)\b(?:магазин|салон|склад|точка)\s+[«"']?([\p{L}\d][\p{L}\d\-]*(?:\s+[\p{L}\d][\p{L}\d\-]*)?)"#,
            )?,
            store_code: Regex::new(r"\b[A-Z]{2,3}\d{3,5}\b")?,
            description_min_len: config.description_min_len,
            extractor: BlobContentExtractor::new(config),
        })
    }

    /// Replace the rule table
    pub fn with_rules(mut self, rules: Vec<RoleRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Classify a record without table parts
    pub fn classify(&self, record: &Record, table_name: &str, row_index: usize) -> Document {
        self.classify_with_parts(record, table_name, row_index, &TablePartIndex::default())
    }

    /// Classify a record and attach its table-part rows
    pub fn classify_with_parts(
        &self,
        record: &Record,
        table_name: &str,
        row_index: usize,
        parts: &TablePartIndex,
    ) -> Document {
        let mut doc = Document::new(table_name, row_index);
        let mut number_candidates = Vec::new();
        let mut date_candidates = Vec::new();

        for (name, value) in &record.fields {
            match value {
                FieldValue::Scalar(scalar) => {
                    doc.fields.insert(name.clone(), scalar.to_json());
                    let assignment = self.assign_role(&mut doc, name, scalar);

                    match assignment.role {
                        FieldRole::Number => number_candidates.push((name.as_str(), scalar)),
                        FieldRole::Date => date_candidates.push((name.as_str(), scalar)),
                        FieldRole::Type if doc.document_type.is_none() => {
                            doc.document_type = Some(scalar.to_string().trim().to_string());
                        }
                        _ => {}
                    }

                    if let Some(text) = scalar.as_text() {
                        if has_legal_form(text) {
                            let name = text.trim().to_string();
                            if !doc.counterpart_names.contains(&name) {
                                doc.counterpart_names.push(name);
                            }
                        }
                    }
                    doc.field_roles.insert(name.clone(), assignment);
                }
                FieldValue::Blob(handle) => {
                    let result = self.extractor.extract(handle.as_ref(), Some(TypeHint::Document));
                    doc.stats.record_blob(result.is_success());
                    if let Some(content) = &result.content {
                        self.apply_blob_text(&mut doc, content);
                    }
                    doc.blobs
                        .insert(name.clone(), BlobSummary::from_result(result, handle.len()));
                }
            }
        }

        doc.document_number = pick(&number_candidates, NUMBER_FIELD);
        doc.document_date = pick(&date_candidates, DATE_FIELD);

        if let Some(key) = record.scalar(REF_FIELD).map(ScalarValue::to_string) {
            doc.line_items = parts.items_for(&key).to_vec();
        }

        doc
    }

    /// Run the rule table over one scalar field
    fn assign_role(&self, doc: &mut Document, name: &str, value: &ScalarValue) -> RoleAssignment {
        let probe = FieldProbe {
            name,
            value,
            description_min_len: self.description_min_len,
            patterns: &self.patterns,
        };

        let Some(rule) = self.rules.iter().find(|r| r.matches(&probe)) else {
            return RoleAssignment {
                role: FieldRole::Other,
                rule: FALLBACK_RULE.to_string(),
                confidence: 0.0,
            };
        };

        if rule.role == FieldRole::Amount {
            match parse_amount(name, value) {
                Ok(amount) => {
                    if doc.total_amount.is_none() {
                        doc.total_amount = Some(amount);
                    }
                }
                Err(e) => {
                    debug!(field = %name, error = %e, "Field classification failed");
                    doc.stats.field_errors += 1;
                    doc.field_errors.push(e.to_string());
                    return RoleAssignment {
                        role: FieldRole::Other,
                        rule: FIELD_ERROR_RULE.to_string(),
                        confidence: 0.0,
                    };
                }
            }
        }

        RoleAssignment {
            role: rule.role,
            rule: rule.name.to_string(),
            confidence: rule.confidence,
        }
    }

    /// Store name, store code and category from decoded blob text
    ///
    /// Later blobs overwrite what earlier blobs of the same record found.
    fn apply_blob_text(&self, doc: &mut Document, content: &str) {
        if let Some(name) = self.store_name.captures(content).and_then(|c| c.get(1)) {
            doc.store_name = Some(name.as_str().trim().to_string());
        }
        if let Some(code) = self.store_code.find(content) {
            doc.store_code = Some(code.as_str().to_string());
        }

        let lowered = content.to_lowercase();
        let contains_any = |words: &[&str]| words.iter().any(|w| lowered.contains(w));
        let category = if contains_any(FLOWER) {
            Some(BlobCategory::Flower)
        } else if contains_any(DECOR) {
            Some(BlobCategory::Decor)
        } else if contains_any(Vocabulary::DocumentType.keywords()) {
            Some(BlobCategory::Type)
        } else {
            None
        };
        if category.is_some() {
            doc.category = category;
        }
    }
}

/// The exact identifier wins, otherwise the first candidate in field order
///
/// The stringified value is kept as is, padding included; a blank value
/// yields `None`.
fn pick(candidates: &[(&str, &ScalarValue)], exact: &str) -> Option<String> {
    candidates
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(exact))
        .or_else(|| candidates.first())
        .map(|(_, value)| value.to_string())
        .filter(|s| !s.trim().is_empty())
}

fn has_legal_form(text: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|word| LEGAL_FORMS.contains(&word))
}

/// Name aliases for line-item attributes, matched as lowercase substrings
const NOMENCLATURE_ALIASES: [&str; 5] = ["номенклатур", "товар", "nomenclature", "product", "item"];
const QUANTITY_ALIASES: [&str; 4] = ["количеств", "quantity", "qty", "кол"];
const PRICE_ALIASES: [&str; 2] = ["цена", "price"];
const AMOUNT_ALIASES: [&str; 4] = ["сумма", "amount", "sum", "total"];
const LINE_NUMBER_ALIASES: [&str; 3] = ["lineno", "номерстроки", "line_number"];

/// Table-part rows grouped by the parent record they belong to
#[derive(Debug, Clone, Default)]
pub struct TablePartIndex {
    items: HashMap<String, Vec<LineItem>>,
    tables: Vec<String>,
}

impl TablePartIndex {
    /// Scan the table parts of `parent`
    ///
    /// Child tables are named `<parent>_VT<n>` and link to the parent through
    /// a `<parent>_IDRREF` field. At most `row_cap` rows are read per child;
    /// unreadable rows are skipped.
    pub fn build(container: &dyn Container, parent: &str, row_cap: usize) -> Self {
        Self::build_until(container, parent, row_cap, || false)
    }

    /// Like [`TablePartIndex::build`], stopping as soon as `stop` returns true
    ///
    /// `stop` is polled before every child row. Rows indexed so far are kept.
    /// Items of one parent are grouped by table part in part order, then by
    /// line number within each part.
    pub fn build_until(
        container: &dyn Container,
        parent: &str,
        row_cap: usize,
        stop: impl Fn() -> bool,
    ) -> Self {
        let prefix = format!("{}_VT", parent.to_ascii_uppercase());
        let link_field = format!("{}{}", parent, REF_FIELD);
        let mut index = Self::default();

        let mut parts: Vec<(u64, String)> = container
            .table_names()
            .into_iter()
            .filter_map(|name| {
                let upper = name.to_ascii_uppercase();
                let suffix = upper.strip_prefix(&prefix)?;
                Some((suffix.parse().unwrap_or(u64::MAX), name))
            })
            .collect();
        parts.sort();

        for (_, name) in parts {
            let Some(table) = container.table(&name) else {
                continue;
            };

            let mut linked: HashMap<String, Vec<LineItem>> = HashMap::new();
            let mut rows = 0usize;
            let mut stopped = false;
            for i in 0..table.len().min(row_cap) {
                if stop() {
                    stopped = true;
                    break;
                }
                let record = match table.record(i) {
                    Ok(record) if record.is_empty() => continue,
                    Ok(record) => record,
                    Err(e) => {
                        debug!(table = %name, index = i, error = %e, "Skipping table-part row");
                        continue;
                    }
                };

                let link = record
                    .fields
                    .iter()
                    .find(|(field, _)| field.eq_ignore_ascii_case(&link_field))
                    .and_then(|(_, value)| value.as_scalar())
                    .filter(|value| !value.is_null());
                let Some(link) = link else {
                    continue;
                };

                linked
                    .entry(link.to_string())
                    .or_default()
                    .push(line_item(&record, &link_field));
                rows += 1;
            }

            for (key, mut items) in linked {
                items.sort_by_key(|item| item.line_number.unwrap_or(i64::MAX));
                index.items.entry(key).or_default().extend(items);
            }
            debug!(table = %name, rows, "Indexed table part");
            index.tables.push(name);

            if stopped {
                debug!(parent, "Table-part scan stopped");
                break;
            }
        }

        index
    }

    /// Line items linked to the given parent key
    pub fn items_for(&self, key: &str) -> &[LineItem] {
        self.items.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Child tables that were scanned
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Whether no rows were indexed
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Resolve one table-part row by field-name aliases, then by position
pub fn line_item(record: &Record, link_field: &str) -> LineItem {
    let mut item = LineItem::default();
    let mut unassigned = Vec::new();

    for (name, value) in &record.fields {
        let Some(scalar) = value.as_scalar() else {
            continue;
        };
        if name.eq_ignore_ascii_case(link_field) || scalar.is_null() {
            continue;
        }

        let lowered = name.to_lowercase();
        let has = |aliases: &[&str]| aliases.iter().any(|a| lowered.contains(a));

        if has(&LINE_NUMBER_ALIASES) && item.line_number.is_none() {
            item.line_number = scalar.as_f64().map(|n| n as i64);
        } else if has(&NOMENCLATURE_ALIASES) && item.nomenclature.is_none() {
            item.nomenclature = Some(scalar.to_string());
        } else if has(&QUANTITY_ALIASES) && item.quantity.is_none() {
            item.quantity = numeric(scalar);
        } else if has(&PRICE_ALIASES) && item.price.is_none() {
            item.price = numeric(scalar);
        } else if has(&AMOUNT_ALIASES) && item.amount.is_none() {
            item.amount = numeric(scalar);
        } else if is_data_field(name) {
            unassigned.push(scalar);
        }
    }

    for scalar in unassigned {
        match scalar {
            ScalarValue::Text(_) | ScalarValue::Binary(_) => {
                if item.nomenclature.is_none() {
                    item.nomenclature = Some(scalar.to_string());
                }
            }
            ScalarValue::Int(_) | ScalarValue::Float(_) | ScalarValue::Decimal(_) => {
                let value = numeric(scalar);
                if item.quantity.is_none() {
                    item.quantity = value;
                } else if item.price.is_none() {
                    item.price = value;
                } else if item.amount.is_none() {
                    item.amount = value;
                }
            }
            _ => {}
        }
    }

    item
}

fn numeric(value: &ScalarValue) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

/// User-defined columns (`_FLDnnn`) and non-system names
fn is_data_field(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    upper.starts_with("_FLD") || !upper.starts_with('_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_record(fields: Vec<(&str, ScalarValue)>) -> Record {
        Record::new(
            0,
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.into()))
                .collect(),
        )
    }

    fn analyzer() -> DocumentStructureAnalyzer {
        DocumentStructureAnalyzer::new(ExtractorConfig::default()).unwrap()
    }

    #[test]
    fn test_positional_fallback_picks_first_candidate() {
        let record = scalar_record(vec![
            ("_FLD1", ScalarValue::Text("A-00017".into())),
            ("_FLD2", ScalarValue::Text("00099".into())),
        ]);
        let doc = analyzer().classify(&record, "_DOCUMENT1", 0);
        assert_eq!(doc.document_number.as_deref(), Some("A-00017"));
    }

    #[test]
    fn test_first_amount_wins() {
        let record = scalar_record(vec![
            ("_FLD1", ScalarValue::Decimal("150.00".into())),
            ("_FLD2", ScalarValue::Float(99.5)),
        ]);
        let doc = analyzer().classify(&record, "_DOCUMENT1", 0);
        assert_eq!(doc.total_amount, Some(150.0));
        assert_eq!(doc.fields_with_role(FieldRole::Amount).count(), 2);
    }

    #[test]
    fn test_counterparts_and_type() {
        let record = scalar_record(vec![
            ("_FLD1", ScalarValue::Text("Реализация товаров".into())),
            ("_FLD2", ScalarValue::Text("ООО \"Ромашка\"".into())),
            ("_FLD3", ScalarValue::Text("ИП Иванов".into())),
            ("_FLD4", ScalarValue::Text("АОрта".into())),
        ]);
        let doc = analyzer().classify(&record, "_DOCUMENT1", 0);

        assert_eq!(doc.document_type.as_deref(), Some("Реализация товаров"));
        assert_eq!(doc.counterpart_names, vec!["ООО \"Ромашка\"", "ИП Иванов"]);
    }

    #[test]
    fn test_line_item_aliases() {
        let record = scalar_record(vec![
            ("_DOCUMENT1_IDRREF", ScalarValue::Binary(vec![1])),
            ("_LineNo7", ScalarValue::Int(2)),
            ("Номенклатура", ScalarValue::Text("Роза красная".into())),
            ("Количество", ScalarValue::Int(10)),
            ("Цена", ScalarValue::Decimal("120".into())),
            ("Сумма", ScalarValue::Decimal("1200".into())),
        ]);
        let item = line_item(&record, "_DOCUMENT1_IDRREF");
        assert_eq!(item.line_number, Some(2));
        assert_eq!(item.nomenclature.as_deref(), Some("Роза красная"));
        assert_eq!(item.quantity, Some(10.0));
        assert_eq!(item.price, Some(120.0));
        assert_eq!(item.amount, Some(1200.0));
    }

    #[test]
    fn test_line_item_positional_fallback() {
        let record = scalar_record(vec![
            ("_DOCUMENT1_IDRREF", ScalarValue::Binary(vec![1])),
            ("_KEYFIELD", ScalarValue::Binary(vec![0, 1])),
            ("_FLD20RREF", ScalarValue::Binary(vec![0xab, 0xcd])),
            ("_FLD21", ScalarValue::Decimal("3".into())),
            ("_FLD22", ScalarValue::Decimal("50".into())),
            ("_FLD23", ScalarValue::Decimal("150".into())),
        ]);
        let item = line_item(&record, "_DOCUMENT1_IDRREF");
        assert_eq!(item.nomenclature.as_deref(), Some("abcd"));
        assert_eq!(item.quantity, Some(3.0));
        assert_eq!(item.price, Some(50.0));
        assert_eq!(item.amount, Some(150.0));
    }

    #[test]
    fn test_legal_form_requires_whole_word() {
        assert!(has_legal_form("ЗАО Цветы"));
        assert!(has_legal_form("Поставщик: ПАО «Флора»"));
        assert!(!has_legal_form("АОрта"));
    }
}
