//! Cross-component tests for the extractors

#[cfg(test)]
mod tests {
    use crate::{
        BlobContentExtractor, DocumentStructureAnalyzer, ExtractorConfig, KeywordClassifier,
        KeywordSet, TablePartIndex, TableStructureAnalyzer, TypeHint,
    };
    use ledgerlift_domain::{
        BlobCategory, ContainerSource, ExtractionMethod, FieldRole, FieldValue, MatchKind,
        Priority, Record, ScalarValue, Table,
    };
    use ledgerlift_reader::{Access, BlobAccess, MemoryBlob, MemorySource, MemoryTable, MemoryValue};

    fn record(fields: Vec<(&str, MemoryValue)>) -> Record {
        let table = MemoryTable::new("T").with_row(fields);
        table.record(0).unwrap()
    }

    fn text(value: &str) -> MemoryValue {
        ScalarValue::Text(value.to_string()).into()
    }

    fn analyzer() -> DocumentStructureAnalyzer {
        DocumentStructureAnalyzer::new(ExtractorConfig::default()).unwrap()
    }

    #[test]
    fn test_roses_bytes_decode_as_utf8() {
        let blob = MemoryBlob::bytes(b"ROSES".to_vec()).with_access(BlobAccess::bytes_only());
        let result = BlobContentExtractor::default().extract(&blob, None);

        assert_eq!(result.content.as_deref(), Some("ROSES"));
        assert_eq!(
            result.methods,
            vec![ExtractionMethod::RawBytes, ExtractionMethod::TextUtf8]
        );
        assert_eq!(result.encoding(), Some(ExtractionMethod::TextUtf8));
        assert_eq!(result.encoding().map(|m| m.as_str()), Some("text_utf8"));
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_bytes_only_handles_never_fail() {
        let samples: Vec<Vec<u8>> = vec![
            vec![0x00],
            vec![0xff, 0xfe, 0x41, 0x00],
            vec![0xd0, 0xa0, 0xd0, 0xbe],
            vec![0x98, 0x98, 0x98],
            (0u8..=255).collect(),
            vec![0x01; 64],
        ];

        let extractor = BlobContentExtractor::default();
        for bytes in samples {
            let blob = MemoryBlob::bytes(bytes.clone()).with_access(BlobAccess::bytes_only());
            let result = extractor.extract(&blob, None);

            assert!(result.is_success(), "no content for {:?}", bytes);
            assert_eq!(result.strategy(), Some(ExtractionMethod::RawBytes));
            assert!(matches!(
                result.encoding(),
                Some(
                    ExtractionMethod::TextUtf16
                        | ExtractionMethod::TextUtf8
                        | ExtractionMethod::TextCp1251
                        | ExtractionMethod::Hex
                )
            ));
            assert!((0.0..=1.0).contains(&result.quality_score));
        }
    }

    #[test]
    fn test_handle_without_capabilities_yields_nothing() {
        let blob = MemoryBlob::text("unreachable").with_access(BlobAccess::none());
        let result = BlobContentExtractor::default().extract(&blob, None);

        assert!(result.content.is_none());
        assert!(result.methods.is_empty());
        assert_eq!(result.quality_score, 0.0);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_one_error_per_failed_strategy() {
        let failing = |name: &str| Access::Failing(format!("{} broken", name));
        let blob = MemoryBlob::text("unreachable").with_access(BlobAccess {
            value: failing("value"),
            chunks: failing("chunks"),
            bytes: Access::Absent,
            coerce: failing("coerce"),
            internal: failing("internal"),
        });
        let result = BlobContentExtractor::default().extract(&blob, None);

        assert!(result.content.is_none());
        assert!(result.methods.is_empty());
        assert_eq!(result.quality_score, 0.0);
        assert_eq!(result.errors.len(), 4);
        assert!(result.errors[0].starts_with("direct_value: "));
        assert!(result.errors[3].starts_with("internal_buffer: "));
    }

    #[test]
    fn test_first_strategy_with_content_wins() {
        let blob = MemoryBlob::text("Склад Центральный").with_access(BlobAccess {
            value: Access::Failing("stale page".into()),
            ..BlobAccess::all()
        });
        let result = BlobContentExtractor::default().extract(&blob, None);

        assert_eq!(result.methods, vec![ExtractionMethod::Iteration]);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_empty_blob_falls_through() {
        let blob = MemoryBlob::bytes(Vec::new());
        let result = BlobContentExtractor::default().extract(&blob, None);
        assert!(!result.is_success());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_type_hint_raises_score() {
        let content = "Реализация товаров, накладная 15";
        let blob = MemoryBlob::text(content).with_access(BlobAccess {
            value: Access::Available,
            ..BlobAccess::none()
        });
        let extractor = BlobContentExtractor::default();

        let plain = extractor.extract(&blob, None);
        let hinted = extractor.extract(&blob, Some(TypeHint::Document));
        assert!(hinted.quality_score > plain.quality_score);
    }

    #[test]
    fn test_number_and_date_identifiers() {
        let record = record(vec![
            ("_NUMBER", text("12345")),
            ("_DATE_TIME", text("2024-01-01")),
        ]);
        let doc = analyzer().classify(&record, "_DOCUMENT1", 0);

        assert_eq!(doc.document_number.as_deref(), Some("12345"));
        assert_eq!(doc.document_date.as_deref(), Some("2024-01-01"));
        assert_eq!(doc.field_roles["_NUMBER"].rule, "exact_number");
        assert_eq!(doc.field_roles["_DATE_TIME"].confidence, 1.0);
    }

    #[test]
    fn test_exact_identifier_precedes_pattern_match() {
        // "0042" looks like a number too, but the exact field wins
        let record = record(vec![
            ("_FLD1", text("0042")),
            ("_NUMBER", text("ЦБ-0001")),
        ]);
        let doc = analyzer().classify(&record, "_DOCUMENT1", 0);
        assert_eq!(doc.document_number.as_deref(), Some("ЦБ-0001"));
    }

    #[test]
    fn test_number_keeps_stringified_value() {
        let padded = record(vec![("_NUMBER", text("  0042 "))]);
        let doc = analyzer().classify(&padded, "_DOCUMENT1", 0);
        assert_eq!(doc.document_number.as_deref(), Some("  0042 "));

        let blank = record(vec![("_NUMBER", text("   "))]);
        assert!(analyzer().classify(&blank, "_DOCUMENT1", 0).document_number.is_none());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let record = record(vec![
            ("_IDRREF", ScalarValue::Binary(vec![1, 2]).into()),
            ("_NUMBER", text("0001")),
            ("_FLD3", ScalarValue::Decimal("10.50".into()).into()),
            ("_FLD4", text("ООО Ромашка")),
            ("_FLD5", MemoryBlob::text("магазин Лилия, код MSK0042, розы").into()),
        ]);
        let analyzer = analyzer();

        let first = analyzer.classify(&record, "_DOCUMENT1", 7);
        let second = analyzer.classify(&record, "_DOCUMENT1", 7);
        assert_eq!(first, second);
    }

    #[test]
    fn test_blob_attributes() {
        let record = record(vec![
            ("_FLD1", MemoryBlob::text("Продажа: магазин Лилия, точка MSK0042").into()),
            ("_FLD2", MemoryBlob::text("Букет из 15 роз").into()),
        ]);
        let doc = analyzer().classify(&record, "_DOCUMENT1", 0);

        assert_eq!(doc.store_name.as_deref(), Some("Лилия"));
        assert_eq!(doc.store_code.as_deref(), Some("MSK0042"));
        assert_eq!(doc.category, Some(BlobCategory::Flower));
        assert_eq!(doc.stats.total, 2);
        assert_eq!(doc.stats.successful, 2);
        assert_eq!(doc.blob_count(), 2);
    }

    #[test]
    fn test_later_blob_overwrites_store_name() {
        let record = record(vec![
            ("_FLD1", MemoryBlob::text("магазин Лилия").into()),
            ("_FLD2", MemoryBlob::text("салон Орхидея").into()),
        ]);
        let doc = analyzer().classify(&record, "_DOCUMENT1", 0);
        assert_eq!(doc.store_name.as_deref(), Some("Орхидея"));
    }

    #[test]
    fn test_failed_blob_counts_in_stats() {
        let record = record(vec![(
            "_FLD1",
            MemoryBlob::text("x").with_access(BlobAccess::none()).into(),
        )]);
        let doc = analyzer().classify(&record, "_DOCUMENT1", 0);

        assert_eq!(doc.stats.total, 1);
        assert_eq!(doc.stats.failed, 1);
        assert_eq!(doc.stats.total, doc.stats.successful + doc.stats.failed);
        assert!(doc.blobs["_FLD1"].content.is_none());
    }

    #[test]
    fn test_field_error_keeps_raw_value() {
        let record = record(vec![
            ("_NUMBER", text("0001")),
            ("_FLD2", ScalarValue::Float(f64::NAN).into()),
            ("_FLD3", ScalarValue::Decimal("n/a".into()).into()),
        ]);
        let doc = analyzer().classify(&record, "_DOCUMENT1", 0);

        assert_eq!(doc.document_number.as_deref(), Some("0001"));
        assert_eq!(doc.stats.field_errors, 2);
        assert_eq!(doc.field_errors.len(), 2);
        assert_eq!(doc.field_roles["_FLD2"].role, FieldRole::Other);
        assert_eq!(doc.fields["_FLD3"], serde_json::json!("n/a"));
        assert!(doc.total_amount.is_none());
    }

    #[test]
    fn test_keyword_search_regular_match() {
        let record = record(vec![("desc", text("красные розы"))]);
        let set = KeywordSet::custom("flowers", ["роз"]);
        let result = KeywordClassifier::default().search(&record, &set);

        assert!(result.found.contains("роз"));
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].kind, MatchKind::Regular);
        assert_eq!(result.matches[0].kind.as_str(), "regular");
        assert_eq!(result.matches[0].field, "desc");
    }

    #[test]
    fn test_keyword_search_blob_match_and_noise() {
        let record = record(vec![
            ("_FLD1", MemoryBlob::bytes("Брак: розы".as_bytes().to_vec()).into()),
            ("_FLD2", MemoryBlob::text("ро").into()),
        ]);
        let set = KeywordSet::custom("mixed", ["брак", "ро"]);
        let result = KeywordClassifier::default().search(&record, &set);

        assert!(result.found.contains("брак"));
        assert!(result.matches.iter().all(|m| m.kind == MatchKind::Blob));
        assert!(result.matches.iter().all(|m| m.field == "_FLD1"));
        assert_eq!(result.metadata["blobs_discarded"], "1");
    }

    #[test]
    fn test_all_empty_table() {
        let table = MemoryTable::new("_DOCUMENT5")
            .with_tombstone()
            .with_tombstone()
            .with_tombstone();
        let analysis = TableStructureAnalyzer::new(10).analyze(&table);

        assert_eq!(analysis.record_count, 3);
        assert!(analysis.field_types.is_empty());
        assert!(analysis.sample_records.is_empty());
        assert!(analysis.has_empty_records);
    }

    #[test]
    fn test_zero_record_table_is_low_priority() {
        let table = MemoryTable::new("_DOCUMENT6");
        let analysis = TableStructureAnalyzer::default()
            .with_critical_tables(["_DOCUMENT6"])
            .analyze(&table);

        assert_eq!(analysis.record_count, 0);
        assert_eq!(analysis.priority, Priority::Low);
    }

    #[test]
    fn test_first_observed_kind_is_kept() {
        let table = MemoryTable::new("_DOCUMENT7")
            .with_row([("_FLD1", ScalarValue::Int(1))])
            .with_corrupt("bad page")
            .with_row([("_FLD1", ScalarValue::Text("x".into()))]);
        let analysis = TableStructureAnalyzer::new(10).analyze(&table);

        assert_eq!(
            analysis.field_types["_FLD1"],
            ledgerlift_domain::FieldKind::Int
        );
        assert_eq!(analysis.sample_records.len(), 2);
    }

    #[test]
    fn test_sample_is_bounded() {
        let mut table = MemoryTable::new("_DOCUMENT8");
        for i in 0..50 {
            table = table.with_row([("_FLD1", ScalarValue::Int(i))]);
        }
        let analysis = TableStructureAnalyzer::new(5).analyze(&table);
        assert_eq!(analysis.record_count, 50);
        assert_eq!(analysis.sample_records.len(), 5);
    }

    #[test]
    fn test_rank_orders_by_priority_then_size() {
        let mut big = MemoryTable::new("_DOCUMENT2");
        for i in 0..1_000 {
            big = big.with_row([("_FLD1", ScalarValue::Int(i))]);
        }
        let source = MemorySource::new(vec![
            MemoryTable::new("_REFERENCE1").with_row([("_FLD1", ScalarValue::Int(1))]),
            big,
            MemoryTable::new("_DOCUMENT9"),
            MemoryTable::new("_DOCUMENT3").with_row([("_FLD1", ScalarValue::Int(1))]),
        ]);
        let container = source.open().unwrap();

        let ranked = TableStructureAnalyzer::default()
            .with_critical_tables(["_DOCUMENT3"])
            .rank(container.as_ref());
        let names: Vec<&str> = ranked.iter().map(|a| a.table_name.as_str()).collect();
        assert_eq!(names, ["_DOCUMENT3", "_DOCUMENT2", "_REFERENCE1", "_DOCUMENT9"]);
    }

    #[test]
    fn test_table_parts_attach_line_items() {
        let parent_ref = ScalarValue::Binary(vec![0xaa, 0x01]);
        let other_ref = ScalarValue::Binary(vec![0xbb, 0x02]);

        let parts = MemoryTable::new("_DOCUMENT1_VT5")
            .with_row(vec![
                ("_DOCUMENT1_IDRREF", MemoryValue::from(parent_ref.clone())),
                ("_LINENO6", ScalarValue::Int(2).into()),
                ("_FLD7", text("Тюльпан")),
                ("_FLD8", ScalarValue::Decimal("5".into()).into()),
            ])
            .with_row(vec![
                ("_DOCUMENT1_IDRREF", MemoryValue::from(parent_ref.clone())),
                ("_LINENO6", ScalarValue::Int(1).into()),
                ("_FLD7", text("Роза")),
                ("_FLD8", ScalarValue::Decimal("3".into()).into()),
            ])
            .with_tombstone()
            .with_row(vec![
                ("_DOCUMENT1_IDRREF", MemoryValue::from(other_ref)),
                ("_FLD7", text("Ваза")),
            ]);
        let source = MemorySource::new(vec![MemoryTable::new("_DOCUMENT1"), parts]);
        let container = source.open().unwrap();

        let index = TablePartIndex::build(container.as_ref(), "_DOCUMENT1", 100);
        assert_eq!(index.tables(), ["_DOCUMENT1_VT5"]);

        let record = record(vec![
            ("_IDRREF", parent_ref.into()),
            ("_NUMBER", text("0007")),
        ]);
        let doc = analyzer().classify_with_parts(&record, "_DOCUMENT1", 0, &index);

        assert_eq!(doc.line_items.len(), 2);
        assert_eq!(doc.line_items[0].nomenclature.as_deref(), Some("Роза"));
        assert_eq!(doc.line_items[0].quantity, Some(3.0));
        assert_eq!(doc.line_items[1].line_number, Some(2));
    }

    #[test]
    fn test_line_items_stay_grouped_by_table_part() {
        let parent_ref = ScalarValue::Binary(vec![0xaa, 0x01]);
        let part = |name: &str, items: [(i64, &str); 2]| {
            items.iter().fold(MemoryTable::new(name), |table, (line, goods)| {
                table.with_row(vec![
                    ("_DOCUMENT1_IDRREF", MemoryValue::from(parent_ref.clone())),
                    ("_LINENO6", ScalarValue::Int(*line).into()),
                    ("_FLD7", text(goods)),
                ])
            })
        };
        let source = MemorySource::new(vec![
            MemoryTable::new("_DOCUMENT1"),
            part("_DOCUMENT1_VT12", [(1, "C1"), (2, "C2")]),
            part("_DOCUMENT1_VT2", [(2, "B2"), (1, "B1")]),
            part("_DOCUMENT1_VT1", [(1, "A1"), (2, "A2")]),
        ]);
        let container = source.open().unwrap();

        let index = TablePartIndex::build(container.as_ref(), "_DOCUMENT1", 100);
        assert_eq!(index.tables(), ["_DOCUMENT1_VT1", "_DOCUMENT1_VT2", "_DOCUMENT1_VT12"]);

        let goods: Vec<&str> = index
            .items_for(&parent_ref.to_string())
            .iter()
            .filter_map(|item| item.nomenclature.as_deref())
            .collect();
        assert_eq!(goods, ["A1", "A2", "B1", "B2", "C1", "C2"]);
    }

    #[test]
    fn test_table_part_scan_honors_stop() {
        let parent_ref = ScalarValue::Binary(vec![0xaa, 0x01]);
        let parts = (0..10).fold(MemoryTable::new("_DOCUMENT1_VT1"), |table, line| {
            table.with_row(vec![
                ("_DOCUMENT1_IDRREF", MemoryValue::from(parent_ref.clone())),
                ("_LINENO6", ScalarValue::Int(line).into()),
            ])
        });
        let source = MemorySource::new(vec![MemoryTable::new("_DOCUMENT1"), parts]);
        let container = source.open().unwrap();

        let polls = std::cell::Cell::new(0);
        let index = TablePartIndex::build_until(container.as_ref(), "_DOCUMENT1", 100, || {
            polls.set(polls.get() + 1);
            polls.get() > 3
        });
        assert_eq!(index.items_for(&parent_ref.to_string()).len(), 3);
    }

    #[test]
    fn test_field_values_are_enumerated_in_order() {
        let record = record(vec![("_FLD2", text("b")), ("_FLD1", text("a"))]);
        let names: Vec<&str> = record.field_names().collect();
        assert_eq!(names, ["_FLD2", "_FLD1"]);
        assert!(matches!(record.get("_FLD1"), Some(FieldValue::Scalar(_))));
    }
}

#[cfg(test)]
mod proptests {
    use crate::BlobContentExtractor;
    use ledgerlift_domain::ExtractionMethod;
    use ledgerlift_reader::{BlobAccess, MemoryBlob};
    use proptest::prelude::*;

    proptest! {
        /// Property: a handle that only exposes bytes always yields content
        #[test]
        fn test_any_bytes_only_handle_yields_content(
            bytes in proptest::collection::vec(any::<u8>(), 1..512),
        ) {
            let blob = MemoryBlob::bytes(bytes).with_access(BlobAccess::bytes_only());
            let result = BlobContentExtractor::default().extract(&blob, None);

            prop_assert!(result.is_success());
            prop_assert!(result.content.as_deref().is_some_and(|c| !c.is_empty()));
            prop_assert_eq!(result.strategy(), Some(ExtractionMethod::RawBytes));
            prop_assert!((0.0..=1.0).contains(&result.quality_score));
        }
    }
}
