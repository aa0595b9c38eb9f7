//! Search command implementation.

use crate::cli::SearchArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{Formatter, SearchHit};
use ledgerlift_domain::{Container, ContainerSource, Table};
use ledgerlift_extractor::{KeywordClassifier, KeywordSet};
use ledgerlift_orchestrator::InterruptFlag;
use ledgerlift_reader::FixtureSource;
use tracing::{debug, warn};

/// Limits of one keyword search.
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    /// Records scanned per table
    pub max_records: usize,
    /// Hits collected before the search stops
    pub max_hits: usize,
}

/// Execute the search command.
pub fn execute_search(
    args: SearchArgs,
    config: &Config,
    interrupt: &InterruptFlag,
    formatter: &Formatter,
) -> Result<()> {
    if args.limit == 0 || args.max_records == 0 {
        return Err(CliError::InvalidInput(
            "limit and max-records must be greater than zero".to_string(),
        ));
    }

    let set = if args.keywords.is_empty() {
        config.orchestrator.keyword_set().ok_or_else(|| {
            CliError::InvalidInput("no keywords given and none configured".to_string())
        })?
    } else {
        KeywordSet::custom("command line", &args.keywords)
    };

    let source = FixtureSource::new(args.container).with_config(config.reader.clone());
    let container = source.open()?;

    let tables: Vec<String> = if args.tables.is_empty() {
        container
            .table_names()
            .into_iter()
            .filter(|name| config.orchestrator.is_discoverable(name))
            .collect()
    } else {
        args.tables
    };

    let classifier = KeywordClassifier::new(config.extractor.clone());
    let limits = SearchLimits {
        max_records: args.max_records,
        max_hits: args.limit,
    };
    let hits = search(container.as_ref(), &tables, &classifier, &set, limits, interrupt);
    drop(container);

    println!("{}", formatter.format_hits(&hits)?);
    if !formatter.is_json() && hits.len() == limits.max_hits {
        println!(
            "{}",
            formatter.info(&format!("Stopped after {} matches", limits.max_hits))
        );
    }
    Ok(())
}

/// Scan the given tables in order and collect keyword hits.
///
/// Unknown tables and unreadable records are skipped with a warning.
pub fn search(
    container: &dyn Container,
    tables: &[String],
    classifier: &KeywordClassifier,
    set: &KeywordSet,
    limits: SearchLimits,
    interrupt: &InterruptFlag,
) -> Vec<SearchHit> {
    let mut hits = Vec::new();

    for name in tables {
        let Some(table) = container.table(name) else {
            warn!(table = %name, "Table not found");
            continue;
        };

        for index in 0..table.len().min(limits.max_records) {
            if interrupt.is_interrupted() || hits.len() >= limits.max_hits {
                return hits;
            }
            let record = match table.record(index) {
                Ok(record) if record.is_empty() => continue,
                Ok(record) => record,
                Err(e) => {
                    warn!(table = %name, index, error = %e, "Skipping unreadable record");
                    continue;
                }
            };

            let result = classifier.search(&record, set);
            for hit in result.matches {
                if hits.len() >= limits.max_hits {
                    break;
                }
                hits.push(SearchHit {
                    table: name.clone(),
                    row: index,
                    field: hit.field,
                    keyword: hit.keyword,
                    kind: hit.kind,
                    excerpt: hit.excerpt,
                });
            }
        }
        debug!(table = %name, hits = hits.len(), "Table searched");
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlift_domain::{MatchKind, ScalarValue};
    use ledgerlift_extractor::ExtractorConfig;
    use ledgerlift_reader::{MemoryBlob, MemorySource, MemoryTable, MemoryValue};

    fn container() -> Box<dyn Container> {
        let source = MemorySource::new(vec![
            MemoryTable::new("_Document1")
                .with_row([(
                    "_FLD1",
                    MemoryValue::from(ScalarValue::Text("Букет красные розы".into())),
                )])
                .with_corrupt("bad page")
                .with_row([("_FLD2", MemoryValue::from(MemoryBlob::text("салон Роза ветров")))]),
            MemoryTable::new("_Reference2")
                .with_row([("_FLD1", ScalarValue::Text("роза".into()))]),
        ]);
        source.open().unwrap()
    }

    fn limits(max_hits: usize) -> SearchLimits {
        SearchLimits {
            max_records: 100,
            max_hits,
        }
    }

    #[test]
    fn test_search_scalars_and_blobs() {
        let container = container();
        let classifier = KeywordClassifier::new(ExtractorConfig::default());
        let set = KeywordSet::custom("test", ["роз"]);
        let tables = vec!["_Document1".to_string(), "_Missing".to_string()];

        let hits = search(
            container.as_ref(),
            &tables,
            &classifier,
            &set,
            limits(10),
            &InterruptFlag::new(),
        );

        assert_eq!(hits.len(), 2);
        assert_eq!((hits[0].row, hits[0].kind), (0, MatchKind::Regular));
        assert_eq!((hits[1].row, hits[1].kind), (2, MatchKind::Blob));
        assert_eq!(hits[1].field, "_FLD2");
    }

    #[test]
    fn test_search_stops_at_limit() {
        let container = container();
        let classifier = KeywordClassifier::new(ExtractorConfig::default());
        let set = KeywordSet::custom("test", ["роз"]);
        let tables = vec!["_Document1".to_string(), "_Reference2".to_string()];

        let hits = search(
            container.as_ref(),
            &tables,
            &classifier,
            &set,
            limits(1),
            &InterruptFlag::new(),
        );
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_search_honours_interrupt() {
        let container = container();
        let classifier = KeywordClassifier::new(ExtractorConfig::default());
        let set = KeywordSet::custom("test", ["роз"]);
        let interrupt = InterruptFlag::new();
        interrupt.interrupt();

        let hits = search(
            container.as_ref(),
            &["_Document1".to_string()],
            &classifier,
            &set,
            limits(10),
            &interrupt,
        );
        assert!(hits.is_empty());
    }
}
