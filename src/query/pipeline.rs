//! The two user-triggered sequences: handling an upload and answering a query.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::extract::extract_intent;
use super::resolve::resolve_chart_type;
use super::summary::generate_summary;
use super::{ChartSpec, ChartType, QueryError};
use crate::chart::{dispatch, Figure};
use crate::data::loader::{load_bytes, FileFormat};
use crate::data::model::Dataset;
use crate::data::stats::{describe, ColumnStats};
use crate::services::Services;

/// Everything the UI shows after a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub file_name: String,
    pub dataset: Arc<Dataset>,
    pub statistics: Vec<ColumnStats>,
    pub summary: String,
}

/// Everything the UI shows after a query was submitted.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub attributes: Vec<String>,
    /// Label picked by the model when the query named no chart type.
    pub determined_chart_type: Option<String>,
    pub figure: Result<Figure, QueryError>,
}

/// Store the file, read it back, parse it, describe it and summarise it.
///
/// The format is checked first so an unsupported file never reaches a service.
pub fn process_upload(services: &Services, file_name: &str, bytes: &[u8]) -> Result<UploadOutcome> {
    let format = FileFormat::from_file_name(file_name)?;

    services
        .storage
        .put(file_name, bytes)
        .with_context(|| format!("storing {file_name}"))?;
    let stored = services
        .storage
        .get(file_name)
        .with_context(|| format!("reading back {file_name}"))?;

    let dataset = load_bytes(format, &stored)?;
    log::info!(
        "Loaded {file_name}: {} rows, columns {:?}",
        dataset.n_rows(),
        dataset.column_names()
    );

    let statistics = describe(&dataset);
    let summary =
        generate_summary(services.text.as_ref(), &dataset).context("generating data summary")?;

    Ok(UploadOutcome {
        file_name: file_name.to_string(),
        dataset: Arc::new(dataset),
        statistics,
        summary,
    })
}

/// Extract attributes and chart type from the query and build the figure.
///
/// Service faults abort with `Err`; problems with the query itself are
/// reported inside [`QueryOutcome::figure`].
pub fn interpret_query(services: &Services, dataset: &Dataset, query: &str) -> Result<QueryOutcome> {
    let intent =
        extract_intent(services.entities.as_ref(), query).context("detecting entities")?;

    if intent.attributes.len() < 2 {
        log::info!("Query yielded {} attribute(s)", intent.attributes.len());
        return Ok(QueryOutcome {
            attributes: intent.attributes,
            determined_chart_type: None,
            figure: Err(QueryError::NotEnoughAttributes),
        });
    }

    let (label, determined_chart_type) = match intent.chart_type {
        Some(label) => (label, None),
        None => {
            let label = resolve_chart_type(services.text.as_ref(), query)
                .context("determining chart type")?;
            (label.clone(), Some(label))
        }
    };

    let figure = match ChartType::from_label(&label) {
        Some(chart_type) => ChartSpec::from_attributes(chart_type, &intent.attributes)
            .and_then(|spec| dispatch(&spec, dataset).map_err(QueryError::from)),
        None => Err(QueryError::UnsupportedChartType(label)),
    };
    if let Err(e) = &figure {
        log::warn!("No chart for query: {e}");
    }

    Ok(QueryOutcome {
        attributes: intent.attributes,
        determined_chart_type,
        figure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::chart::{ChartError, FigureKind};
    use crate::data::model::{Column, Value};
    use crate::error::LoadError;
    use crate::services::fakes::{FailingText, FixedEntities, MemoryStore, ScriptedText};
    use crate::services::Entity;

    fn services(entities: Vec<Entity>, text: Arc<ScriptedText>) -> (Services, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let services = Services {
            storage: store.clone(),
            entities: Arc::new(FixedEntities(entities)),
            text,
        };
        (services, store)
    }

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            Column::new("Revenue", vec![Value::Integer(10), Value::Integer(20)]),
            Column::new("2023", vec![Value::Float(1.5), Value::Float(2.5)]),
        ])
        .unwrap()
    }

    fn quantities(names: &[&str]) -> Vec<Entity> {
        names.iter().map(|n| Entity::new("QUANTITY", n)).collect()
    }

    #[test]
    fn fewer_than_two_attributes_stops_before_any_chart_work() {
        for entities in [vec![], quantities(&["revenue"])] {
            let model = Arc::new(ScriptedText::new("bar"));
            let (services, _) = services(entities, model.clone());
            let outcome = interpret_query(&services, &dataset(), "show me revenue").unwrap();
            let err = outcome.figure.unwrap_err();
            assert_eq!(err.to_string(), "Not enough attributes found for the query.");
            assert_eq!(model.calls(), 0);
            assert_eq!(outcome.determined_chart_type, None);
        }
    }

    #[test]
    fn explicit_bar_routes_to_bar_branch() {
        let mut entities = vec![Entity::new("OTHER", "bar")];
        entities.extend(quantities(&["revenue", "2023"]));
        let model = Arc::new(ScriptedText::new("line"));
        let (services, _) = services(entities, model.clone());

        let outcome = interpret_query(&services, &dataset(), "bar of revenue vs 2023").unwrap();
        assert_eq!(outcome.attributes, vec!["revenue", "2023"]);
        assert_eq!(model.calls(), 0);
        let figure = outcome.figure.unwrap();
        assert_eq!(figure.chart_type, ChartType::Bar);
        assert_eq!(figure.x_label, "revenue");
        assert_eq!(figure.y_label, "2023");
        assert!(matches!(figure.kind, FigureKind::Bars { .. }));
    }

    #[test]
    fn missing_chart_type_asks_the_model() {
        let model = Arc::new(ScriptedText::new("  Scatter\n"));
        let (services, _) = services(quantities(&["revenue", "2023"]), model.clone());

        let query = "how does revenue track 2023?";
        let outcome = interpret_query(&services, &dataset(), query).unwrap();
        assert_eq!(outcome.determined_chart_type.as_deref(), Some("scatter"));
        assert!(model.prompts.lock().unwrap()[0].contains(query));
        assert_eq!(outcome.figure.unwrap().chart_type, ChartType::Scatter);
    }

    #[test]
    fn unknown_model_answer_is_reported() {
        let model = Arc::new(ScriptedText::new("Area chart"));
        let (services, _) = services(quantities(&["revenue", "2023"]), model);
        let outcome = interpret_query(&services, &dataset(), "q").unwrap();
        assert_eq!(
            outcome.figure.unwrap_err(),
            QueryError::UnsupportedChartType("area chart".to_string())
        );
    }

    #[test]
    fn map_request_is_an_error_not_a_silent_no_op() {
        let mut entities = vec![Entity::new("OTHER", "map")];
        entities.extend(quantities(&["revenue", "2023"]));
        let (services, _) = services(entities, Arc::new(ScriptedText::new("")));
        let outcome = interpret_query(&services, &dataset(), "map it").unwrap();
        assert_eq!(
            outcome.figure.unwrap_err(),
            QueryError::Chart(ChartError::Unsupported(ChartType::Map))
        );
    }

    #[test]
    fn resolver_fault_aborts_the_query() {
        let services = Services {
            storage: Arc::new(MemoryStore::default()),
            entities: Arc::new(FixedEntities(quantities(&["revenue", "2023"]))),
            text: Arc::new(FailingText),
        };
        assert!(interpret_query(&services, &dataset(), "q").is_err());
    }

    #[test]
    fn upload_stores_loads_and_summarises() {
        let model = Arc::new(ScriptedText::new("Quarterly revenue by region."));
        let (services, store) = services(vec![], model.clone());

        let outcome =
            process_upload(&services, "Sales.csv", b"Region,Revenue\nnorth,10\nsouth,20\n").unwrap();
        assert_eq!(store.puts.lock().unwrap().as_slice(), ["Sales.csv"]);
        assert_eq!(outcome.dataset.column_names(), vec!["region", "revenue"]);
        assert_eq!(outcome.statistics.len(), 2);
        assert_eq!(outcome.summary, "Quarterly revenue by region.");
        assert!(model.prompts.lock().unwrap()[0].contains("\"revenue\""));
    }

    #[test]
    fn unsupported_upload_fails_before_any_service_call() {
        let model = Arc::new(ScriptedText::new("unused"));
        let (services, store) = services(vec![], model.clone());

        let err = process_upload(&services, "notes.txt", b"hello").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::UnsupportedType(_))
        ));
        assert!(store.puts.lock().unwrap().is_empty());
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn json_upload_goes_through_json_parser() {
        let (services, _) = services(vec![], Arc::new(ScriptedText::new("ok")));
        let outcome =
            process_upload(&services, "data.json", br#"[{"Revenue": 1}, {"Revenue": 2}]"#).unwrap();
        assert_eq!(outcome.dataset.n_rows(), 2);
        assert_eq!(outcome.dataset.column_names(), vec!["revenue"]);

        let err = process_upload(&services, "data.json", b"a,b\n1,2\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoadError>(),
            Some(LoadError::Parse { format: FileFormat::Json, .. })
        ));
    }
}
