use anyhow::{Context, Result};

use crate::data::model::Dataset;
use crate::services::TextGenerator;

const SUMMARY_PREAMBLE: &str = "Based on the following dataset, provide a detailed summary about \
what this data is about, explaining the overall nature and key insights of the data. Here is the \
dataset:\n\n";

/// The whole dataset, pretty-printed column by column, after a fixed preamble.
pub fn summary_prompt(dataset: &Dataset) -> serde_json::Result<String> {
    let body = serde_json::to_string_pretty(&dataset.to_column_dict())?;
    Ok(format!("{SUMMARY_PREAMBLE}{body}"))
}

pub fn generate_summary(generator: &dyn TextGenerator, dataset: &Dataset) -> Result<String> {
    let prompt = summary_prompt(dataset).context("serializing dataset for the summary prompt")?;
    log::info!(
        "Requesting summary for {} rows x {} columns ({} prompt bytes)",
        dataset.n_rows(),
        dataset.n_columns(),
        prompt.len()
    );
    Ok(generator.generate(&prompt)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, Value};
    use crate::error::ServiceError;
    use crate::services::fakes::{FailingText, ScriptedText};

    #[test]
    fn prompt_contains_every_cell_with_two_space_indent() {
        let ds = Dataset::from_columns(vec![
            Column::new("Region", vec![Value::String("north".into())]),
            Column::new("revenue", vec![Value::Integer(12)]),
        ])
        .unwrap();
        let prompt = summary_prompt(&ds).unwrap();
        assert!(prompt.starts_with("Based on the following dataset"));
        assert!(prompt.contains("Here is the dataset:\n\n{"));
        assert!(prompt.contains("\n  \"region\": {\n    \"0\": \"north\"\n  }"));
        assert!(prompt.contains("\"0\": 12"));
    }

    #[test]
    fn summary_is_model_output() {
        let ds = Dataset::from_columns(vec![Column::new("a", vec![Value::Integer(1)])]).unwrap();
        let model = ScriptedText::new("One column of integers.");
        assert_eq!(generate_summary(&model, &ds).unwrap(), "One column of integers.");
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn model_failure_is_returned_not_replaced() {
        let ds = Dataset::from_columns(vec![Column::new("a", vec![Value::Float(f64::NAN)])]).unwrap();
        let prompt = summary_prompt(&ds).unwrap();
        assert!(prompt.contains("\"0\": null"));

        let err = generate_summary(&FailingText, &ds).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::Status { status: 429, .. })
        ));
    }
}
