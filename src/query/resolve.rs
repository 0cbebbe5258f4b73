use crate::error::ServiceError;
use crate::services::TextGenerator;

pub fn chart_type_prompt(query: &str) -> String {
    format!("Determine the most appropriate chart type for the following query: {query}")
}

/// Ask the model to name a chart type. The answer is only trimmed and
/// lowercased; whether it is a known type is decided by the caller.
pub fn resolve_chart_type(
    generator: &dyn TextGenerator,
    query: &str,
) -> Result<String, ServiceError> {
    let answer = generator.generate(&chart_type_prompt(query))?;
    let label = answer.trim().to_lowercase();
    log::info!("Model chose chart type '{label}'");
    Ok(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fakes::{FailingText, ScriptedText};

    #[test]
    fn prompt_embeds_query_and_answer_is_normalized() {
        let model = ScriptedText::new("  Scatter \n");
        let label = resolve_chart_type(&model, "how does price relate to units?").unwrap();
        assert_eq!(label, "scatter");
        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("how does price relate to units?"));
    }

    #[test]
    fn free_form_answers_pass_through() {
        let model = ScriptedText::new("A Stacked Area Chart");
        assert_eq!(resolve_chart_type(&model, "q").unwrap(), "a stacked area chart");
    }

    #[test]
    fn service_faults_propagate() {
        assert!(resolve_chart_type(&FailingText, "q").is_err());
    }
}
