use super::{ChartType, ExtractedIntent};
use crate::error::ServiceError;
use crate::services::{Entity, EntityDetector};

/// Ask the entity service about `query` and derive the intent from its spans.
pub fn extract_intent(
    detector: &dyn EntityDetector,
    query: &str,
) -> Result<ExtractedIntent, ServiceError> {
    let entities = detector.detect_entities(query)?;
    let intent = intent_from_entities(&entities);
    log::info!(
        "Extracted chart type {:?} and attributes {:?}",
        intent.chart_type,
        intent.attributes
    );
    Ok(intent)
}

/// Quantity spans become attributes in order; an "other" span naming a
/// chart type sets the chart type, the last such span winning.
pub fn intent_from_entities(entities: &[Entity]) -> ExtractedIntent {
    let mut intent = ExtractedIntent::default();
    for entity in entities {
        log::debug!(
            "Entity {} '{}' (score {:?})",
            entity.kind,
            entity.text,
            entity.score
        );
        let text = entity.normalized();
        if entity.is_quantity() {
            intent.attributes.push(text);
        } else if entity.is_other() && ChartType::from_label(&text).is_some() {
            intent.chart_type = Some(text);
        }
    }
    intent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fakes::FixedEntities;

    #[test]
    fn bar_revenue_2023() {
        let detector = FixedEntities(vec![
            Entity::new("OTHER", "bar"),
            Entity::new("QUANTITY", "revenue"),
            Entity::new("QUANTITY", "2023"),
        ]);
        let intent = extract_intent(&detector, "bar chart of revenue in 2023").unwrap();
        assert_eq!(intent.chart_type.as_deref(), Some("bar"));
        assert_eq!(intent.attributes, vec!["revenue", "2023"]);
    }

    #[test]
    fn attribute_text_is_lowercased() {
        let intent = intent_from_entities(&[Entity::new("QUANTITY", "Revenue")]);
        assert_eq!(intent.attributes, vec!["revenue"]);
    }

    #[test]
    fn last_chart_type_wins() {
        let intent = intent_from_entities(&[
            Entity::new("OTHER", "Line"),
            Entity::new("OTHER", "pie"),
        ]);
        assert_eq!(intent.chart_type.as_deref(), Some("pie"));
    }

    #[test]
    fn unrelated_entities_are_ignored() {
        let intent = intent_from_entities(&[
            Entity::new("OTHER", "dashboard"),
            Entity::new("LOCATION", "bar"),
            Entity::new("DATE", "2023"),
        ]);
        assert_eq!(intent, ExtractedIntent::default());
    }
}
