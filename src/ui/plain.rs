//! Text output for `--ask` and `--batch`

use crate::drug::Outcome;

use super::card::bundle_cards;

pub fn outcome_to_plain(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Error(message) => format!("⚠️ {}", message),
        Outcome::Answer(answer) => format!("🧠 Answer: {}", answer),
        Outcome::Bundle(bundle) => bundle_cards(bundle)
            .iter()
            .map(|card| card.to_plain())
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drug::AskResponse;

    #[test]
    fn test_error_has_no_cards() {
        let text = outcome_to_plain(&Outcome::Error("No question provided".to_string()));
        assert_eq!(text, "⚠️ No question provided");
        assert!(!text.contains("──"));
    }

    #[test]
    fn test_cards_are_separated() {
        let response: AskResponse = serde_json::from_str(
            r#"{"brand": {"name": "Robitussin", "price": 8},
                "alternatives": [{"name": "Delsym"}, {"name": "Vicks"}]}"#,
        )
        .unwrap();

        let text = outcome_to_plain(&response.into_outcome());
        let blocks: Vec<&str> = text.split("\n\n").collect();

        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].starts_with("── Brand ──\nRobitussin\nPrice: $8.00"));
        assert!(blocks[1].starts_with("── Alternative 1 ──\nDelsym"));
        assert!(blocks[2].starts_with("── Alternative 2 ──\nVicks"));
    }
}
