use crate::models::{Extraction, NormalizedItem, TaggedFact};

/// Sentence-initial words that read naturally in lower case after "According to X, "
const LOWERABLE_WORDS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "its", "it", "their", "there", "some",
    "many", "most", "several", "more", "after", "before", "according", "in", "on", "at", "for",
    "with", "one", "two", "three", "four", "five",
];

pub fn attribution_prefix(source_name: &str) -> String {
    format!("According to {}, ", source_name)
}

/// Attach the attribution to an accepted fact. Rejected verdicts produce nothing.
pub fn tag(item: &NormalizedItem, extraction: &Extraction) -> Option<TaggedFact> {
    let Extraction::Accepted { fact_text } = extraction else {
        return None;
    };

    let display_text = format!(
        "{}{}",
        attribution_prefix(&item.source_name),
        ensure_terminal(&lower_initial(fact_text.trim()))
    );

    Some(TaggedFact {
        source_name: item.source_name.clone(),
        title: item.title.clone(),
        link: item.link.clone(),
        fact_text: fact_text.clone(),
        display_text,
    })
}

fn lower_initial(fact: &str) -> String {
    let first_word: String = fact.chars().take_while(|c| c.is_alphabetic()).collect();

    // Keep acronyms ("MBTA"), initials ("A.J.") and proper nouns as written
    let is_acronym = first_word.chars().count() > 1 && first_word.chars().all(char::is_uppercase);
    let is_initial = fact[first_word.len()..].starts_with('.');
    let is_lowerable = LOWERABLE_WORDS.contains(&first_word.to_lowercase().as_str());
    if is_acronym || is_initial || !is_lowerable {
        return fact.to_string();
    }

    let mut chars = fact.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn ensure_terminal(text: &str) -> String {
    let body = text.trim_end_matches(['"', '\'', '\u{201d}', '\u{2019}', ')']);
    if body.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{}.", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;

    fn item(source: &str) -> NormalizedItem {
        NormalizedItem {
            source_name: source.to_string(),
            title: "Headline".to_string(),
            link: "https://example.com/story".parse().unwrap(),
            excerpt_text: String::new(),
        }
    }

    fn accepted(text: &str) -> Extraction {
        Extraction::Accepted {
            fact_text: text.to_string(),
        }
    }

    #[test]
    fn test_tags_with_lowercased_article() {
        let fact = tag(
            &item("WBUR"),
            &accepted("The MBTA announced a fare increase effective July 1."),
        )
        .unwrap();
        assert_eq!(
            fact.display_text,
            "According to WBUR, the MBTA announced a fare increase effective July 1."
        );
        assert_eq!(fact.fact_text, "The MBTA announced a fare increase effective July 1.");
        assert_eq!(fact.source_name, "WBUR");
    }

    #[test]
    fn test_keeps_proper_noun_capitalized() {
        let fact = tag(&item("The Boston Globe"), &accepted("Boston officials closed the pier."))
            .unwrap();
        assert_eq!(
            fact.display_text,
            "According to The Boston Globe, Boston officials closed the pier."
        );
    }

    #[test]
    fn test_keeps_acronym() {
        let fact = tag(&item("WCVB"), &accepted("MBTA crews finished the track work.")).unwrap();
        assert_eq!(
            fact.display_text,
            "According to WCVB, MBTA crews finished the track work."
        );
    }

    #[test]
    fn test_single_letter_article_is_lowered() {
        let fact = tag(&item("WBUR"), &accepted("A water main broke in Back Bay.")).unwrap();
        assert_eq!(
            fact.display_text,
            "According to WBUR, a water main broke in Back Bay."
        );
    }

    #[test]
    fn test_keeps_leading_initials() {
        let fact = tag(
            &item("WBUR"),
            &accepted("A.J. Brown signed a new contract with the Patriots on Monday."),
        )
        .unwrap();
        assert_eq!(
            fact.display_text,
            "According to WBUR, A.J. Brown signed a new contract with the Patriots on Monday."
        );
    }

    #[test]
    fn test_adds_missing_period() {
        let fact = tag(&item("WBUR"), &accepted("The schools will close early on Friday")).unwrap();
        assert_eq!(
            fact.display_text,
            "According to WBUR, the schools will close early on Friday."
        );
    }

    #[test]
    fn test_keeps_period_inside_closing_quote() {
        let fact = tag(&item("WBUR"), &accepted("Healey said \"we are ready.\"")).unwrap();
        assert_eq!(
            fact.display_text,
            "According to WBUR, Healey said \"we are ready.\""
        );
    }

    #[test]
    fn test_rejected_produces_nothing() {
        let verdict = Extraction::Rejected {
            reason: ExtractionError::NoCleanFact,
        };
        assert!(tag(&item("WBUR"), &verdict).is_none());
    }

    #[test]
    fn test_display_text_always_attributes() {
        for source in ["WBUR", "Universal Hub", "NBC Boston"] {
            let fact = tag(&item(source), &accepted("Crews restored power overnight.")).unwrap();
            assert!(fact.display_text.starts_with("According to "));
            assert!(fact.display_text.contains(source));
        }
    }
}
