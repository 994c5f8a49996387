//! Fact extraction.
//!
//! Decides whether an excerpt holds a clean, self-contained factual sentence.
//! The classifier is deterministic: the same excerpt always gets the same verdict,
//! and an accepted fact is always a verbatim slice of the excerpt.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::ExtractionError;
use crate::models::{Extraction, NormalizedItem};
use crate::normalizer::MIN_EXCERPT_CHARS;

pub const MIN_FACT_WORDS: usize = 6;
pub const MAX_FACT_WORDS: usize = 60;

/// Lowercased words ending in a period that do not end a sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "st", "jr", "sr", "vs", "gov", "sen", "rep", "gen", "lt", "col",
    "sgt", "capt", "prof", "rev", "inc", "co", "corp", "ltd", "jan", "feb", "aug", "sept",
    "oct", "nov", "dec", "ave", "a.m", "p.m", "e.g", "i.e", "etc",
];

/// "No." abbreviates "number" only in front of one
const NUMBER_ABBREVIATIONS: &[&str] = &["no", "nos"];

/// Place abbreviations that end a sentence unless a known continuation follows
const PLACE_ABBREVIATIONS: &[&str] = &["u.s", "u.k", "u.n", "mass", "calif", "conn"];

const PLACE_CONTINUATIONS: &[&str] = &[
    "Capitol", "Coast", "Congress", "Senate", "House", "Supreme", "Court", "District",
    "Attorney", "Department", "Army", "Navy", "Air", "Marine", "Marines", "Postal", "Census",
    "Treasury", "Embassy", "Open", "Rep", "Sen", "Route", "Highway", "Border", "Customs",
    "Government", "President", "Secretary", "Security", "General", "Ambassador", "Forces",
    "Military", "Mission", "Troops", "Citizenship", "Immigration", "State", "Bank",
];

/// Words that put a following noun inside a noun phrase
const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "its", "his", "her", "their", "our",
    "your", "my", "some", "many", "several", "all", "both", "each", "every", "no", "two",
    "three", "four", "five",
];

const PREPOSITIONS: &[&str] = &[
    "of", "from", "in", "on", "at", "for", "with", "about", "by", "to", "into", "over",
    "under", "after", "before", "during", "between", "among", "across", "against", "near",
    "around", "through", "without",
];

/// Words a noun phrase can stretch back over before its determiner or preposition
const NOUN_PHRASE_LOOKBACK: usize = 5;

/// Auxiliary and reporting verbs that mark a predicate
const PREDICATE_WORDS: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "being", "has", "have", "had", "will", "would",
    "can", "could", "may", "might", "must", "shall", "should", "do", "does", "did", "said",
    "says", "told", "won", "lost", "made", "took", "gave", "got", "found", "left", "began",
    "fell", "rose", "hit", "cut", "set", "put", "met", "led", "ran", "sold", "paid", "held",
    "chose", "saw", "came", "went", "became", "brought", "built", "spent", "sent", "struck",
];

/// Phrases that mark promotional or navigational text rather than news
const TEASER_PHRASES: &[&str] = &[
    "read more",
    "continue reading",
    "click here",
    "full story",
    "appeared first on",
    "subscribe to",
    "sign up for",
    "listen to the",
    "watch the video",
    "view gallery",
];

const OPENING_QUOTES: &[char] = &['"', '\'', '\u{201c}', '\u{2018}', '('];
const CLOSING_MARKS: &[char] = &['"', '\'', '\u{201d}', '\u{2019}', ')', ']'];

static RESIDUAL_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][A-Za-z0-9]*(\s[^<>]*)?/?>").unwrap());

/// "F", "A.J", "D.C": capital letters joined by periods, before the final period
static INITIALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\p{Lu}\.)*\p{Lu}$").unwrap());

/// Classify a normalized item.
pub fn extract(item: &NormalizedItem) -> Extraction {
    match classify(item) {
        Ok(fact_text) => Extraction::Accepted {
            fact_text: fact_text.to_string(),
        },
        Err(reason) => Extraction::Rejected { reason },
    }
}

fn classify(item: &NormalizedItem) -> Result<&str, ExtractionError> {
    let excerpt = item.excerpt_text.trim();

    if excerpt.chars().count() < MIN_EXCERPT_CHARS {
        return Err(ExtractionError::EmptyContent);
    }
    if item.source_name.trim().is_empty() || is_malformed(excerpt) {
        return Err(ExtractionError::Unparseable);
    }

    split_sentences(excerpt)
        .into_iter()
        .find(|sentence| is_clean_fact(sentence, &item.title))
        .ok_or(ExtractionError::NoCleanFact)
}

/// Leftover tags, control characters or decoding damage
fn is_malformed(text: &str) -> bool {
    RESIDUAL_MARKUP.is_match(text)
        || text
            .chars()
            .any(|c| c == '\u{fffd}' || (c.is_control() && !c.is_whitespace()))
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\u{2026}')
}

/// Split text into sentences, returned as trimmed slices of the input.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (terminal_at, c) = chars[i];
        if !is_terminal(c) {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && (is_terminal(chars[j].1) || CLOSING_MARKS.contains(&chars[j].1)) {
            j += 1;
        }
        let end = chars.get(j).map_or(text.len(), |&(idx, _)| idx);

        let is_boundary = j == chars.len()
            || (chars[j].1.is_whitespace()
                && starts_sentence(&text[end..])
                && !(c == '.'
                    && j == i + 1
                    && is_abbreviation(&text[start..terminal_at], &text[end..])));

        if is_boundary {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
        i = j;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

fn starts_sentence(rest: &str) -> bool {
    rest.trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit() || OPENING_QUOTES.contains(&c))
}

/// Whether the period after `before_period` belongs to an abbreviation,
/// judged by the token it closes and the word that follows.
fn is_abbreviation(before_period: &str, after: &str) -> bool {
    let Some(token) = before_period.split_whitespace().last() else {
        return false;
    };
    let token = token.trim_start_matches(|c: char| OPENING_QUOTES.contains(&c));
    let lower = token.to_lowercase();
    let next_word = after
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| !c.is_alphanumeric());

    if NUMBER_ABBREVIATIONS.contains(&lower.as_str()) {
        return next_word.starts_with(|c: char| c.is_ascii_digit());
    }
    if PLACE_ABBREVIATIONS.contains(&lower.as_str()) {
        return PLACE_CONTINUATIONS.contains(&next_word);
    }

    INITIALS.is_match(token) || ABBREVIATIONS.contains(&lower.as_str())
}

fn is_clean_fact(sentence: &str, title: &str) -> bool {
    let words: Vec<&str> = sentence.split_whitespace().collect();

    ends_as_statement(sentence)
        && starts_sentence(sentence)
        && (MIN_FACT_WORDS..=MAX_FACT_WORDS).contains(&words.len())
        && has_predicate(&words)
        && !is_teaser(sentence)
        && !repeats_headline(sentence, title)
}

/// Periods and exclamations only; questions and trailing ellipses are teasers
fn ends_as_statement(sentence: &str) -> bool {
    let body = sentence.trim_end_matches(|c: char| CLOSING_MARKS.contains(&c));
    if body.ends_with("..") || body.ends_with('\u{2026}') {
        return false;
    }
    body.ends_with('.') || body.ends_with('!')
}

fn has_predicate(words: &[&str]) -> bool {
    let bare: Vec<String> = words
        .iter()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .collect();

    (1..bare.len()).any(|idx| {
        let word = bare[idx].as_str();
        if word.chars().count() < 2 {
            return false;
        }
        let lower = word.to_lowercase();
        if PREDICATE_WORDS.contains(&lower.as_str()) {
            return true;
        }
        if word != lower || !word.chars().all(char::is_alphabetic) || word.len() < 4 {
            return false;
        }
        if word.ends_with("ed") {
            return true;
        }
        word.ends_with('s')
            && !word.ends_with("ss")
            && !word.ends_with("us")
            && !word.ends_with("is")
            && !inside_noun_phrase(words, &bare, idx)
    })
}

/// A plural noun rather than a verb: the word directly follows a determiner, or
/// ends a noun phrase that opens with a preposition.
fn inside_noun_phrase(words: &[&str], bare: &[String], idx: usize) -> bool {
    let is_determiner = |k: usize| DETERMINERS.contains(&bare[k].to_lowercase().as_str());
    let is_preposition = |k: usize| PREPOSITIONS.contains(&bare[k].to_lowercase().as_str());

    if is_determiner(idx - 1) {
        return true;
    }

    for k in (idx.saturating_sub(NOUN_PHRASE_LOOKBACK)..idx).rev() {
        if words[k].ends_with([',', ';', ':'])
            || PREDICATE_WORDS.contains(&bare[k].to_lowercase().as_str())
        {
            return false;
        }
        if is_preposition(k) {
            return true;
        }
        if is_determiner(k) {
            return k > 0 && is_preposition(k - 1);
        }
    }
    false
}

fn is_teaser(sentence: &str) -> bool {
    let lower = sentence.to_lowercase();
    TEASER_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

fn repeats_headline(sentence: &str, title: &str) -> bool {
    let strip = |s: &str| {
        s.trim()
            .trim_end_matches(|c: char| is_terminal(c) || CLOSING_MARKS.contains(&c))
            .to_lowercase()
    };
    !title.trim().is_empty() && strip(sentence) == strip(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(excerpt: &str) -> NormalizedItem {
        NormalizedItem {
            source_name: "WBUR".to_string(),
            title: "MBTA fares going up".to_string(),
            link: "https://www.wbur.org/news/mbta-fares".parse().unwrap(),
            excerpt_text: excerpt.to_string(),
        }
    }

    fn accepted(text: &str) -> Extraction {
        Extraction::Accepted {
            fact_text: text.to_string(),
        }
    }

    fn rejected(reason: ExtractionError) -> Extraction {
        Extraction::Rejected { reason }
    }

    // ==================== Verdict Tests ====================

    #[test]
    fn test_accepts_simple_fact() {
        let text = "The MBTA announced a fare increase effective July 1.";
        assert_eq!(extract(&item(text)), accepted(text));
    }

    #[test]
    fn test_takes_first_clean_sentence() {
        let result = extract(&item(
            "The council voted 9-4 to approve the budget. The mayor is expected to sign it Friday.",
        ));
        assert_eq!(result, accepted("The council voted 9-4 to approve the budget."));
    }

    #[test]
    fn test_skips_unclean_leading_sentence() {
        let result = extract(&item(
            "Big news tonight! State officials confirmed the first measles case of the year.",
        ));
        assert_eq!(
            result,
            accepted("State officials confirmed the first measles case of the year.")
        );
    }

    #[test]
    fn test_read_more_teaser_is_rejected() {
        assert_eq!(extract(&item("Read more…")), rejected(ExtractionError::NoCleanFact));
    }

    #[test]
    fn test_fragment_without_punctuation_is_rejected() {
        assert_eq!(
            extract(&item("Celtics beat Knicks in overtime thriller at the Garden")),
            rejected(ExtractionError::NoCleanFact)
        );
    }

    #[test]
    fn test_headline_stub_is_rejected() {
        assert_eq!(
            extract(&item("MBTA fares going up.")),
            rejected(ExtractionError::NoCleanFact)
        );
    }

    #[test]
    fn test_question_is_rejected() {
        assert_eq!(
            extract(&item("Will the Red Line ever run on time again this year?")),
            rejected(ExtractionError::NoCleanFact)
        );
    }

    #[test]
    fn test_trailing_ellipsis_is_rejected() {
        assert_eq!(
            extract(&item("The governor said the state budget would include new...")),
            rejected(ExtractionError::NoCleanFact)
        );
    }

    #[test]
    fn test_teaser_phrase_is_rejected() {
        assert_eq!(
            extract(&item("Click here to see the photos from the weekend parade.")),
            rejected(ExtractionError::NoCleanFact)
        );
        assert_eq!(
            extract(&item("The post Fares rise appeared first on Boston News Daily.")),
            rejected(ExtractionError::NoCleanFact)
        );
    }

    #[test]
    fn test_sentence_without_predicate_is_rejected() {
        assert_eq!(
            extract(&item("A brand new look for the old City Hall plaza tonight.")),
            rejected(ExtractionError::NoCleanFact)
        );
    }

    #[test]
    fn test_plural_nouns_are_not_predicates() {
        assert_eq!(
            extract(&item("Highlights from the Celtics games this week.")),
            rejected(ExtractionError::NoCleanFact)
        );
        assert_eq!(
            extract(&item("Photos of the new Orange Line trains at the Wellington yard.")),
            rejected(ExtractionError::NoCleanFact)
        );
    }

    #[test]
    fn test_plural_verb_after_subject_is_a_predicate() {
        let text = "The city plans to reopen the Long Island bridge next year.";
        assert_eq!(extract(&item(text)), accepted(text));
    }

    #[test]
    fn test_name_with_initials_stays_whole() {
        let text = "A.J. Brown signed a new contract with the Patriots on Monday.";
        assert_eq!(extract(&item(text)), accepted(text));
    }

    #[test]
    fn test_short_reply_ends_a_sentence() {
        assert_eq!(
            extract(&item(
                "Voters said no. The measure failed by a wide margin on Tuesday night."
            )),
            accepted("The measure failed by a wide margin on Tuesday night.")
        );
    }

    #[test]
    fn test_short_excerpt_is_empty_content() {
        assert_eq!(extract(&item("Video")), rejected(ExtractionError::EmptyContent));
        assert_eq!(extract(&item("   ")), rejected(ExtractionError::EmptyContent));
    }

    #[test]
    fn test_short_excerpt_wins_over_malformed_source() {
        let mut bad = item("Short");
        bad.source_name = String::new();
        assert_eq!(extract(&bad), rejected(ExtractionError::EmptyContent));
    }

    #[test]
    fn test_blank_source_is_unparseable() {
        let mut bad = item("The MBTA announced a fare increase effective July 1.");
        bad.source_name = "  ".to_string();
        assert_eq!(extract(&bad), rejected(ExtractionError::Unparseable));
    }

    #[test]
    fn test_residual_markup_is_unparseable() {
        assert_eq!(
            extract(&item("<p>The MBTA announced a fare increase effective July 1.</p>")),
            rejected(ExtractionError::Unparseable)
        );
    }

    #[test]
    fn test_replacement_character_is_unparseable() {
        assert_eq!(
            extract(&item("The MBTA announced a fare incr\u{fffd}ase effective July 1.")),
            rejected(ExtractionError::Unparseable)
        );
    }

    #[test]
    fn test_comparison_is_not_markup() {
        let text = "The report found that 3 < 5 schools met the new standard.";
        assert_eq!(extract(&item(text)), accepted(text));
    }

    #[test]
    fn test_verdict_is_deterministic() {
        let input = item("Gov. Healey signed the housing bond bill on Thursday. More to come.");
        assert_eq!(extract(&input), extract(&input));
    }

    // ==================== Sentence Splitting Tests ====================

    #[test]
    fn test_split_basic() {
        assert_eq!(
            split_sentences("One thing happened. Another thing followed! Then what?"),
            vec!["One thing happened.", "Another thing followed!", "Then what?"]
        );
    }

    #[test]
    fn test_split_respects_abbreviations() {
        assert_eq!(
            split_sentences("Gov. Healey met with Sen. Markey in the U.S. Capitol. They talked."),
            vec!["Gov. Healey met with Sen. Markey in the U.S. Capitol.", "They talked."]
        );
    }

    #[test]
    fn test_split_respects_initials() {
        assert_eq!(
            split_sentences("The John F. Kennedy Library reopened today."),
            vec!["The John F. Kennedy Library reopened today."]
        );
    }

    #[test]
    fn test_split_keeps_dotted_initials() {
        assert_eq!(
            split_sentences("T.J. Oshie and A.J. Brown met fans in Washington, D.C. on Friday."),
            vec!["T.J. Oshie and A.J. Brown met fans in Washington, D.C. on Friday."]
        );
    }

    #[test]
    fn test_split_place_abbreviation_before_new_sentence() {
        assert_eq!(
            split_sentences("The talks moved to the U.S. Officials said a deal is close."),
            vec!["The talks moved to the U.S.", "Officials said a deal is close."]
        );
        assert_eq!(
            split_sentences("The storm reached Springfield, Mass. Schools closed early."),
            vec!["The storm reached Springfield, Mass.", "Schools closed early."]
        );
        assert_eq!(
            split_sentences("She joined the U.S. Coast Guard in 2019."),
            vec!["She joined the U.S. Coast Guard in 2019."]
        );
    }

    #[test]
    fn test_split_number_abbreviation() {
        assert_eq!(
            split_sentences("Voters said no. The measure failed."),
            vec!["Voters said no.", "The measure failed."]
        );
        assert_eq!(
            split_sentences("Route No. 9 reopened after the crash. Traffic is moving."),
            vec!["Route No. 9 reopened after the crash.", "Traffic is moving."]
        );
    }

    #[test]
    fn test_split_keeps_closing_quote() {
        assert_eq!(
            split_sentences("She said \u{201c}we are ready.\u{201d} The vote is Monday."),
            vec!["She said \u{201c}we are ready.\u{201d}", "The vote is Monday."]
        );
    }

    #[test]
    fn test_split_ignores_lowercase_continuation() {
        assert_eq!(
            split_sentences("The rate rose 2.5 percent. about that."),
            vec!["The rate rose 2.5 percent. about that."]
        );
    }

    #[test]
    fn test_split_keeps_unterminated_tail() {
        assert_eq!(
            split_sentences("Done here. And a fragment"),
            vec!["Done here.", "And a fragment"]
        );
    }

    #[test]
    fn test_abbreviation_inside_accepted_fact() {
        let text = "Gov. Healey signed the housing bond bill on Thursday.";
        assert_eq!(extract(&item(text)), accepted(text));
    }
}
