use chrono::{SecondsFormat, Utc};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{choice, StructuredContent};
use crate::config::Collection;
use crate::notion::{plain_text, Properties, PropertyValue};

const TIP_INSTRUCTIONS: &str = "You are a positive and cheerful spanish language tutor that provides tips to help people learn Spanish. Each tip should be clear, and practical with enough information for me to learn the concept that is being discussed.";

const PRACTICE_URL: &str = "https://chat.openai.com/";

choice! {
    Category {
        CoreGrammar => "🔷 Core Grammar & Verb Use",
        Vocabulary => "🟨 Vocabulary & Word Use",
        Conversation => "🟩 Conversation & Usage",
        Pronunciation => "🟫 Pronunciation & Listening",
        Culture => "🟪 Cultural / Regional Variation",
    }
}

choice! {
    Subcategory {
        VerbConjugation => "Verb Conjugation",
        VerbUsage => "Verb Usage / Meaning Differences",
        TenseAndMood => "Tense & Mood",
        GrammarStructures => "Grammar Structures",
        Vocabulary => "Vocabulary",
        CommonMistakes => "Common Mistakes / False Friends",
        Synonyms => "Synonyms & Word Nuances",
        PhrasePatterns => "Phrase Patterns / Sentence Starters",
        Questions => "Questions & Interrogatives",
        Idioms => "Idiomatic Expressions",
        Formality => "Formality & Register",
        Pronunciation => "Pronunciation",
        Listening => "Listening Tips",
        RegionalUsage => "Regional Usage",
        CulturalNotes => "Cultural Notes",
    }
}

choice! {
    /// CEFR level of the tip
    Level {
        A1 => "🟢 A1: Beginner",
        A2 => "🟡 A2:Elementary",
        B1 => "🔵 B1: Intermediate",
        B2 => "🟣 B2: Upper Intermediate",
        C1 => "🔴 C1: Advanced",
        C2 => "⚫ C2: Proficient",
    }
}

/// A generated Spanish language tip
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SpanishTip {
    pub title: String,
    pub category: Category,
    pub subcategory: Subcategory,
    pub level: Level,
    pub explanation: String,
    pub examples: String,
    pub practice_prompt: String,
}

impl SpanishTip {
    /// Link that opens ChatGPT with a practice request for this tip
    pub fn practice_url(&self) -> String {
        let query = format!(
            "You are a Spanish language tutor that provides tips to help people learn Spanish. I am currently studying the topic \"{}\", and I want to practice it. Please provide me with practice prompts that I can use to improve my understanding of this topic.",
            self.title
        );
        Url::parse_with_params(PRACTICE_URL, &[("q", query)])
            .map(String::from)
            .unwrap_or_else(|_| PRACTICE_URL.to_string())
    }
}

fn text(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn one_of(labels: &[&str]) -> Value {
    json!({"type": "string", "enum": labels})
}

impl StructuredContent for SpanishTip {
    const SCHEMA_NAME: &'static str = "tip";
    const INSTRUCTIONS: &'static str = TIP_INSTRUCTIONS;
    const COLLECTION: Collection = Collection::Tips;
    const FILENAME_FALLBACK: &'static str = "tip";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": text("A concise title for the tip, ideally 5-10 words."),
                "category": one_of(Category::LABELS),
                "subcategory": one_of(Subcategory::LABELS),
                "level": one_of(Level::LABELS),
                "explanation": text("A clear explanation of the tip. You can use markdown formatting for emphasis."),
                "examples": text("Put the tip into practice by providing 2-3 spanish sentences or phrases that show the tip in use. You can use markdown formatting for emphasis."),
                "practicePrompt": text("Give a homework prompt for the user so that they can practice the tip. You can use markdown formatting for emphasis."),
            },
            "required": [
                "title",
                "category",
                "subcategory",
                "level",
                "explanation",
                "examples",
                "practicePrompt",
            ],
            "additionalProperties": false,
        })
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn body_markdown(&self) -> String {
        format!(
            "[Practice with ChatGPT]({})\n# Explanation\n{}\n# Examples\n{}\n# Practice Prompt\n{}",
            self.practice_url(),
            self.explanation,
            self.examples,
            self.practice_prompt
        )
    }

    fn properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.insert("Name".to_string(), PropertyValue::Title(plain_text(&self.title)));
        properties.insert("Category".to_string(), PropertyValue::select(self.category.label()));
        properties.insert(
            "Subcategory".to_string(),
            PropertyValue::select(self.subcategory.label()),
        );
        properties.insert("CEFR Level".to_string(), PropertyValue::select(self.level.label()));
        properties.insert(
            "Last Reviewed".to_string(),
            PropertyValue::date(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notion::{markdown_to_blocks, Block};

    fn sample() -> SpanishTip {
        serde_json::from_value(json!({
            "title": "Ser vs. Estar",
            "category": "🔷 Core Grammar & Verb Use",
            "subcategory": "Verb Usage / Meaning Differences",
            "level": "🟡 A2:Elementary",
            "explanation": "Use **ser** for identity and *estar* for states.",
            "examples": "- Soy profesor.\n- Estoy cansado.",
            "practicePrompt": "Write three sentences about your day."
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_labels() {
        let tip = sample();
        assert_eq!(tip.category, Category::CoreGrammar);
        assert_eq!(tip.subcategory, Subcategory::VerbUsage);
        assert_eq!(tip.level, Level::A2);
        assert_eq!(tip.level.label(), "🟡 A2:Elementary");
    }

    #[test]
    fn test_unknown_level_rejected() {
        let result = serde_json::from_value::<SpanishTip>(json!({
            "title": "x",
            "category": "🔷 Core Grammar & Verb Use",
            "subcategory": "Vocabulary",
            "level": "B3",
            "explanation": "x",
            "examples": "x",
            "practicePrompt": "x"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_uses_field_is_not_accepted() {
        let result = serde_json::from_value::<SpanishTip>(json!({
            "title": "x",
            "category": "🔷 Core Grammar & Verb Use",
            "subcategory": "Vocabulary",
            "level": "🟢 A1: Beginner",
            "explanation": "x",
            "uses": "x",
            "practicePrompt": "x"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_schema_lists_every_label() {
        let schema = SpanishTip::schema();
        assert_eq!(schema["properties"]["subcategory"]["enum"].as_array().unwrap().len(), 15);
        assert_eq!(schema["properties"]["level"]["enum"].as_array().unwrap().len(), 6);
        assert_eq!(schema["required"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn test_practice_url_is_encoded() {
        let url = sample().practice_url();
        assert!(url.starts_with("https://chat.openai.com/?q=You+are+a+Spanish"));
        assert!(url.contains("%22Ser+vs.+Estar%22"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_body_markdown() {
        let tip = sample();
        let markdown = tip.body_markdown();

        assert!(markdown.starts_with("[Practice with ChatGPT](https://chat.openai.com/?q="));
        assert!(markdown.contains("\n# Explanation\nUse **ser** for identity"));
        assert!(markdown.contains("\n# Examples\n- Soy profesor."));
        assert!(markdown.ends_with("# Practice Prompt\nWrite three sentences about your day."));
        assert_eq!(markdown, tip.body_markdown());
    }

    #[test]
    fn test_body_blocks() {
        let blocks = markdown_to_blocks(&sample().body_markdown());

        assert!(matches!(blocks[0], Block::Paragraph { .. }));
        assert!(blocks[0].rich_text()[0]
            .link()
            .unwrap()
            .starts_with("https://chat.openai.com/"));
        assert_eq!(blocks[1].text(), "Explanation");
        assert!(blocks
            .iter()
            .any(|block| matches!(block, Block::BulletedListItem { .. }) && block.text() == "Estoy cansado."));
    }

    #[test]
    fn test_properties() {
        let properties = sample().properties();

        assert_eq!(properties.len(), 5);
        assert_eq!(
            properties["CEFR Level"],
            PropertyValue::select("🟡 A2:Elementary")
        );
        assert!(matches!(properties["Last Reviewed"], PropertyValue::Date(_)));
    }
}
