mod recipe;
mod spanish_tip;

pub use recipe::{Difficulty, Ingredient, MealType, NutritionItem, ProteinType, Recipe};
pub use spanish_tip::{Category, Level, SpanishTip, Subcategory};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Collection;
use crate::notion::Properties;

/// A content type the model is asked to produce and Notion stores
///
/// The JSON schema is sent with the generation request and the response is
/// deserialized into `Self`, so a missing or mistyped field fails the run.
pub trait StructuredContent: DeserializeOwned + Send + Sync {
    /// Name attached to the JSON schema in the generation request
    const SCHEMA_NAME: &'static str;
    /// System instructions sent alongside the user prompt
    const INSTRUCTIONS: &'static str;
    /// Database the page is created in
    const COLLECTION: Collection;
    /// Slug used for upload filenames when the title has none
    const FILENAME_FALLBACK: &'static str;

    /// Strict JSON schema describing `Self`
    fn schema() -> Value;

    fn title(&self) -> &str;

    /// Description for a cover image, `None` when this type has no cover
    fn image_prompt(&self) -> Option<String> {
        None
    }

    /// Markdown for the page body
    fn body_markdown(&self) -> String;

    fn properties(&self) -> Properties;
}

/// Declares a closed set of labels shared by the schema, serde and Notion selects
macro_rules! choice {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }
    };
}
pub(crate) use choice;

/// `# heading` followed by steps numbered from 1 in order
pub fn numbered_section(heading: &str, steps: &[String]) -> String {
    let mut lines = Vec::with_capacity(steps.len() + 1);
    lines.push(format!("# {}", heading));
    lines.extend(
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| format!("{}. {}", index + 1, step)),
    );
    lines.join("\n")
}

/// `**name** - value` lines, one per pair
pub fn pair_lines<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(name, value)| format!("**{}** - {}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}
