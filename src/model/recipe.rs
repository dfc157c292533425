use serde::Deserialize;
use serde_json::{json, Value};

use super::{choice, numbered_section, pair_lines, StructuredContent};
use crate::config::Collection;
use crate::notion::{markdown_to_rich_text, plain_text, Properties, PropertyValue};

const RECIPE_INSTRUCTIONS: &str = "You are a helpful assistant that provides detailed cooking recipes based on user prompts. All the instructions and details should be clear, concise, and easy to follow.";

const IMAGE_STYLE: &str = "Style: natural light, shallow depth of field, vibrant colors, soft shadows, no text, no labels, no people, professional food styling.";

choice! {
    /// Difficulty in terms of time and technical skill
    Difficulty {
        Easy => "Easy",
        Medium => "Medium",
        Hard => "Hard",
    }
}

choice! {
    ProteinType {
        None => "None",
        Chicken => "Chicken",
        Beef => "Beef",
        Pork => "Pork",
        Tofu => "Tofu",
        Fish => "Fish",
        Seafood => "Seafood",
        Other => "Other",
    }
}

choice! {
    MealType {
        Breakfast => "Breakfast",
        Lunch => "Lunch",
        Dinner => "Dinner",
        Snack => "Snack",
        Dessert => "Dessert",
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ingredient {
    pub ingredient: String,
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NutritionItem {
    pub item: String,
    pub quantity: String,
}

/// A generated recipe
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Recipe {
    pub title: String,
    pub difficulty: Difficulty,
    pub diet: Vec<String>,
    pub allergies: Vec<String>,
    pub protein_type: Vec<ProteinType>,
    pub meal_type: Vec<MealType>,
    pub country: String,
    pub prep_time: f64,
    pub cook_time: f64,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub preparation: Vec<String>,
    pub instructions: Vec<String>,
    pub serving_size: String,
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub other_nutrition: Vec<NutritionItem>,
}

fn number(description: &str) -> Value {
    json!({"type": "number", "description": description})
}

fn text(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn list(items: Value, description: &str) -> Value {
    json!({"type": "array", "items": items, "description": description})
}

fn pair(name: &str, name_description: &str, quantity_description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            name: text(name_description),
            "quantity": text(quantity_description),
        },
        "required": [name, "quantity"],
        "additionalProperties": false,
    })
}

impl Recipe {
    pub fn ingredients_markdown(&self) -> String {
        pair_lines(
            self.ingredients
                .iter()
                .map(|i| (i.ingredient.as_str(), i.quantity.as_str())),
        )
    }

    pub fn nutrition_markdown(&self) -> String {
        pair_lines(
            self.other_nutrition
                .iter()
                .map(|n| (n.item.as_str(), n.quantity.as_str())),
        )
    }
}

impl StructuredContent for Recipe {
    const SCHEMA_NAME: &'static str = "recipe";
    const INSTRUCTIONS: &'static str = RECIPE_INSTRUCTIONS;
    const COLLECTION: Collection = Collection::Recipes;
    const FILENAME_FALLBACK: &'static str = "recipe";

    fn schema() -> Value {
        let properties = json!({
            "title": text("Title of the recipe"),
            "difficulty": {
                "type": "string",
                "enum": Difficulty::LABELS,
                "description": "Difficulty level of the recipe in terms of time and technical skill.",
            },
            "diet": list(json!({"type": "string"}), "Diet types such as Keto, Vegan, Vegetarian, etc."),
            "allergies": list(json!({"type": "string"}), "Allergens such as Shellfish, Peanuts, etc."),
            "proteinType": list(
                json!({"type": "string", "enum": ProteinType::LABELS}),
                "Types of protein used in the recipe.",
            ),
            "mealType": list(
                json!({"type": "string", "enum": MealType::LABELS}),
                "Meals this recipe suits.",
            ),
            "country": text("Country the recipe originates from."),
            "prepTime": number("Preparation time in minutes."),
            "cookTime": number("Cooking time in minutes."),
            "description": text("Short description of the recipe, such as its origins, flavor profile, cooking techniques used, common pairings, and any other interesting details."),
            "ingredients": list(
                pair("ingredient", "Ingredient name.", "Amount and unit, e.g., '2 cups'."),
                "List of ingredients with quantities.",
            ),
            "preparation": list(
                text("A single preparation step. Do not include step numbers, just the instruction."),
                "Step-by-step preparation instructions as an array of steps.",
            ),
            "instructions": list(
                text("A single instruction step. Do not include step numbers, just the instruction."),
                "Step-by-step cooking instructions as an array of steps.",
            ),
            "servingSize": text("Number of servings that the recipe makes and portion description."),
            "calories": number("Calories (cal)."),
            "carbs": number("Carbohydrates in grams (g)."),
            "protein": number("Protein in grams (g)."),
            "fat": number("Fat in grams (g)."),
            "fiber": number("Fiber in grams (g)."),
            "otherNutrition": list(
                pair("item", "Nutrition item.", "Amount and unit, e.g., '2mg'."),
                "Other nutritional details such as cholesterol, sodium, iron, zinc, potassium, vitamins, and minerals.",
            ),
        });
        let required: Vec<String> = properties
            .as_object()
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn image_prompt(&self) -> Option<String> {
        let ingredient_list = self
            .ingredients
            .iter()
            .map(|i| format!("{} ({})", i.ingredient, i.quantity))
            .collect::<Vec<_>>()
            .join(", ");

        Some(
            [
                format!("A high-quality, cinematic food photograph of \"{}\"", self.title),
                self.description.clone(),
                format!("Key ingredients: {}.", ingredient_list),
                IMAGE_STYLE.to_string(),
            ]
            .join("\n"),
        )
    }

    fn body_markdown(&self) -> String {
        [
            numbered_section("Preparation", &self.preparation),
            numbered_section("Instructions", &self.instructions),
        ]
        .join("\n")
    }

    fn properties(&self) -> Properties {
        let protein_types: Vec<&str> = self.protein_type.iter().map(|p| p.label()).collect();
        let meal_types: Vec<&str> = self.meal_type.iter().map(|m| m.label()).collect();

        let mut properties = Properties::new();
        let mut set = |name: &str, value: PropertyValue| {
            properties.insert(name.to_string(), value);
        };
        set("Name", PropertyValue::Title(plain_text(&self.title)));
        set("Difficulty", PropertyValue::select(self.difficulty.label()));
        set("Diet", PropertyValue::multi_select(&self.diet));
        set("Allergies", PropertyValue::multi_select(&self.allergies));
        set("Protein Type", PropertyValue::multi_select(&protein_types));
        set("Meal Type", PropertyValue::multi_select(&meal_types));
        set("Country of Origin", PropertyValue::select(&self.country));
        set("Prep Time (min)", PropertyValue::Number(self.prep_time));
        set("Cook Time (min)", PropertyValue::Number(self.cook_time));
        set("Description", PropertyValue::RichText(plain_text(&self.description)));
        set("Serving Size", PropertyValue::RichText(plain_text(&self.serving_size)));
        set(
            "Ingredients",
            PropertyValue::RichText(markdown_to_rich_text(&self.ingredients_markdown())),
        );
        set(
            "Nutrition Facts",
            PropertyValue::RichText(markdown_to_rich_text(&self.nutrition_markdown())),
        );
        set("Calories (cal)", PropertyValue::Number(self.calories));
        set("Carbs (g)", PropertyValue::Number(self.carbs));
        set("Protein (g)", PropertyValue::Number(self.protein));
        set("Fat (g)", PropertyValue::Number(self.fat));
        set("Fiber (g)", PropertyValue::Number(self.fiber));
        properties
    }
}
