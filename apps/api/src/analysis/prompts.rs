// Prompt constants for the nutrition estimation calls.
// Placeholders ({food_name}, {portion_size}) are substituted with .replace().

/// Fixed instruction prompt sent with every photo analysis.
pub const ANALYZE_FOOD_PROMPT: &str = "\
Analyze the food in this photo and provide accurate nutrition information.

Respond in this exact JSON format:
{
  \"foodName\": \"name of the food\",
  \"portionSize\": \"estimated portion, e.g. 1 serving, 150g\",
  \"calories\": 500,
  \"macronutrients\": {
    \"carbs\": 60,
    \"protein\": 25,
    \"fat\": 15,
    \"sugar\": 10
  },
  \"confidence\": 0.85,
  \"description\": \"a short description\"
}

Rules:
- If there are multiple foods, report the combined totals
- Give nutrient values in grams
- confidence is a value between 0 and 1
- Return pure JSON only, with no markdown formatting
- If the image does not contain food, return { \"error\": \"No food detected\" }";

/// Text-only nutrition lookup by food name and portion.
pub const SEARCH_NUTRITION_PROMPT: &str = "\
Provide nutrition information for \"{food_name}\" (portion: {portion_size}).

Respond in this exact JSON format, with no markdown formatting:
{
  \"foodName\": \"{food_name}\",
  \"portionSize\": \"{portion_size}\",
  \"calories\": 0,
  \"macronutrients\": {
    \"carbs\": 0,
    \"protein\": 0,
    \"fat\": 0,
    \"sugar\": 0
  },
  \"confidence\": 0.85,
  \"description\": \"source or notes for the estimate\"
}

Give every number as a plain integer, not a string.";
