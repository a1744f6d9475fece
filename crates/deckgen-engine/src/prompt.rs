//! Embedded prompt templates and variable substitution.
//!
//! Templates ship inside the binary (`include_str!`) and use `{name}`
//! placeholders. Substitution is lenient: a placeholder with no matching
//! variable is left in place rather than erroring, so template edits
//! cannot take the service down.

const TEXT_TEMPLATE: &str = include_str!("../prompts/text_generation.md");
const TABLE_TEMPLATE: &str = include_str!("../prompts/table_generation.md");

/// Replace `{name}` placeholders with the given values.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

pub struct TextPromptInputs<'a> {
    pub target_words: u32,
    /// Fractional tolerance used to derive the min/max word band.
    pub tolerance: f64,
    pub previous_context: &'a str,
    pub theme: &'a str,
    pub audience: &'a str,
    pub slide_title: &'a str,
    pub narrative: &'a str,
    /// Topics already formatted as bullet lines.
    pub topics: &'a str,
}

pub fn text_generation(inputs: &TextPromptInputs<'_>) -> String {
    let target = f64::from(inputs.target_words);
    let min_words = (target * (1.0 - inputs.tolerance)) as u32;
    let max_words = (target * (1.0 + inputs.tolerance)) as u32;

    render(
        TEXT_TEMPLATE,
        &[
            ("target_words", inputs.target_words.to_string().as_str()),
            ("min_words", min_words.to_string().as_str()),
            ("max_words", max_words.to_string().as_str()),
            ("previous_context", inputs.previous_context),
            ("theme", inputs.theme),
            ("audience", inputs.audience),
            ("slide_title", inputs.slide_title),
            ("narrative", inputs.narrative),
            ("topics", inputs.topics),
        ],
    )
}

pub struct TablePromptInputs<'a> {
    pub description: &'a str,
    /// Raw data pre-formatted as a JSON string, or a "no data" note.
    pub data: &'a str,
    pub previous_context: &'a str,
    pub theme: &'a str,
    pub audience: &'a str,
    pub slide_title: &'a str,
    pub max_rows: u32,
    pub max_columns: u32,
}

pub fn table_generation(inputs: &TablePromptInputs<'_>) -> String {
    render(
        TABLE_TEMPLATE,
        &[
            ("description", inputs.description),
            ("data", inputs.data),
            ("previous_context", inputs.previous_context),
            ("theme", inputs.theme),
            ("audience", inputs.audience),
            ("slide_title", inputs.slide_title),
            ("max_rows", inputs.max_rows.to_string().as_str()),
            ("max_columns", inputs.max_columns.to_string().as_str()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_variables() {
        let out = render("Hello {name}, {greeting}!", &[("name", "world"), ("greeting", "hi")]);
        assert_eq!(out, "Hello world, hi!");
    }

    #[test]
    fn render_leaves_unknown_placeholders() {
        let out = render("{known} and {unknown}", &[("known", "x")]);
        assert_eq!(out, "x and {unknown}");
    }

    #[test]
    fn text_prompt_carries_word_band() {
        let prompt = text_generation(&TextPromptInputs {
            target_words: 50,
            tolerance: 0.10,
            previous_context: "This is the first slide in the presentation.",
            theme: "professional",
            audience: "executives",
            slide_title: "Q3 Results",
            narrative: "Strong quarter",
            topics: "- Revenue growth\n- Market expansion",
        });
        assert!(prompt.contains("between 45 and 55 words (target: 50 words)"));
        assert!(prompt.contains("Theme: professional"));
        assert!(prompt.contains("- Revenue growth"));
        assert!(prompt.contains("This is the first slide in the presentation."));
        assert!(!prompt.contains('{'), "unsubstituted placeholder left in prompt:\n{prompt}");
    }

    #[test]
    fn table_prompt_carries_constraints_and_data() {
        let prompt = table_generation(&TablePromptInputs {
            description: "Quarterly revenue by region",
            data: "{\n  \"Q3\": 58.3\n}",
            previous_context: "Previous slides covered revenue growth.",
            theme: "professional",
            audience: "executives",
            slide_title: "Regional Performance",
            max_rows: 10,
            max_columns: 5,
        });
        assert!(prompt.contains("at most 10 rows and 5 columns"));
        assert!(prompt.contains("Quarterly revenue by region"));
        assert!(prompt.contains("\"Q3\": 58.3"));
    }
}
