//! Prompt Builder System
//!
//! Prompt construction shared by the capability services. Each service
//! prompt is assembled from the same kinds of sections so the models see a
//! consistent layout: a lead instruction, the caller's requirements, a
//! numbered instruction list and, when structured output is wanted, the
//! JSON schema to follow.

mod context;
mod templates;

pub use context::{format_user_context, summarize_meals};
pub use templates::{CHAT_SYSTEM_PROMPT, PromptTemplates};

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Opening instruction line(s)
    Lead(String),
    /// Bold-labelled requirement lines (`**label:** value`)
    Requirements(Vec<(String, String)>),
    /// Numbered list under a header
    Numbered { header: String, items: Vec<String> },
    /// Bulleted list under a header
    Bullets { header: String, items: Vec<String> },
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// JSON shape the model must reply with
    Schema { intro: String, schema: String },
    /// Closing line
    Closing(String),
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lead(mut self, content: impl Into<String>) -> Self {
        self.sections.push(PromptSection::Lead(content.into()));
        self
    }

    /// Add a requirement line; repeated calls extend the same block
    pub fn requirement(mut self, label: &str, value: impl Into<String>) -> Self {
        let entry = (label.to_string(), value.into());
        match self.sections.last_mut() {
            Some(PromptSection::Requirements(items)) => items.push(entry),
            _ => self.sections.push(PromptSection::Requirements(vec![entry])),
        }
        self
    }

    /// Requirement line that is skipped when the list is empty
    pub fn requirement_list(self, label: &str, values: &[String]) -> Self {
        if values.is_empty() {
            self
        } else {
            self.requirement(label, values.join(", "))
        }
    }

    pub fn numbered(mut self, header: &str, items: &[&str]) -> Self {
        self.sections.push(PromptSection::Numbered {
            header: header.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn bullets(mut self, header: &str, items: &[&str]) -> Self {
        self.sections.push(PromptSection::Bullets {
            header: header.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.into(),
        });
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: impl Into<String>) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.into(),
        });
        self
    }

    pub fn schema(mut self, intro: &str, schema: &str) -> Self {
        self.sections.push(PromptSection::Schema {
            intro: intro.to_string(),
            schema: schema.trim().to_string(),
        });
        self
    }

    pub fn closing(mut self, content: &str) -> Self {
        self.sections
            .push(PromptSection::Closing(content.to_string()));
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Lead(content) | PromptSection::Closing(content) => {
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Requirements(items) => {
                    for (label, value) in items {
                        prompt.push_str(&format!("**{}:** {}\n\n", label, value));
                    }
                }
                PromptSection::Numbered { header, items } => {
                    prompt.push_str(&format!("{}\n", header));
                    for (i, item) in items.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, item));
                    }
                    prompt.push('\n');
                }
                PromptSection::Bullets { header, items } => {
                    prompt.push_str(&format!("{}\n", header));
                    for item in items {
                        prompt.push_str(&format!("- {}\n", item));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("{}\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Schema { intro, schema } => {
                    prompt.push_str(&format!("{}\n\n", intro));
                    prompt.push_str(&schema);
                    prompt.push_str("\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_and_bullets() {
        let prompt = PromptBuilder::new()
            .lead("Analyze this meal.")
            .numbered("Instructions:", &["Identify food", "Estimate portions"])
            .bullets("Provide:", &["Meal name"])
            .build();

        assert!(prompt.starts_with("Analyze this meal.\n\n"));
        assert!(prompt.contains("Instructions:\n1. Identify food\n2. Estimate portions"));
        assert!(prompt.contains("Provide:\n- Meal name"));
    }

    #[test]
    fn test_requirements_keep_order() {
        let prompt = PromptBuilder::new()
            .requirement("Cuisine type", "Thai")
            .requirement_list("Dietary restrictions", &[])
            .requirement_list("Health goals", &["low-carb".into(), "high-protein".into()])
            .build();

        assert_eq!(
            prompt,
            "**Cuisine type:** Thai\n\n**Health goals:** low-carb, high-protein"
        );
    }

    #[test]
    fn test_schema_section() {
        let prompt = PromptBuilder::new()
            .schema("Return JSON format:", "\n{\"calories\": 0}\n")
            .closing("Return ONLY valid JSON.")
            .build();

        assert!(prompt.contains("Return JSON format:\n\n{\"calories\": 0}\n\nReturn ONLY"));
    }

    #[test]
    fn test_section_header() {
        let prompt = PromptBuilder::new()
            .section("User context:", "No user context available")
            .build();
        assert_eq!(prompt, "User context:\nNo user context available");
    }
}
