const PLACEHOLDER: &str = "{text}";

const DEFAULT_TEMPLATE: &str = "Identify the language of the following text. \
If the text is in English, translate to German. \
If it is not in English, translate it to English. \
Provide only the translation, with no explanation or extra text.\n\n{text}";

/// Instructional wrapper around the text being translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}

impl PromptTemplate {
    /// A template without a `{text}` placeholder gets the text appended after a blank line.
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn render(&self, source_text: &str) -> String {
        match self.template.split_once(PLACEHOLDER) {
            Some((head, tail)) => {
                let mut prompt = String::with_capacity(self.template.len() + source_text.len());
                prompt.push_str(head);
                prompt.push_str(source_text);
                prompt.push_str(tail);
                prompt
            }
            None => format!("{}\n\n{}", self.template.trim_end(), source_text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_embeds_text_verbatim() {
        let template = PromptTemplate::default();
        assert!(template.as_str().contains("{text}"));
        let prompt = template.render("Hola");
        assert!(prompt.starts_with("Identify the language"));
        assert!(prompt.ends_with("extra text.\n\nHola"));
    }

    #[test]
    fn placeholder_in_source_text_is_left_alone() {
        let prompt = PromptTemplate::new("Translate: {text} (only)").render("a {text} b");
        assert_eq!(prompt, "Translate: a {text} b (only)");
    }

    #[test]
    fn missing_placeholder_appends() {
        let prompt = PromptTemplate::new("Translate to French.\n").render("Hello");
        assert_eq!(prompt, "Translate to French.\n\nHello");
    }
}
