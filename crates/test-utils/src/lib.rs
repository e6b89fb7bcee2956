//! Reblock test utilities.
//!
//! Helpers for integration testing: block markup builders, post fixtures,
//! and assertion utilities.

use serde_json::{Map, Value as JsonValue};

/// Start building a block of type `name`.
pub fn test_block(name: &str) -> TestBlock {
    TestBlock {
        name: name.to_string(),
        attrs: Map::new(),
        parts: Vec::new(),
    }
}

/// A block markup builder.
///
/// A block with no inner parts is written in the self-closing form.
#[derive(Debug, Clone)]
pub struct TestBlock {
    pub name: String,
    pub attrs: Map<String, JsonValue>,
    parts: Vec<Part>,
}

#[derive(Debug, Clone)]
enum Part {
    Html(String),
    Block(TestBlock),
}

impl TestBlock {
    /// Add an attribute.
    pub fn with_attr(mut self, key: &str, value: JsonValue) -> Self {
        self.attrs.insert(key.to_string(), value);
        self
    }

    /// Append literal HTML inside the block.
    pub fn html(mut self, html: &str) -> Self {
        self.parts.push(Part::Html(html.to_string()));
        self
    }

    /// Append a nested block.
    pub fn child(mut self, block: TestBlock) -> Self {
        self.parts.push(Part::Block(block));
        self
    }

    /// Render as comment-delimited markup.
    pub fn to_markup(&self) -> String {
        let attrs = if self.attrs.is_empty() {
            String::new()
        } else {
            format!("{} ", JsonValue::Object(self.attrs.clone()))
        };

        if self.parts.is_empty() {
            return format!("<!-- wp:{} {attrs}/-->", self.name);
        }

        let inner: String = self
            .parts
            .iter()
            .map(|part| match part {
                Part::Html(html) => html.clone(),
                Part::Block(block) => block.to_markup(),
            })
            .collect();
        format!(
            "<!-- wp:{name} {attrs}-->{inner}<!-- /wp:{name} -->",
            name = self.name
        )
    }
}

/// A paragraph block wrapping `text`.
pub fn paragraph(text: &str) -> TestBlock {
    test_block("paragraph").html(&format!("<p>{text}</p>"))
}

/// Join blocks into one document.
pub fn document(blocks: &[TestBlock]) -> String {
    blocks.iter().map(TestBlock::to_markup).collect()
}

/// Create a published test post with default values.
pub fn test_post(id: i64, content: &str) -> TestPost {
    TestPost {
        id,
        post_type: "post".to_string(),
        status: "publish".to_string(),
        title: format!("Test post {id}"),
        content: content.to_string(),
    }
}

/// A test post builder.
#[derive(Debug, Clone)]
pub struct TestPost {
    pub id: i64,
    pub post_type: String,
    pub status: String,
    pub title: String,
    pub content: String,
}

impl TestPost {
    /// Make it a page.
    pub fn page(mut self) -> Self {
        self.post_type = "page".to_string();
        self
    }

    /// Set as draft.
    pub fn draft(mut self) -> Self {
        self.status = "draft".to_string();
        self
    }

    /// Set the content type.
    pub fn with_type(mut self, post_type: &str) -> Self {
        self.post_type = post_type.to_string();
        self
    }
}

/// Ready-made documents.
pub mod fixtures {
    use super::{document, paragraph, test_block};

    /// A statically saved `acme/hero` with two children between paragraphs.
    pub fn hero_document() -> String {
        document(&[
            paragraph("Intro"),
            test_block("acme/hero")
                .html("<div class=\"hero\">")
                .child(test_block("heading").html("<h2>Title</h2>"))
                .child(paragraph("Body"))
                .html("</div>"),
            paragraph("Outro"),
        ])
    }

    /// A document with no updatable blocks.
    pub fn plain_document() -> String {
        document(&[paragraph("Nothing to see")])
    }

    /// A document whose `acme/hero` opener is never closed.
    pub fn unclosed_document() -> String {
        "<!-- wp:acme/hero --><div class=\"hero\">".to_string()
    }
}

/// Assertion helpers for JSON content.
pub mod assert {
    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }
}
