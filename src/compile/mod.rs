//! The placeholder compiler: one synchronous pass from document text to
//! markup plus typed placeholders.
//!
//! Conventional Markdown structure renders directly. Fenced blocks whose
//! language names a notation become placeholder containers for the
//! orchestrator to resolve; everything else stays inline. Inline math is
//! the one notation rendered here, synchronously, when the math engine is
//! already resolved — it is fast and bounded, while block notations may
//! need IPC or remote round trips and are always deferred.

mod encode;
mod highlight;
mod notation;
mod placeholder;

pub use encode::{decode_payload, encode_payload};
pub use notation::NotationType;
pub use placeholder::{BlockFailure, BlockResult, PlaceholderContainer, PlaceholderStatus};

use std::sync::Arc;

use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use comrak::{Arena, Options, format_html, parse_document};

use crate::library::engine::EngineHandle;
use crate::markup::escape_text;

/// Output of one compile pass.
#[derive(Debug)]
pub struct CompiledDocument {
    pub markup: String,
    pub placeholders: Vec<PlaceholderContainer>,
}

/// The synchronous compile pass.
pub struct Compiler {
    math: Option<Arc<EngineHandle>>,
}

impl Compiler {
    /// `math` is the already-resolved math engine, if any; inline math
    /// degrades to escaped source without it.
    pub fn new(math: Option<Arc<EngineHandle>>) -> Self {
        Self { math }
    }

    pub fn compile(&self, source: &str) -> CompiledDocument {
        let arena = Arena::new();
        let options = create_options();
        let root = parse_document(&arena, source, &options);

        let mut placeholders = Vec::new();
        self.rewrite_deferred(root, &mut placeholders);

        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = format_html(root, &options, &mut buffer);
        let markup = String::from_utf8_lossy(&buffer).into_owned();

        CompiledDocument {
            markup,
            placeholders,
        }
    }

    fn rewrite_deferred<'a>(
        &self,
        root: &'a AstNode<'a>,
        placeholders: &mut Vec<PlaceholderContainer>,
    ) {
        for node in root.descendants() {
            let replacement = {
                let data = node.data.borrow();
                match &data.value {
                    NodeValue::CodeBlock(block) => {
                        let language = block.info.split_whitespace().next().filter(|s| !s.is_empty());
                        let body = block.literal.strip_suffix('\n').unwrap_or(&block.literal);
                        match language.and_then(NotationType::from_fence) {
                            Some(notation) => {
                                let container = PlaceholderContainer::new(
                                    placeholders.len() as u64,
                                    notation,
                                    body,
                                );
                                let marker = container.marker();
                                placeholders.push(container);
                                Some(html_block(marker))
                            }
                            None => Some(html_block(highlight::highlight_fence(
                                language,
                                &block.literal,
                            ))),
                        }
                    }
                    NodeValue::Math(math) => {
                        if math.display_math {
                            let container = PlaceholderContainer::new(
                                placeholders.len() as u64,
                                NotationType::Math,
                                &math.literal,
                            );
                            let marker = container.marker();
                            placeholders.push(container);
                            Some(NodeValue::HtmlInline(marker))
                        } else {
                            Some(NodeValue::HtmlInline(self.render_inline_math(&math.literal)))
                        }
                    }
                    _ => None,
                }
            };

            if let Some(value) = replacement {
                node.data.borrow_mut().value = value;
            }
        }
    }

    fn render_inline_math(&self, literal: &str) -> String {
        if let Some(engine) = self.math.as_ref().filter(|e| e.is_available() && e.is_warm()) {
            match engine.invoke("render_inline", literal) {
                Ok(rendered) => return rendered,
                Err(err) => {
                    tracing::debug!(error = %err, "inline math degraded to source");
                }
            }
        }
        format!(
            r#"<code class="ink-math-pending">{}</code>"#,
            escape_text(literal)
        )
    }
}

fn html_block(literal: String) -> NodeValue {
    NodeValue::HtmlBlock(NodeHtmlBlock {
        block_type: 0,
        literal,
    })
}

fn create_options() -> Options {
    let mut options = Options::default();

    // Same GFM surface the editor's structural pass has always had.
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.superscript = true;
    options.extension.subscript = true;
    options.extension.header_ids = Some(String::new());
    options.extension.description_lists = true;

    // Dollar-delimited math spans.
    options.extension.math_dollars = true;

    // Placeholder containers and highlighted fences are injected as raw
    // HTML nodes and must survive formatting verbatim.
    options.render.unsafe_ = true;

    options
}
