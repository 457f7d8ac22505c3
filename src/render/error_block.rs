//! The contained error panel substituted for a failed block.

use crate::compile::{BlockFailure, NotationType};
use crate::markup::escape_text;

/// Build the error panel for one failed placeholder.
///
/// A clearly marked panel carrying the message and the original source.
/// It must contain no interactive controls; the same markup is reused by
/// read-only export paths, so collapsing the source view is left to the
/// host stylesheet rather than expressed as an element.
pub fn error_block(notation: NotationType, failure: &BlockFailure) -> String {
    format!(
        concat!(
            r#"<div class="ink-block-error" data-notation="{notation}">"#,
            r#"<p class="ink-block-error-title">{notation} block failed</p>"#,
            r#"<p class="ink-block-error-message">{message}</p>"#,
            r#"<pre class="ink-block-error-source"><code>{source}</code></pre>"#,
            "</div>"
        ),
        notation = notation.as_str(),
        message = escape_text(&failure.message),
        source = escape_text(&failure.source),
    )
}
