//! End-to-end properties of the compile + post-process pipeline.

use std::sync::Arc;
use std::time::Duration;

use inkpane::compile::PlaceholderStatus;
use inkpane::config::{PreviewConfig, ReadyPoll};
use inkpane::host::DisconnectedGateway;
use inkpane::library::{LibraryDescriptor, LibrarySource, Resolver};
use inkpane::remote::{OfflineTransport, StaticTransport, Transport};
use inkpane::render::{PassOutcome, Renderer};

fn quick_config() -> PreviewConfig {
    PreviewConfig {
        readiness: ReadyPoll {
            attempts: 5,
            interval: Duration::from_millis(1),
        },
        ..PreviewConfig::default()
    }
}

fn offline_renderer() -> Renderer {
    Renderer::assemble(
        quick_config(),
        Arc::new(OfflineTransport),
        Arc::new(DisconnectedGateway),
    )
}

/// A registry whose only flowkit sources are remote, so an offline
/// transport exhausts every source.
fn remote_only_flowkit() -> Vec<LibraryDescriptor> {
    vec![LibraryDescriptor {
        name: "flowkit",
        sources: vec![
            LibrarySource::remote_primary("https://engines.test/flowkit.json"),
            LibrarySource::remote_alternate("https://mirror.test/flowkit.json"),
        ],
        expected_capabilities: &["render", "render_sequence", "render_class"],
        is_ready: |h| h.is_warm() && h.has_capability("render"),
        preconfigure: None,
        embedded_resolve: None,
    }]
}

#[tokio::test]
async fn process_equals_compile_for_structure_only_documents() {
    let renderer = offline_renderer();
    let text = "# Notes\n\nSome *styled* text with a [link](https://example.com).\n\n\
                | A | B |\n|---|---|\n| 1 | 2 |\n\n- one\n- two\n";
    let compiled = renderer.compile(text).markup;
    let processed = renderer.process(text).await.into_markup().unwrap();
    assert_eq!(processed, compiled);
}

#[tokio::test]
async fn startup_readiness_summary_is_all_ready_offline() {
    let renderer = offline_renderer();
    let summary = renderer.ensure_libraries_ready().await;
    assert!(summary.all_ready(), "unavailable engines: {:?}", summary.failed);
    assert_eq!(summary.succeeded.len(), 7);
}

#[tokio::test]
async fn every_wellformed_block_settles_rendered() {
    let renderer = offline_renderer();
    let text = "\
```flowchart\nA[Edit]-->B[Preview]\n```\n\n\
```sequence\nEditor->>Core: process\n```\n\n\
```class\nclass Pass {\n  id: u64\n}\n```\n\n\
```circuit\nR1 1 2 10k\n```\n\n\
```mindmap\n# Core\n## Resolver\n```\n\n\
```chart\n{ type: 'bar', series: [{ name: 'a', data: [1, 2] }] }\n```\n\n\
```tab\ne|--0--2--|\n```\n\n\
```timing\nclk: 1010\n```\n\n\
```math\nE = mc^2\n```\n";

    let compiled = renderer.compile(text);
    assert_eq!(compiled.placeholders.len(), 9);
    assert!(compiled
        .placeholders
        .iter()
        .all(|p| p.status() == PlaceholderStatus::Pending));

    let markup = renderer.process(text).await.into_markup().unwrap();
    assert!(!markup.contains("ink-placeholder"), "unsettled placeholder left behind");
    assert!(!markup.contains("ink-block-error"), "unexpected error block");
}

#[tokio::test]
async fn one_malformed_block_yields_exactly_one_error_panel() {
    let renderer = offline_renderer();
    let text = "\
```flowchart\nA-->B\n```\n\n\
```chart\n{ definitely broken\n```\n\n\
```timing\nclk: 1010\n```\n\n\
```tab\ne|--3--|\n```\n";

    let markup = renderer.process(text).await.into_markup().unwrap();
    assert_eq!(markup.matches("ink-block-error").count(), 1);
    assert!(markup.contains("ink-flow"));
    assert!(markup.contains("ink-wave"));
    assert!(markup.contains("ink-tab"));
}

#[tokio::test]
async fn unavailable_engine_produces_error_block_with_exact_source() {
    let resolver = Arc::new(Resolver::with_registry(
        remote_only_flowkit(),
        quick_config(),
        Arc::new(OfflineTransport),
    ));
    let renderer = Renderer::with_resolver(resolver, Arc::new(DisconnectedGateway), quick_config());

    let markup = renderer
        .process("```flowchart\nA-->B\n```\n")
        .await
        .into_markup()
        .unwrap();

    assert_eq!(markup.matches("ink-block-error").count(), 1);
    // The visible source is the verbatim block body, markup-escaped.
    assert!(markup.contains("<code>A--&gt;B</code>"));
    assert!(markup.contains("unavailable"));
}

#[tokio::test]
async fn inline_math_renders_in_place_when_engine_ready() {
    let renderer = offline_renderer();
    renderer.ensure_libraries_ready().await;

    let markup = renderer
        .process("The area grows as $x^2$ with side length.\n")
        .await
        .into_markup()
        .unwrap();

    assert!(markup.contains("The area grows as"));
    assert!(markup.contains(r#"<span class="ink-math">x<sup>2</sup></span>"#));
    assert!(markup.contains("with side length."));
}

#[tokio::test]
async fn newer_pass_supersedes_older_in_flight_pass() {
    let renderer = offline_renderer();
    let d1 = "```flowchart\nA-->B\n```\n";
    let d2 = "# second draft\n";

    let (first, second) = tokio::join!(renderer.process(d1), renderer.process(d2));
    assert_eq!(first, PassOutcome::Superseded);
    assert!(first.into_markup().is_none());
    assert!(second.into_markup().unwrap().contains("second draft"));
}

#[tokio::test]
async fn concurrent_resolves_observe_one_load() {
    let transport = Arc::new(StaticTransport::new());
    transport.stock(
        "https://engines.test/flowkit.json",
        r#"{"engine":"flowkit","version":"2.1.0"}"#,
    );
    let resolver = Arc::new(Resolver::with_registry(
        vec![LibraryDescriptor {
            name: "flowkit",
            sources: vec![LibrarySource::remote_primary("https://engines.test/flowkit.json")],
            expected_capabilities: &["render"],
            is_ready: |h| h.is_warm() && h.has_capability("render"),
            preconfigure: None,
            embedded_resolve: None,
        }],
        quick_config(),
        Arc::clone(&transport) as Arc<dyn Transport>,
    ));

    let (a, b, c) = tokio::join!(
        resolver.resolve("flowkit"),
        resolver.resolve("flowkit"),
        resolver.resolve("flowkit"),
    );
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
    assert_eq!(transport.fetch_count(), 1, "duplicate source loads observed");
}

#[tokio::test]
async fn degraded_capability_is_contained_to_its_block() {
    // A bundle that only vouches for flowcharts: class diagrams hit the
    // patched stand-in and fail as a single contained block.
    let transport = Arc::new(StaticTransport::new());
    transport.stock(
        "https://engines.test/flowkit.json",
        r#"{"engine":"flowkit","version":"1.8.0","provides":["render"]}"#,
    );
    let config = quick_config();
    let resolver = Arc::new(Resolver::with_registry(
        vec![LibraryDescriptor {
            name: "flowkit",
            sources: vec![LibrarySource::remote_primary("https://engines.test/flowkit.json")],
            expected_capabilities: &["render", "render_sequence", "render_class"],
            is_ready: |h| h.is_warm() && h.has_capability("render"),
            preconfigure: None,
            embedded_resolve: None,
        }],
        config.clone(),
        Arc::clone(&transport) as Arc<dyn Transport>,
    ));
    let renderer = Renderer::with_resolver(resolver, Arc::new(DisconnectedGateway), config);

    let text = "```flowchart\nA-->B\n```\n\n```class\nclass A {\n  x\n}\n```\n";
    let markup = renderer.process(text).await.into_markup().unwrap();

    assert!(markup.contains("ink-flow"), "native capability should render");
    assert_eq!(markup.matches("ink-block-error").count(), 1);
    assert!(markup.contains("degraded"));
}

#[tokio::test]
async fn rapid_fire_passes_only_last_wins() {
    let renderer = offline_renderer();
    let (a, b, c) = tokio::join!(
        renderer.process("```flowchart\nA-->B\n```\n"),
        renderer.process("```timing\nclk: 10\n```\n"),
        renderer.process("# final\n"),
    );
    assert_eq!(a, PassOutcome::Superseded);
    assert_eq!(b, PassOutcome::Superseded);
    assert!(c.into_markup().unwrap().contains("final"));
}
