//! Performance benchmarks for html-scrub.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use html_scrub::{clean, find_all, parse, query_selector_all, selector, CleanOptions};

const SAMPLE_HTML: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Sample Article</title>
    <style>body { color: black; }</style>
    <script>window.track = function () {};</script>
</head>
<body>
    <nav>
        <a href="/">Home</a>
        <a href="/about">About</a>
    </nav>
    <article id="main">
        <h1 class="title">Sample Article Title</h1>
        <p class="byline" onclick="track()">By Jane Doe</p>
        <!-- ad slot -->
        <div class="ad hidden">Buy now</div>
        <p>This is the first paragraph of the article. It carries enough text
        to make whitespace compression do some work.</p>
        <p>Here is a second paragraph <a href="/more" data-id="7">with a link</a>.</p>
        <ul><li>one</li><li>two</li><li></li></ul>
    </article>
    <footer>
        <p>Copyright 2024</p>
    </footer>
</body>
</html>
"#;

fn synthetic_page(paragraphs: usize) -> String {
    let mut html = String::from("<html><body><div id=\"main\">");
    for i in 0..paragraphs {
        html.push_str(&format!(
            "<div class=\"item\" data-x=\"{i}\"><p style=\"color: red\">Paragraph {i}</p><span></span><!-- c{i} --></div>"
        ));
    }
    html.push_str("</div></body></html>");
    html
}

fn bench_clean_default(c: &mut Criterion) {
    let options = CleanOptions::default();
    c.bench_function("clean_default", |b| {
        b.iter(|| clean(black_box(SAMPLE_HTML), &options));
    });
}

fn bench_clean_by_size(c: &mut Criterion) {
    let options = CleanOptions::default();
    let mut group = c.benchmark_group("clean_by_size");
    for paragraphs in [10, 100, 1000] {
        let html = synthetic_page(paragraphs);
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &html, |b, html| {
            b.iter(|| clean(black_box(html), &options));
        });
    }
    group.finish();
}

fn bench_selector_compile(c: &mut Criterion) {
    c.bench_function("selector_compile", |b| {
        b.iter(|| selector::compile(black_box("#main .item[data-x='1'], article h1.title")));
    });
}

fn bench_queries(c: &mut Criterion) {
    let doc = parse(&synthetic_page(500)).unwrap_or_default();
    let root = doc.root();
    c.bench_function("find_all_xpath", |b| {
        b.iter(|| find_all(&doc, root, black_box("//div[@data-x='250']/p")));
    });
    c.bench_function("query_selector_all_css", |b| {
        b.iter(|| query_selector_all(&doc, root, black_box("#main .item p")));
    });
}

criterion_group!(
    benches,
    bench_clean_default,
    bench_clean_by_size,
    bench_selector_compile,
    bench_queries
);
criterion_main!(benches);
