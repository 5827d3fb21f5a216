//! Reads HTML from stdin, cleans it with default options and prints JSON.
//!
//! Flags:
//! - `--beautify`: indented HTML instead of one compressed line
//! - `--outline`: print the structural outline of the cleaned document
//!
//! Set `RUST_LOG=debug` to see pipeline diagnostics on stderr.

use html_scrub::{clean_document, query, to_html_string, CleanOptions};
use serde::Serialize;
use std::io::{self, Read};

#[derive(Serialize)]
struct Output {
    html: String,
    text: String,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let beautify = args.iter().any(|a| a == "--beautify");
    let outline = args.iter().any(|a| a == "--outline");

    let mut html = String::new();
    if io::stdin().read_to_string(&mut html).is_err() {
        eprintln!("Failed to read from stdin");
        std::process::exit(1);
    }

    let options = CleanOptions {
        compress_whitespace: !beautify,
        ..CleanOptions::default()
    };

    let doc = match clean_document(&html, &options) {
        Ok(doc) => doc,
        Err(err) => {
            log::error!("{err}");
            println!("{}", serde_json::json!({ "html": "", "text": "" }));
            std::process::exit(1);
        }
    };

    let json = if outline {
        serde_json::to_string_pretty(&query::outline(&doc, doc.root()))
    } else {
        let root = doc.root();
        serde_json::to_string(&Output {
            html: to_html_string(&doc, root, options.compress_whitespace),
            text: doc.text_content(root).split_whitespace().collect::<Vec<_>>().join(" "),
        })
    };
    println!("{}", json.unwrap_or_default());
}
