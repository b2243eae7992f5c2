//! Page helpers example - a small page, a few edits, a debounced handler

use helpers::{
    add_class, debounce, get_absolute_url, insert_after, query, select, serialize, Document,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let location = "https://example.com/search?q=rust&page=2";
    let mut doc = Document::with_url(location)?;

    let page = query("page", location).unwrap_or("1");
    println!("Current page: {}", page);

    let next = serde_json::json!({ "q": query("q", location), "page": 3 });
    println!("Next page link: {}", get_absolute_url(&doc, &format!("?{}", serialize(&next))));

    // Build <ul id="results"><li>first</li></ul> and add a second item after it
    let body = doc.body()?.ok_or("document has no body")?;
    let list = doc.create_element("ul");
    doc.set_attribute(list, "id", "results")?;
    doc.arena_mut().append_child(body, list)?;

    let first = doc.create_element("li");
    doc.set_text_content(first, "first")?;
    doc.arena_mut().append_child(list, first)?;

    let second = doc.create_element("li");
    doc.set_text_content(second, "second")?;
    insert_after(&mut doc, second, first)?;
    add_class(&mut doc, second, ["result", "highlight"])?;

    if let Some(found) = select(&doc, "#results > li.highlight")? {
        println!("Highlighted result: {}", doc.text_content(found)?);
    }

    // Simulate a user typing: only the last keystroke reaches the handler
    let searches = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&searches);
    let on_input = debounce(
        move |text: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            println!("Searching for: {}", text);
        },
        Some(Duration::from_millis(200)),
    )?;

    for text in ["r", "ru", "rus", "rust"] {
        on_input.call(text.to_string());
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    println!("Searches run: {}", searches.load(Ordering::SeqCst));
    Ok(())
}
