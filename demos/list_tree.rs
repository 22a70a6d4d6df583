//! Prints the tree of a SAI document, plus its thumbnail dimensions.
//!
//! ```text
//! cargo run --example list_tree -- painting.sai
//! ```

use sai_vfs::Document;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: list_tree <document.sai>")?;
    let doc = Document::open(&path)?;

    for entry in doc.entries()? {
        let depth = entry.path.matches('/').count();
        let indent = "  ".repeat(depth);
        if entry.is_dir {
            println!("{indent}{}/", entry.name);
        } else {
            println!("{indent}{} ({} bytes)", entry.name, entry.size.unwrap_or(0));
        }
    }

    match doc.thumbnail() {
        Ok(thumb) => println!("thumbnail: {}x{}", thumb.width, thumb.height),
        Err(e) => println!("thumbnail: {e}"),
    }
    Ok(())
}
