//! Walks a visitor through two page loads against a SQLite-backed store.
//!
//! Run with `RUST_LOG=debug cargo run --example headless_page`.

use std::sync::Arc;

use anyhow::Result;
use consent_manager::consent::{Category, ConsentManager, ConsentRecord, ScriptLoader};
use consent_manager::page::HeadlessPage;
use consent_manager::storage::{LocalStore, SqliteLocalStore};

struct PrintLoader {
    category: Category,
    name: &'static str,
}

impl ScriptLoader for PrintLoader {
    fn category(&self) -> Category {
        self.category
    }

    fn name(&self) -> &str {
        self.name
    }

    fn load(&self, _record: &ConsentRecord) -> Result<()> {
        println!("  <script src=\"https://cdn.example/{}.js\"> injected", self.name);
        Ok(())
    }
}

fn boot(store: &dyn LocalStore, origin: &url::Origin) -> Result<(Arc<HeadlessPage>, Arc<ConsentManager>)> {
    let page = Arc::new(HeadlessPage::with_stock_banner());
    let manager = ConsentManager::builder(store.area(origin)?, page.clone())
        .loader(Arc::new(PrintLoader { category: Category::Analytics, name: "analytics" }))
        .loader(Arc::new(PrintLoader { category: Category::Marketing, name: "pixel" }))
        .build()?;
    Ok((page, manager))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let dir = tempfile::tempdir()?;
    let db = dir.path().join("local.db");
    let store = SqliteLocalStore::new(&db.to_string_lossy())?;
    let origin = url::Url::parse("https://www.example.com/")?.origin();

    println!("First visit");
    let (page, manager) = boot(&store, &origin)?;
    let mut sub = manager.subscribe();
    let listener = tokio::spawn(async move {
        if let Ok(ev) = sub.recv().await {
            println!("  listener saw '{}' with {:?}", ev.action, ev.consent);
        }
    });

    println!("  banner state: {:?}", manager.init());
    page.activate(&manager.config().accept_id);
    listener.await?;
    for (name, detail) in page.dispatched_events() {
        println!("  page event {name}: {detail}");
    }

    println!("Second visit");
    let (_page, manager) = boot(&store, &origin)?;
    println!("  banner state: {:?}", manager.init());
    println!("  marketing allowed: {}", manager.has_consent("marketing"));

    println!("Visitor resets their choice");
    manager.reset_consent()?;
    let (_page, manager) = boot(&store, &origin)?;
    println!("  banner state: {:?}", manager.init());

    Ok(())
}
