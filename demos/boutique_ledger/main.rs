//! Atelier demo - boutique ledger shared by two sessions.
//!
//! This demo walks through the synced-state core end to end:
//! - Opening collections through a provider
//! - Rapid edits collapsing into one debounced write
//! - A second session observing the first session's writes
//! - Two sessions racing on one key (last write wins)
//!
//! Run with: cargo run -p boutique_ledger

use atelier_store::{DocumentStore, MemoryStore};
use atelier_sync::{Scheduler, SyncConfig, SyncProvider, ThreadScheduler};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// A shop location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Boutique {
    id: Uuid,
    nom: String,
    lieu: String,
}

impl Boutique {
    fn new(nom: &str, lieu: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            nom: nom.to_string(),
            lieu: lieu.to_string(),
        }
    }
}

/// A client record with measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Client {
    id: Uuid,
    nom: String,
    telephone: String,
    tour_poitrine_cm: u32,
    tour_taille_cm: u32,
}

/// The demo uses a short debounce so the walkthrough stays snappy; the
/// application default is one second.
const DEBOUNCE: Duration = Duration::from_millis(200);

fn new_session(store: &Arc<MemoryStore>) -> SyncProvider {
    SyncProvider::connected(
        Arc::clone(store) as Arc<dyn DocumentStore>,
        Arc::new(ThreadScheduler::new()) as Arc<dyn Scheduler>,
        SyncConfig::new().with_debounce(DEBOUNCE),
    )
}

fn wait_for_flush() {
    std::thread::sleep(DEBOUNCE + Duration::from_millis(100));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("Boutique Ledger Example");
    println!("=======================\n");

    // One shared store stands in for the remote document database.
    let store = Arc::new(MemoryStore::new());

    // First session opens its collections.
    let atelier = new_session(&store);
    let boutiques = atelier.collection("boutiques", Vec::<Boutique>::new())?;
    let clients = atelier.collection("clients", Vec::<Client>::new())?;
    println!("[OK] Session A connected");

    // Rapid edits: both land in a single debounced write.
    println!("\n[+] Session A opens two boutiques...");
    boutiques.update(|list| list.push(Boutique::new("Atelier Centre", "Dakar")));
    boutiques.update(|list| list.push(Boutique::new("Atelier Plateau", "Thies")));
    println!("    local view: {} boutiques, store writes so far: {}",
        boutiques.get().len(),
        store.writes().len(),
    );

    wait_for_flush();
    println!("[OK] Debounce elapsed: {} write(s) reached the store", store.writes().len());

    // Register a client too.
    println!("\n[+] Session A registers a client...");
    clients.update(|list| {
        list.push(Client {
            id: Uuid::new_v4(),
            nom: "Awa Ndiaye".to_string(),
            telephone: "+221 77 000 00 00".to_string(),
            tour_poitrine_cm: 92,
            tour_taille_cm: 74,
        })
    });
    wait_for_flush();

    // A second session joins and immediately sees the synced state.
    let comptoir = new_session(&store);
    let boutiques_b = comptoir.collection("boutiques", Vec::<Boutique>::new())?;
    println!("\n[OK] Session B connected: sees {} boutiques", boutiques_b.get().len());

    // Session B's edit propagates back to session A.
    println!("\n[~] Session B opens another boutique...");
    boutiques_b.update(|list| list.push(Boutique::new("Atelier Almadies", "Dakar")));
    wait_for_flush();
    println!("[OK] Session A now sees {} boutiques", boutiques.get().len());

    // Both sessions edit inside one debounce window: last write wins.
    println!("\n[!] Both sessions edit at once...");
    boutiques.update(|list| list.retain(|b| b.lieu != "Thies"));
    boutiques_b.update(|list| list.push(Boutique::new("Atelier Ngor", "Dakar")));
    wait_for_flush();
    println!("    converged on {} boutiques in both sessions (last write wins):",
        boutiques.get().len(),
    );
    for boutique in boutiques.get() {
        println!("      - {} ({})", boutique.nom, boutique.lieu);
    }

    // Sync activity summary.
    let stats = boutiques.stats();
    println!("\n[#] Session A \"boutiques\" stats:");
    println!("    mutations:         {}", stats.mutations);
    println!("    writes issued:     {}", stats.writes_issued);
    println!("    snapshots applied: {}", stats.snapshots_applied);
    println!("    store writes held: {}", store.writes().len());

    Ok(())
}
