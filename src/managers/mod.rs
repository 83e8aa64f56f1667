// raindrop-sync state managers
// Managers own persistent state: the append-only tracking store.

pub mod tracking_store;
