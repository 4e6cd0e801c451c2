use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::chat::errors::Result;
use crate::storage::models::RecentEmote;
use crate::storage::RecentEmoteStore;

pub const MAX_RECENT_EMOTES: usize = 50;

pub struct StorageClient {
    pub(crate) conn: Arc<Mutex<Connection>>,
    recent_tx: watch::Sender<Vec<RecentEmote>>,
}

impl StorageClient {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(&path)?;
        info!("Opened recent emote database at {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS recent_emotes (
                name TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                used_at INTEGER NOT NULL
            )",
            [],
        )?;
        let current = select_recent(&conn)?;
        let (recent_tx, _) = watch::channel(current);
        Ok(StorageClient {
            conn: Arc::new(Mutex::new(conn)),
            recent_tx,
        })
    }

    fn insert_sync(&self, emotes: &[RecentEmote]) -> Result<Vec<RecentEmote>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare_cached("INSERT OR REPLACE INTO recent_emotes (name, url, used_at) VALUES (?1, ?2, ?3)")?;
            for emote in emotes {
                stmt.execute(params![emote.name, emote.url, emote.used_at])?;
            }
            tx.execute(
                "DELETE FROM recent_emotes WHERE name NOT IN (
                    SELECT name FROM recent_emotes ORDER BY used_at DESC, name LIMIT ?1
                )",
                params![MAX_RECENT_EMOTES as i64],
            )?;
        }
        tx.commit()?;
        select_recent(&conn)
    }
}

fn select_recent(conn: &Connection) -> Result<Vec<RecentEmote>> {
    let mut stmt = conn.prepare_cached("SELECT name, url, used_at FROM recent_emotes ORDER BY used_at DESC, name")?;
    let rows = stmt.query_map([], |row| {
        Ok(RecentEmote {
            name: row.get(0)?,
            url: row.get(1)?,
            used_at: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[async_trait]
impl RecentEmoteStore for StorageClient {
    async fn insert(&self, emotes: Vec<RecentEmote>) -> Result<()> {
        if emotes.is_empty() {
            return Ok(());
        }
        let recent = self.insert_sync(&emotes)?;
        debug!("Stored {} recent emotes, {} kept", emotes.len(), recent.len());
        self.recent_tx.send_replace(recent);
        Ok(())
    }

    fn load_recent(&self) -> WatchStream<Vec<RecentEmote>> {
        WatchStream::new(self.recent_tx.subscribe())
    }

    fn recent(&self) -> Vec<RecentEmote> {
        self.recent_tx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn insert_upserts_and_orders_newest_first() {
        let store = StorageClient::open_in_memory().unwrap();
        store
            .insert(vec![RecentEmote::new("Kappa", "k", 1), RecentEmote::new("PogChamp", "p", 1)])
            .await
            .unwrap();
        store.insert(vec![RecentEmote::new("Kappa", "k2", 5)]).await.unwrap();

        let recent = store.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0], RecentEmote::new("Kappa", "k2", 5));
        assert_eq!(recent[1].name, "PogChamp");
    }

    #[tokio::test]
    async fn keeps_only_the_newest_entries() {
        let store = StorageClient::open_in_memory().unwrap();
        let emotes = (0..MAX_RECENT_EMOTES + 10)
            .map(|i| RecentEmote::new(format!("e{}", i), "u", i as i64))
            .collect();
        store.insert(emotes).await.unwrap();

        let recent = store.recent();
        assert_eq!(recent.len(), MAX_RECENT_EMOTES);
        assert_eq!(recent[0].name, format!("e{}", MAX_RECENT_EMOTES + 9));
    }

    #[tokio::test]
    async fn load_recent_publishes_changes() {
        let store = StorageClient::open_in_memory().unwrap();
        let mut stream = store.load_recent();
        assert_eq!(stream.next().await, Some(Vec::new()));

        store.insert(vec![RecentEmote::new("Kappa", "k", 1)]).await.unwrap();
        let next = stream.next().await.unwrap();
        assert_eq!(next[0].name, "Kappa");
    }

    #[tokio::test]
    async fn persisted_rows_are_loaded_on_open() {
        let path = std::env::temp_dir().join(format!("streamchat-recent-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        {
            let store = StorageClient::new(&path).unwrap();
            store.insert(vec![RecentEmote::new("Kappa", "k", 1)]).await.unwrap();
        }
        let reopened = StorageClient::new(&path).unwrap();
        assert_eq!(reopened.recent()[0].name, "Kappa");
        let _ = std::fs::remove_file(&path);
    }
}
