use crate::events::GameEvent;
use crate::game::Game;
use crate::types::GameId;
use chrono::{DateTime, Utc};
use fivecard_core::storage::Storage;
use fivecard_core::Result;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// An event as appended to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub created_at: DateTime<Utc>,
    pub event: GameEvent,
}

/// Games and the event log, in the ledger database.
pub struct GameStore<'a> {
    storage: &'a Storage,
}

impl<'a> GameStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn load_games(&self) -> Result<Vec<Game>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare("SELECT record FROM games ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut games = Vec::new();
        for record in rows {
            games.push(serde_json::from_str(&record?)?);
        }
        Ok(games)
    }

    /// Events in append order, optionally for one game only.
    pub async fn load_events(&self, game: Option<GameId>) -> Result<Vec<EventRecord>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT seq, payload, created_at FROM events
             WHERE ?1 IS NULL OR game_id = ?1
             ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![game.map(|g| g.get() as i64)], |row| {
            let seq: i64 = row.get(0)?;
            let payload: String = row.get(1)?;
            let created_at: i64 = row.get(2)?;
            Ok((seq, payload, created_at))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (seq, payload, created_at) = row?;
            events.push(EventRecord {
                seq: seq as u64,
                created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
                event: serde_json::from_str(&payload)?,
            });
        }
        Ok(events)
    }

    pub fn save_game(conn: &Connection, game: &Game) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO games (id, status, player1, player2, record, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                game.id().get() as i64,
                game.status().ordinal(),
                game.player1().as_str(),
                game.player2().map(|p| p.as_str()),
                serde_json::to_string(game)?,
                Utc::now().timestamp(),
            ],
        )?;
        Ok(())
    }

    pub fn append_event(conn: &Connection, event: &GameEvent) -> Result<u64> {
        conn.execute(
            "INSERT INTO events (game_id, kind, payload, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                event.game().get() as i64,
                event.kind(),
                serde_json::to_string(event)?,
                Utc::now().timestamp(),
            ],
        )?;
        Ok(conn.last_insert_rowid() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::GameRegistry;
    use crate::test_support::player;
    use crate::types::STAKE;
    use fivecard_core::Network;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_games_and_events_round_trip() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(&dir.path().join("ledger.db")).await.unwrap();
        let alice = player(1).address();
        let bob = player(2).address();

        let mut registry = GameRegistry::new(Network::Regtest);
        let mut receipts = vec![registry.create_game(&alice, STAKE, &[1; 32]).unwrap()];
        receipts.push(registry.create_game(&bob, STAKE, &[2; 32]).unwrap());
        receipts.push(registry.join_game(&bob, GameId::new(1), STAKE).unwrap());

        let games: Vec<Game> = registry
            .list_games(&crate::registry::GameFilter::All)
            .into_iter()
            .cloned()
            .collect();
        storage
            .transaction(|tx| {
                for game in &games {
                    GameStore::save_game(tx, game)?;
                }
                for receipt in &receipts {
                    for event in &receipt.events {
                        GameStore::append_event(tx, event)?;
                    }
                }
                Ok(())
            })
            .await
            .unwrap();

        let store = GameStore::new(&storage);
        assert_eq!(store.load_games().await.unwrap(), games);

        let all = store.load_events(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].seq < w[1].seq));

        let first: Vec<&str> = store
            .load_events(Some(GameId::new(1)))
            .await
            .unwrap()
            .iter()
            .map(|r| r.event.kind())
            .collect();
        assert_eq!(first, vec!["GameCreated", "GameJoined"]);
    }
}
