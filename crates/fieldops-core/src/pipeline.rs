// ── Sales pipeline board ──
//
// `Board` is a pure reducer over `{ stage → ordered card ids }`. `Pipeline`
// wraps it with a data source: every accepted move is persisted as a
// `StageChange`, and a failed persist puts the card back.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{Entity, ListQuery, PageSpec};
use crate::source::DataSource;

/// Page size used when loading the whole pipeline.
const LOAD_PAGE_SIZE: u32 = 100;

/// Persist command produced by an accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageChange {
    pub id: String,
    pub from: String,
    pub to: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Board {
    stages: IndexMap<String, Vec<String>>,
}

impl Board {
    /// Empty columns for `stages`, in order.
    pub fn new(stages: &[&str]) -> Self {
        Self {
            stages: stages.iter().map(|s| ((*s).to_owned(), Vec::new())).collect(),
        }
    }

    /// Group `entities` by `stage_field`. Unknown or missing stages land in
    /// the first column.
    pub fn from_entities(stages: &[&str], entities: &[Entity], stage_field: &str) -> Self {
        let mut board = Self::new(stages);
        for entity in entities {
            let Some(id) = entity.id() else { continue };
            let stage = entity
                .status(stage_field)
                .filter(|s| board.stages.contains_key(s))
                .or_else(|| stages.first().map(|s| (*s).to_owned()));
            if let Some(cards) = stage.and_then(|s| board.stages.get_mut(&s)) {
                cards.push(id);
            }
        }
        board
    }

    pub fn stages(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.stages.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn cards(&self, stage: &str) -> Option<&[String]> {
        self.stages.get(stage).map(Vec::as_slice)
    }

    /// Stage and index of `card`.
    pub fn locate(&self, card: &str) -> Option<(&str, usize)> {
        self.stages.iter().find_map(|(stage, cards)| {
            cards
                .iter()
                .position(|c| c == card)
                .map(|i| (stage.as_str(), i))
        })
    }

    /// Stage `offset` columns away from `stage`, if any.
    pub fn neighbor(&self, stage: &str, offset: isize) -> Option<&str> {
        let index = self.stages.get_index_of(stage)?;
        let target = index.checked_add_signed(offset)?;
        self.stages.get_index(target).map(|(k, _)| k.as_str())
    }

    fn ensure_stage(&self, stage: &str) -> Result<(), CoreError> {
        if self.stages.contains_key(stage) {
            Ok(())
        } else {
            Err(CoreError::UnknownStage {
                stage: stage.to_owned(),
            })
        }
    }

    /// Move `card` from `from` to `to` at `index` (clamped).
    ///
    /// Returns `None` when the card already sits at the requested spot, so
    /// replaying a move is harmless.
    pub fn move_card(
        &mut self,
        card: &str,
        from: &str,
        to: &str,
        index: usize,
    ) -> Result<Option<StageChange>, CoreError> {
        self.ensure_stage(from)?;
        self.ensure_stage(to)?;

        let current = self.locate(card).map(|(s, i)| (s.to_owned(), i));
        if let Some((stage, position)) = &current {
            if stage == to {
                let len = self.stages.get(to).map_or(0, Vec::len);
                if *position == index.min(len.saturating_sub(1)) {
                    return Ok(None);
                }
            }
        }

        let position = match current {
            Some((stage, position)) if stage == from => position,
            _ => {
                return Err(CoreError::CardNotInStage {
                    card: card.to_owned(),
                    stage: from.to_owned(),
                });
            }
        };

        let removed = self
            .stages
            .get_mut(from)
            .map(|cards| cards.remove(position))
            .ok_or_else(|| CoreError::Internal(format!("stage '{from}' vanished")))?;
        let target = self
            .stages
            .get_mut(to)
            .ok_or_else(|| CoreError::Internal(format!("stage '{to}' vanished")))?;
        let index = index.min(target.len());
        target.insert(index, removed);

        Ok(Some(StageChange {
            id: card.to_owned(),
            from: from.to_owned(),
            to: to.to_owned(),
            position: index,
        }))
    }
}

/// A board bound to its data source.
pub struct Pipeline {
    spec: &'static PageSpec,
    stages: &'static [&'static str],
    source: Arc<dyn DataSource>,
    board: Board,
    cards: HashMap<String, Entity>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("page", &self.spec.id)
            .field("board", &self.board)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(
        spec: &'static PageSpec,
        stages: &'static [&'static str],
        source: Arc<dyn DataSource>,
    ) -> Self {
        Self {
            spec,
            stages,
            source,
            board: Board::new(stages),
            cards: HashMap::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn card(&self, id: &str) -> Option<&Entity> {
        self.cards.get(id)
    }

    /// Fetch every opportunity, page by page, and rebuild the board.
    pub async fn load(&mut self) -> Result<usize, CoreError> {
        let mut query = ListQuery::new(LOAD_PAGE_SIZE);
        let mut entities = Vec::new();
        loop {
            let page = self.source.list(&query).await?;
            let pages = page.pagination.pages;
            entities.extend(page.data);
            if query.page >= pages {
                break;
            }
            query.page += 1;
        }

        self.board = Board::from_entities(self.stages, &entities, self.spec.status_field);
        self.cards = entities
            .into_iter()
            .filter_map(|e| e.id().map(|id| (id, e)))
            .collect();
        info!(cards = self.cards.len(), "pipeline loaded");
        Ok(self.cards.len())
    }

    /// Move a card and persist the change. The board is restored if the
    /// update fails.
    pub async fn move_card(
        &mut self,
        card: &str,
        from: &str,
        to: &str,
        index: usize,
    ) -> Result<Option<StageChange>, CoreError> {
        let before = self.board.clone();
        let Some(change) = self.board.move_card(card, from, to, index)? else {
            debug!(card, to, "move is a no-op");
            return Ok(None);
        };

        let body = json!({
            self.spec.status_field: change.to.as_str(),
            "position": change.position,
        });
        match self.source.update(&change.id, &body).await {
            Ok(updated) => {
                self.cards.insert(change.id.clone(), updated);
                info!(card, from, to, "stage changed");
                Ok(Some(change))
            }
            Err(e) => {
                warn!(card, from, to, error = %e, "stage change failed, reverting");
                self.board = before;
                Err(e)
            }
        }
    }

    /// Move a card one column left (`-1`) or right (`1`), appending it.
    pub async fn shift_card(
        &mut self,
        card: &str,
        offset: isize,
    ) -> Result<Option<StageChange>, CoreError> {
        let Some((from, _)) = self.board.locate(card) else {
            return Err(CoreError::NotFound {
                entity_type: self.spec.noun.to_owned(),
                identifier: card.to_owned(),
            });
        };
        let from = from.to_owned();
        let Some(to) = self.board.neighbor(&from, offset).map(str::to_owned) else {
            return Ok(None);
        };
        let index = self.board.cards(&to).map_or(0, <[String]>::len);
        self.move_card(card, &from, &to, index).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const STAGES: &[&str] = &["lead", "qualified", "won"];

    fn board() -> Board {
        let entities: Vec<Entity> = [
            json!({ "id": 1, "stage": "lead" }),
            json!({ "id": 2, "stage": "lead" }),
            json!({ "id": 3, "stage": "Qualified" }),
            json!({ "id": 4, "stage": "mystery" }),
        ]
        .into_iter()
        .map(|v| Entity::try_from(v).unwrap())
        .collect();
        Board::from_entities(STAGES, &entities, "stage")
    }

    #[test]
    fn groups_by_stage_with_fallback() {
        let b = board();
        assert_eq!(b.cards("lead").unwrap(), ["1", "2", "4"]);
        assert_eq!(b.cards("qualified").unwrap(), ["3"]);
        assert!(b.cards("won").unwrap().is_empty());
    }

    #[test]
    fn move_is_idempotent() {
        let mut b = board();
        let change = b.move_card("2", "lead", "qualified", 0).unwrap().unwrap();
        assert_eq!(change.position, 0);
        let after = b.clone();

        assert_eq!(b.move_card("2", "lead", "qualified", 0).unwrap(), None);
        assert_eq!(b, after);
        assert_eq!(b.cards("qualified").unwrap(), ["2", "3"]);
    }

    #[test]
    fn index_is_clamped() {
        let mut b = board();
        let change = b.move_card("1", "lead", "won", 99).unwrap().unwrap();
        assert_eq!(change.position, 0);
        assert_eq!(b.locate("1"), Some(("won", 0)));
    }

    #[test]
    fn reorders_within_a_stage() {
        let mut b = board();
        b.move_card("1", "lead", "lead", 5).unwrap().unwrap();
        assert_eq!(b.cards("lead").unwrap(), ["2", "4", "1"]);
        assert_eq!(b.move_card("1", "lead", "lead", 5).unwrap(), None);
    }

    #[test]
    fn rejects_bad_moves() {
        let mut b = board();
        assert!(matches!(
            b.move_card("1", "lead", "lost", 0),
            Err(CoreError::UnknownStage { .. })
        ));
        assert!(matches!(
            b.move_card("3", "lead", "won", 0),
            Err(CoreError::CardNotInStage { .. })
        ));
    }

    #[test]
    fn neighbors_stop_at_the_edges() {
        let b = board();
        assert_eq!(b.neighbor("lead", 1), Some("qualified"));
        assert_eq!(b.neighbor("lead", -1), None);
        assert_eq!(b.neighbor("won", 1), None);
    }
}
