//! Optimistic interaction service.
//!
//! Toggles flip the displayed state immediately and then tell the backend.
//! A failed mutation reverts its own flip and schedules a background fetch
//! of authoritative state; the board converges on that fetch whatever the
//! interleaving of user clicks and responses.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::ports::{InteractionCommand, InteractionQuery};
use crate::domain::{ApiError, InteractionBoard, InteractionKind, InteractionView, ItemId};

/// Optimistic controls for one displayed collection.
pub struct OptimisticInteractions<C: ?Sized, Q: ?Sized> {
    command: Arc<C>,
    query: Arc<Q>,
    board: Arc<Mutex<InteractionBoard>>,
    reconciliations: Mutex<Vec<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Board updates replace whole entries, so a poisoned board is consistent.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<C, Q> OptimisticInteractions<C, Q>
where
    C: InteractionCommand + ?Sized,
    Q: InteractionQuery + ?Sized + 'static,
{
    /// Create a service with an empty board.
    pub fn new(command: Arc<C>, query: Arc<Q>) -> Self {
        Self {
            command,
            query,
            board: Arc::new(Mutex::new(InteractionBoard::new())),
            reconciliations: Mutex::new(Vec::new()),
        }
    }

    /// Current derived view of one control.
    pub fn view(&self, item: &ItemId, kind: InteractionKind) -> InteractionView {
        lock(&self.board).view(&(item.clone(), kind))
    }

    /// Whether authoritative state for this control has been fetched.
    pub fn tracks(&self, item: &ItemId, kind: InteractionKind) -> bool {
        lock(&self.board).state(&(item.clone(), kind)).is_some()
    }

    /// Copy of the whole board.
    pub fn board(&self) -> InteractionBoard {
        lock(&self.board).clone()
    }

    /// Replace the board with freshly fetched authoritative state.
    ///
    /// # Errors
    ///
    /// Propagates the query error; the board is left untouched.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let snapshots = self.query.snapshot().await?;
        debug!(controls = snapshots.len(), "reconciling interaction board");
        lock(&self.board).reconcile(snapshots);
        Ok(())
    }

    /// Flip one control and send the new desired state to the backend.
    ///
    /// On success the flipped state stays until the next refresh. On failure
    /// the flip is reverted, a background reconciliation is scheduled, and
    /// the mutation error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error reported by the command port.
    pub async fn toggle(
        &self,
        item: &ItemId,
        kind: InteractionKind,
    ) -> Result<InteractionView, ApiError> {
        let key = (item.clone(), kind);
        let pending = lock(&self.board).toggle(key.clone());

        match self
            .command
            .set_interaction(item, kind, pending.desired)
            .await
        {
            Ok(()) => Ok(lock(&self.board).view(&key)),
            Err(error) => {
                warn!(
                    item = %item,
                    kind = kind.path_segment(),
                    desired = pending.desired,
                    %error,
                    "interaction mutation failed; reverting"
                );
                let reverted = lock(&self.board).revert(&key, pending);
                if !reverted {
                    debug!(item = %item, "newer toggle superseded the failed one");
                }
                self.schedule_reconciliation();
                Err(error)
            }
        }
    }

    /// Wait for every scheduled background reconciliation to finish.
    pub async fn settle(&self) {
        let handles = std::mem::take(&mut *lock(&self.reconciliations));
        for handle in handles {
            if let Err(error) = handle.await {
                warn!(%error, "background reconciliation did not complete");
            }
        }
    }

    fn schedule_reconciliation(&self) {
        let query = Arc::clone(&self.query);
        let board = Arc::clone(&self.board);
        let handle = tokio::spawn(async move {
            match query.snapshot().await {
                Ok(snapshots) => lock(&board).reconcile(snapshots),
                Err(error) => warn!(%error, "background reconciliation failed"),
            }
        });
        let mut pending = lock(&self.reconciliations);
        pending.retain(|running| !running.is_finished());
        pending.push(handle);
    }
}

#[cfg(test)]
mod tests {
    //! Behavioural coverage for optimistic toggles.
    use super::*;
    use crate::domain::ports::{MockInteractionCommand, MockInteractionQuery};
    use crate::domain::{InteractionSnapshot, ServerState};
    use rstest::{fixture, rstest};

    #[fixture]
    fn post() -> ItemId {
        ItemId::new("p1").expect("valid id")
    }

    fn snapshot(item: &ItemId, kind: InteractionKind, active: bool, count: u64) -> InteractionSnapshot {
        InteractionSnapshot {
            item: item.clone(),
            kind,
            state: ServerState { active, count },
        }
    }

    fn service(
        command: MockInteractionCommand,
        query: MockInteractionQuery,
    ) -> OptimisticInteractions<MockInteractionCommand, MockInteractionQuery> {
        OptimisticInteractions::new(Arc::new(command), Arc::new(query))
    }

    fn seeded_query(item: &ItemId, active: bool, count: u64) -> MockInteractionQuery {
        let seeded = vec![snapshot(item, InteractionKind::Like, active, count)];
        let mut query = MockInteractionQuery::new();
        query
            .expect_snapshot()
            .returning(move || Ok(seeded.clone()));
        query
    }

    #[rstest]
    #[tokio::test]
    async fn successful_toggle_keeps_the_flip(post: ItemId) {
        let mut command = MockInteractionCommand::new();
        command
            .expect_set_interaction()
            .withf(|item, kind, active| {
                item.to_string() == "p1" && *kind == InteractionKind::Like && *active
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let service = service(command, seeded_query(&post, false, 3));
        service.refresh().await.expect("initial fetch");

        let view = service
            .toggle(&post, InteractionKind::Like)
            .await
            .expect("mutation succeeds");

        assert_eq!(view, InteractionView { active: true, count: 4 });
        assert_eq!(service.view(&post, InteractionKind::Like), view);
    }

    #[rstest]
    #[tokio::test]
    async fn only_fetched_controls_are_tracked(post: ItemId) {
        let service = service(MockInteractionCommand::new(), seeded_query(&post, false, 3));
        let other = ItemId::new("p2").expect("valid id");
        assert!(!service.tracks(&post, InteractionKind::Like));

        service.refresh().await.expect("initial fetch");

        assert!(service.tracks(&post, InteractionKind::Like));
        assert!(!service.tracks(&post, InteractionKind::Repost));
        assert!(!service.tracks(&other, InteractionKind::Like));
    }

    #[rstest]
    #[tokio::test]
    async fn second_toggle_sends_the_opposite_state(post: ItemId) {
        let mut command = MockInteractionCommand::new();
        let mut sequence = mockall::Sequence::new();
        command
            .expect_set_interaction()
            .withf(|_, _, active| *active)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _, _| Ok(()));
        command
            .expect_set_interaction()
            .withf(|_, _, active| !*active)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _, _| Ok(()));
        let service = service(command, seeded_query(&post, false, 3));
        service.refresh().await.expect("initial fetch");

        service.toggle(&post, InteractionKind::Like).await.expect("like");
        let view = service
            .toggle(&post, InteractionKind::Like)
            .await
            .expect("unlike");

        assert_eq!(view, InteractionView { active: false, count: 3 });
    }

    #[rstest]
    #[tokio::test]
    async fn failed_toggle_reverts_and_reconciles(post: ItemId) {
        let mut command = MockInteractionCommand::new();
        command
            .expect_set_interaction()
            .times(1)
            .returning(|_, _, _| Err(ApiError::from_status(500, "boom")));
        let mut query = MockInteractionQuery::new();
        let mut sequence = mockall::Sequence::new();
        let initial = vec![snapshot(&post, InteractionKind::Like, false, 3)];
        let reconciled = vec![snapshot(&post, InteractionKind::Like, true, 7)];
        query
            .expect_snapshot()
            .times(1)
            .in_sequence(&mut sequence)
            .return_once(move || Ok(initial));
        query
            .expect_snapshot()
            .times(1)
            .in_sequence(&mut sequence)
            .return_once(move || Ok(reconciled));
        let service = service(command, query);
        service.refresh().await.expect("initial fetch");

        let error = service
            .toggle(&post, InteractionKind::Like)
            .await
            .expect_err("mutation fails");
        assert_eq!(error.status(), Some(500));
        assert_eq!(
            service.view(&post, InteractionKind::Like),
            InteractionView { active: false, count: 3 },
            "flip is reverted before reconciliation lands"
        );

        service.settle().await;
        assert_eq!(
            service.view(&post, InteractionKind::Like),
            InteractionView { active: true, count: 7 }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn failed_reconciliation_leaves_the_reverted_board(post: ItemId) {
        let mut command = MockInteractionCommand::new();
        command
            .expect_set_interaction()
            .returning(|_, _, _| Err(ApiError::transport("offline")));
        let mut query = MockInteractionQuery::new();
        query
            .expect_snapshot()
            .returning(|| Err(ApiError::transport("offline")));
        let service = service(command, query);

        service
            .toggle(&post, InteractionKind::Repost)
            .await
            .expect_err("mutation fails");
        service.settle().await;

        assert_eq!(
            service.view(&post, InteractionKind::Repost),
            InteractionView { active: false, count: 0 }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn refresh_discards_pending_overrides(post: ItemId) {
        let mut command = MockInteractionCommand::new();
        command.expect_set_interaction().returning(|_, _, _| Ok(()));
        let service = service(command, seeded_query(&post, false, 3));
        service.refresh().await.expect("initial fetch");
        service.toggle(&post, InteractionKind::Like).await.expect("like");

        service.refresh().await.expect("second fetch");

        let board = service.board();
        let state = board
            .state(&(post.clone(), InteractionKind::Like))
            .expect("tracked");
        assert_eq!(state.local_override(), None);
        assert_eq!(
            service.view(&post, InteractionKind::Like),
            InteractionView { active: false, count: 3 }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn refresh_errors_leave_the_board_untouched(post: ItemId) {
        let mut query = MockInteractionQuery::new();
        query
            .expect_snapshot()
            .returning(|| Err(ApiError::from_status(503, "")));
        let mut command = MockInteractionCommand::new();
        command.expect_set_interaction().returning(|_, _, _| Ok(()));
        let service = service(command, query);
        service.toggle(&post, InteractionKind::Follow).await.expect("follow");

        let error = service.refresh().await.expect_err("fetch fails");

        assert_eq!(error.to_string(), "HTTP 503");
        assert!(service.view(&post, InteractionKind::Follow).active);
    }
}
