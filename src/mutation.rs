//! Request → success/failure lifecycle around every board change.
//!
//! A request computes the next board and marks the controller as saving but
//! leaves the visible board alone. The command is applied only once the
//! storage backend confirms the write, so the in-memory board never shows an
//! unconfirmed change.
//!
//! `is_saving` is advisory. It does not queue or reject overlapping requests:
//! two requests issued back to back are both computed against the board as it
//! stood when each was made, and complete in whatever order storage answers.

use crate::domain::{
    drag, filter_tasks, Board, BoardCommand, BoardStats, DragResult, SearchSummary, Section,
    SectionId, Task, TaskId, TaskPatch,
};
use crate::error::{Result, TaskflowError};
use crate::storage::Storage;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A requested change waiting on storage
#[derive(Debug, Clone)]
pub struct PendingMutation {
    id: u64,
    command: BoardCommand,
    snapshot: Board,
}

impl PendingMutation {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn command(&self) -> &BoardCommand {
        &self.command
    }

    /// The board as it will look after this command, handed to storage
    pub fn snapshot(&self) -> &Board {
        &self.snapshot
    }
}

/// Owns the board and coordinates it with the storage backend
pub struct BoardController {
    board: Board,
    storage: Arc<dyn Storage>,
    is_saving: bool,
    is_loading: bool,
    error: Option<String>,
    search_query: String,
    next_request: u64,
}

impl BoardController {
    /// Controller showing the starter board until [`load`](Self::load) runs
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_board(storage, Board::default())
    }

    pub fn with_board(storage: Arc<dyn Storage>, board: Board) -> Self {
        Self {
            board,
            storage,
            is_saving: false,
            is_loading: false,
            error: None,
            search_query: String::new(),
            next_request: 1,
        }
    }

    /// Fetches the stored board and runs both load phases around it
    pub async fn load(&mut self) -> Result<()> {
        self.begin_load();
        let storage = Arc::clone(&self.storage);
        let result = storage.load_board().await;
        self.finish_load(result)
    }

    /// Load request phase: marks the controller as loading
    pub fn begin_load(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    /// Load completion phase. Installs the stored board, or the starter board
    /// if storage was empty. On failure the current board stays and the error
    /// is recorded.
    pub fn finish_load(&mut self, result: Result<Option<Board>>) -> Result<()> {
        self.is_loading = false;

        match result {
            Ok(Some(board)) => {
                info!(
                    sections = board.sections().len(),
                    tasks = board.task_count(),
                    "board loaded"
                );
                self.board = board;
                Ok(())
            }
            Ok(None) => {
                info!("no stored board, starting with defaults");
                self.board = Board::default();
                Ok(())
            }
            Err(e) => {
                warn!("failed to load board: {}", e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Request phase: validates the command against the current board and
    /// marks the controller as saving. The board itself is not changed.
    ///
    /// Invalid commands are rejected here and leave all state untouched.
    pub fn request(&mut self, command: BoardCommand) -> Result<PendingMutation> {
        let snapshot = self.board.apply(&command)?;

        let id = self.next_request;
        self.next_request += 1;
        self.is_saving = true;
        self.error = None;

        debug!(request = id, command = %command, "mutation requested");
        Ok(PendingMutation {
            id,
            command,
            snapshot,
        })
    }

    /// Success phase: applies the command to the current board.
    ///
    /// If an earlier completion changed the board so the command no longer
    /// applies, the board is left as is and the error is recorded.
    pub fn succeed(&mut self, pending: PendingMutation) -> Result<()> {
        self.is_saving = false;
        match self.board.apply(&pending.command) {
            Ok(next) => {
                debug!(request = pending.id, command = %pending.command, "mutation committed");
                self.board = next;
                Ok(())
            }
            Err(e) => {
                warn!(
                    request = pending.id,
                    "confirmed mutation no longer applies: {}", e
                );
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Failure phase: records the error; the board is not touched
    pub fn fail(&mut self, pending: PendingMutation, error: &TaskflowError) {
        warn!(request = pending.id, command = %pending.command, "mutation failed: {}", error);
        self.is_saving = false;
        self.error = Some(error.to_string());
    }

    /// Runs the full lifecycle for one command against the storage backend.
    ///
    /// Callers that render `is_saving` while the write is out drive
    /// [`request`](Self::request), [`succeed`](Self::succeed) and
    /// [`fail`](Self::fail) themselves.
    pub async fn dispatch(&mut self, command: BoardCommand) -> Result<()> {
        let pending = self.request(command)?;

        let storage = Arc::clone(&self.storage);
        match storage.save_board(pending.snapshot()).await {
            Ok(()) => self.succeed(pending),
            Err(e) => {
                let error = match e {
                    TaskflowError::Persistence(msg) => TaskflowError::Persistence(msg),
                    other => TaskflowError::Persistence(other.to_string()),
                };
                self.fail(pending, &error);
                Err(error)
            }
        }
    }

    /// Resolves a drag gesture and dispatches the resulting command.
    ///
    /// Returns `false` when the gesture was a no-op.
    pub async fn handle_drag(&mut self, drag: &DragResult) -> Result<bool> {
        match drag::resolve(&self.board, drag)? {
            Some(command) => {
                self.dispatch(command).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn add_section(&mut self, title: &str) -> Result<SectionId> {
        let id = SectionId::generate();
        self.dispatch(BoardCommand::AddSection {
            id: id.clone(),
            title: title.to_string(),
        })
        .await?;
        Ok(id)
    }

    pub async fn update_section(&mut self, id: &SectionId, title: &str) -> Result<()> {
        self.dispatch(BoardCommand::UpdateSection {
            id: id.clone(),
            title: title.to_string(),
        })
        .await
    }

    pub async fn delete_section(&mut self, id: &SectionId) -> Result<()> {
        self.dispatch(BoardCommand::DeleteSection { id: id.clone() })
            .await
    }

    pub async fn reorder_sections(&mut self, order: Vec<SectionId>) -> Result<()> {
        self.dispatch(BoardCommand::ReorderSections { order }).await
    }

    pub async fn add_task(&mut self, section_id: &SectionId, task: Task) -> Result<TaskId> {
        let id = task.id.clone();
        self.dispatch(BoardCommand::AddTask {
            section_id: section_id.clone(),
            task,
        })
        .await?;
        Ok(id)
    }

    pub async fn update_task(
        &mut self,
        section_id: &SectionId,
        task_id: &TaskId,
        patch: TaskPatch,
    ) -> Result<()> {
        self.dispatch(BoardCommand::UpdateTask {
            section_id: section_id.clone(),
            task_id: task_id.clone(),
            patch,
        })
        .await
    }

    pub async fn delete_task(&mut self, section_id: &SectionId, task_id: &TaskId) -> Result<()> {
        self.dispatch(BoardCommand::DeleteTask {
            section_id: section_id.clone(),
            task_id: task_id.clone(),
        })
        .await
    }

    pub async fn move_task(
        &mut self,
        source: &SectionId,
        dest: &SectionId,
        source_index: usize,
        dest_index: usize,
    ) -> Result<()> {
        self.dispatch(BoardCommand::MoveTask {
            source: source.clone(),
            dest: dest.clone(),
            source_index,
            dest_index,
        })
        .await
    }

    pub async fn reorder_tasks(&mut self, section_id: &SectionId, order: Vec<TaskId>) -> Result<()> {
        self.dispatch(BoardCommand::ReorderTasks {
            section_id: section_id.clone(),
            order,
        })
        .await
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Sections in display order
    pub fn sections(&self) -> Vec<&Section> {
        self.board.ordered_sections()
    }

    pub fn tasks(&self, section_id: &SectionId) -> &[Task] {
        self.board.tasks(section_id)
    }

    /// A section's tasks narrowed by the current search query
    pub fn filtered_tasks(&self, section_id: &SectionId) -> Cow<'_, [Task]> {
        filter_tasks(self.board.tasks(section_id), &self.search_query)
    }

    pub fn search_summary(&self) -> SearchSummary {
        SearchSummary::for_board(&self.board, &self.search_query)
    }

    pub fn stats(&self) -> BoardStats {
        self.board.stats()
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DropLocation;
    use crate::storage::MemoryStorage;

    fn todo() -> SectionId {
        SectionId::from("section-1")
    }

    fn doing() -> SectionId {
        SectionId::from("section-2")
    }

    fn controller() -> (Arc<MemoryStorage>, BoardController) {
        let storage = Arc::new(MemoryStorage::new());
        let controller = BoardController::new(storage.clone());
        (storage, controller)
    }

    #[tokio::test]
    async fn test_dispatch_success_commits_and_saves() {
        let (storage, mut controller) = controller();

        let id = controller.add_section("Review").await.unwrap();

        assert!(controller.board().section(&id).is_some());
        assert!(!controller.is_saving());
        assert!(controller.error().is_none());
        assert_eq!(storage.save_count(), 1);
        assert_eq!(
            storage.stored_board().unwrap().as_ref(),
            Some(controller.board())
        );
    }

    #[tokio::test]
    async fn test_dispatch_failure_leaves_board() {
        let (storage, mut controller) = controller();
        storage.fail_next_saves(1);

        let err = controller.add_section("Review").await.unwrap_err();

        assert!(matches!(err, TaskflowError::Persistence(_)));
        assert_eq!(controller.board(), &Board::default());
        assert!(!controller.is_saving());
        assert!(controller.error().unwrap().contains("simulated write failure"));
        assert_eq!(storage.save_count(), 0);
    }

    #[tokio::test]
    async fn test_next_request_clears_error() {
        let (storage, mut controller) = controller();
        storage.fail_next_saves(1);
        assert!(controller.add_section("Review").await.is_err());
        assert!(controller.error().is_some());

        controller.add_section("Review").await.unwrap();
        assert!(controller.error().is_none());
    }

    #[test]
    fn test_request_does_not_touch_board() {
        let (_storage, mut controller) = controller();

        let pending = controller
            .request(BoardCommand::add_section("Review"))
            .unwrap();

        assert!(controller.is_saving());
        assert_eq!(controller.board(), &Board::default());
        assert_eq!(pending.snapshot().sections().len(), 4);
    }

    #[test]
    fn test_contract_violation_rejected_before_request() {
        let (_storage, mut controller) = controller();

        let err = controller
            .request(BoardCommand::DeleteSection { id: "ghost".into() })
            .unwrap_err();
        assert!(err.is_contract_violation());
        assert!(!controller.is_saving());
        assert!(controller.error().is_none());

        let err = controller
            .request(BoardCommand::add_section("   "))
            .unwrap_err();
        assert!(matches!(err, TaskflowError::Validation(_)));
        assert!(controller.error().is_none());
    }

    #[test]
    fn test_overlapping_requests_are_not_serialized() {
        let (_storage, mut controller) = controller();

        let first = controller
            .request(BoardCommand::add_section("Review"))
            .unwrap();
        let second = controller
            .request(BoardCommand::add_section("Blocked"))
            .unwrap();

        controller.succeed(first).unwrap();
        // Advisory only: cleared although the second write is still out
        assert!(!controller.is_saving());

        controller.succeed(second).unwrap();
        assert_eq!(controller.board().sections().len(), 5);
    }

    #[test]
    fn test_stale_success_records_error() {
        let (_storage, mut controller) = controller();

        let delete = controller
            .request(BoardCommand::DeleteSection { id: todo() })
            .unwrap();
        let add = controller
            .request(BoardCommand::AddTask {
                section_id: todo(),
                task: Task::new("Lost"),
            })
            .unwrap();

        controller.succeed(delete).unwrap();
        let err = controller.succeed(add).unwrap_err();

        assert!(matches!(err, TaskflowError::SectionNotFound(_)));
        assert!(controller.error().is_some());
        assert!(controller.board().section(&todo()).is_none());
        assert_eq!(controller.board().task_count(), 0);
    }

    #[test]
    fn test_fail_phase() {
        let (_storage, mut controller) = controller();
        let pending = controller
            .request(BoardCommand::add_section("Review"))
            .unwrap();

        controller.fail(pending, &TaskflowError::Persistence("disk full".into()));

        assert!(!controller.is_saving());
        assert_eq!(controller.error(), Some("Persistence failure: disk full"));
        assert_eq!(controller.board(), &Board::default());
    }

    #[tokio::test]
    async fn test_load_uses_defaults_when_empty() {
        let (_storage, mut controller) = controller();
        controller.load().await.unwrap();
        assert!(!controller.is_loading());
        assert_eq!(controller.board(), &Board::default());
    }

    #[tokio::test]
    async fn test_load_phases_expose_loading_flag() {
        let board = Board::default().add_section("Review").unwrap();
        let storage = Arc::new(MemoryStorage::with_board(&board).unwrap());
        let mut controller = BoardController::new(storage.clone());

        controller.begin_load();
        assert!(controller.is_loading());
        assert_eq!(controller.board(), &Board::default());

        let loaded = storage.load_board().await;
        controller.finish_load(loaded).unwrap();
        assert!(!controller.is_loading());
        assert_eq!(controller.board(), &board);

        controller.begin_load();
        let err = controller
            .finish_load(Err(TaskflowError::StorageError("offline".into())))
            .unwrap_err();
        assert!(matches!(err, TaskflowError::StorageError(_)));
        assert!(!controller.is_loading());
        assert_eq!(controller.error(), Some("Storage error: offline"));
        assert_eq!(controller.board(), &board);
    }

    #[tokio::test]
    async fn test_load_stored_board() {
        let board = Board::default().add_section("Review").unwrap();
        let storage = Arc::new(MemoryStorage::with_board(&board).unwrap());
        let mut controller = BoardController::new(storage);

        controller.load().await.unwrap();
        assert_eq!(controller.board(), &board);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_board() {
        let (storage, mut controller) = controller();
        storage.put_raw("{ broken");

        assert!(controller.load().await.is_err());
        assert!(!controller.is_loading());
        assert!(controller.error().is_some());
        assert_eq!(controller.board(), &Board::default());
    }

    #[tokio::test]
    async fn test_task_commands() {
        let (_storage, mut controller) = controller();

        let id = controller
            .add_task(&todo(), Task::new("Draft plan"))
            .await
            .unwrap();
        controller
            .update_task(&todo(), &id, TaskPatch::description(Some("draft".into())))
            .await
            .unwrap();
        controller.move_task(&todo(), &doing(), 0, 0).await.unwrap();

        let task = &controller.tasks(&doing())[0];
        assert_eq!(task.id, id);
        assert_eq!(task.status, doing());
        assert_eq!(task.description.as_deref(), Some("draft"));

        controller.delete_task(&doing(), &id).await.unwrap();
        assert_eq!(controller.board().task_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_drag() {
        let (storage, mut controller) = controller();
        controller
            .add_task(&todo(), Task::with_id("t1".into(), "One"))
            .await
            .unwrap();
        let saves = storage.save_count();

        let noop = DragResult::task(DropLocation::new("section-1", 0), None);
        assert!(!controller.handle_drag(&noop).await.unwrap());
        assert_eq!(storage.save_count(), saves);

        let drag = DragResult::task(
            DropLocation::new("section-1", 0),
            Some(DropLocation::new("section-3", 0)),
        );
        assert!(controller.handle_drag(&drag).await.unwrap());
        assert_eq!(controller.tasks(&"section-3".into())[0].id.as_str(), "t1");
        assert_eq!(storage.save_count(), saves + 1);
    }

    #[tokio::test]
    async fn test_search_views() {
        let (_storage, mut controller) = controller();
        controller
            .add_task(&todo(), Task::new("Fix login"))
            .await
            .unwrap();
        controller
            .add_task(&todo(), Task::new("Write docs"))
            .await
            .unwrap();

        assert_eq!(controller.filtered_tasks(&todo()).len(), 2);

        controller.set_search_query("LOGIN");
        assert_eq!(controller.filtered_tasks(&todo()).len(), 1);
        let summary = controller.search_summary();
        assert_eq!((summary.matching, summary.total), (1, 2));
        // Filtering never changes the board
        assert_eq!(controller.tasks(&todo()).len(), 2);
    }

    #[tokio::test]
    async fn test_drag_survives_reload_from_disk() {
        use crate::storage::FileStorage;
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(FileStorage::new(temp_dir.path()));
        storage.initialize().await.unwrap();

        let mut controller = BoardController::new(storage.clone());
        controller.load().await.unwrap();
        let review = controller.add_section("Review").await.unwrap();
        controller
            .add_task(&todo(), Task::with_id("t1".into(), "Ship it"))
            .await
            .unwrap();

        // Drag "Review" to the front, then the task into it
        controller
            .handle_drag(&DragResult::section(3, Some(0)))
            .await
            .unwrap();
        controller
            .handle_drag(&DragResult::task(
                DropLocation::new("section-1", 0),
                Some(DropLocation::new(review.as_str(), 0)),
            ))
            .await
            .unwrap();

        let mut reloaded = BoardController::new(Arc::new(FileStorage::new(temp_dir.path())));
        reloaded.load().await.unwrap();

        assert_eq!(reloaded.board(), controller.board());
        assert_eq!(reloaded.sections()[0].id, review);
        assert_eq!(reloaded.tasks(&review)[0].status, review);
        assert_eq!(reloaded.stats().total, 1);
    }
}
