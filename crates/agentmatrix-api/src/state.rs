use agentmatrix_core::{DataContext, FileEntityStore, MatrixError, Result, Settings};
use std::sync::Arc;
use tracing::info;

/// Shared, read-only request state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub data: Arc<DataContext<FileEntityStore>>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Loads the dataset under `settings.data.dir` and builds the matrix.
    ///
    /// Fails if any document is missing or malformed; the server should not
    /// start on a partial dataset.
    pub async fn new(settings: Arc<Settings>) -> Result<Self> {
        let root = settings.data.dir.clone();
        let data = tokio::task::spawn_blocking(move || {
            let context = DataContext::new(FileEntityStore::new(root));
            context.preload().map(|_| context)
        })
        .await
        .map_err(|e| MatrixError::Io(std::io::Error::other(e)))??;

        let matrix = data.matrix()?;
        info!(
            agents = matrix.agent_count(),
            cells = matrix.cell_count(),
            "comparison data loaded"
        );

        Ok(Self {
            data: Arc::new(data),
            settings,
        })
    }

    pub fn cache_max_age(&self) -> u32 {
        self.settings.cache.max_age_secs
    }
}
