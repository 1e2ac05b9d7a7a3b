use crate::asset::{
    CompressedAsset, CompressionResponse, ImageAsset, PreviewRef, PreviewStore, SourceFile,
};
use crate::config::{ClientConfig, Parameters};
use crate::error::{Result, SessionError};
use crate::probe::probe_dimensions;
use crate::retry::RetryingService;
use crate::service::{CompressionRequest, CompressionService, HttpCompressionService};
use bytes::Bytes;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::fmt;
use std::mem;
use std::time::Duration;

/// Monotonic token attached to every selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the presentation layer renders.
///
/// A [`CompressedAsset`] only ever exists in `Ready`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Busy,
    Ready {
        original: ImageAsset,
        compressed: CompressedAsset,
    },
    Failed {
        original: ImageAsset,
        reason: String,
    },
}

impl SessionState {
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Busy)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, SessionState::Ready { .. } | SessionState::Failed { .. })
    }

    pub fn original(&self) -> Option<&ImageAsset> {
        match self {
            SessionState::Ready { original, .. } | SessionState::Failed { original, .. } => {
                Some(original)
            }
            SessionState::Idle | SessionState::Busy => None,
        }
    }

    pub fn compressed(&self) -> Option<&CompressedAsset> {
        match self {
            SessionState::Ready { compressed, .. } => Some(compressed),
            _ => None,
        }
    }
}

/// Result of a `select_file` call that got past input validation and decoding.
#[derive(Debug)]
pub enum SelectOutcome {
    /// The session is now `Ready` with this selection's data
    Ready,
    /// The session is now `Failed`; the original preview is kept
    Failed(SessionError),
    /// A newer selection took over; nothing of this one is visible
    Superseded,
}

struct Pending {
    id: RequestId,
    original: ImageAsset,
}

/// Synchronous state machine behind [`CompressionSession`].
///
/// All transitions happen here, with no IO involved, so the ordering rules
/// can be exercised directly.
#[derive(Default)]
pub struct SessionCore {
    parameters: Parameters,
    state: SessionState,
    latest_selection: u64,
    // Highest selection that reached `begin`; anything at or below it is stale
    last_begun: u64,
    pending: Option<Pending>,
    // Last settled state while a new cycle is running; dropped when it settles
    displaced: Option<SessionState>,
    previews: PreviewStore,
}

impl SessionCore {
    pub fn new(parameters: Parameters) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }

    pub fn configure(&mut self, scale_percent: i32, quality: i32) {
        self.parameters = Parameters {
            scale_percent,
            quality,
        };
    }

    pub fn parameters(&self) -> Parameters {
        self.parameters
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The state to keep showing while busy: the current one once settled,
    /// otherwise whatever the running cycle displaced.
    pub fn last_settled(&self) -> Option<&SessionState> {
        if self.state.is_settled() {
            Some(&self.state)
        } else {
            self.displaced.as_ref()
        }
    }

    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    /// Hands out the id for a new selection.
    ///
    /// The id only takes effect once the selection decodes and reaches
    /// [`begin`](Self::begin), so a file that fails to decode never
    /// displaces an earlier one.
    pub fn next_selection(&mut self) -> RequestId {
        self.latest_selection += 1;
        RequestId(self.latest_selection)
    }

    /// Moves to `Busy` for a decoded selection and builds its request.
    ///
    /// Returns `None` when a newer selection has already begun; no request
    /// is issued for a selection that is already stale.
    pub fn begin(
        &mut self,
        id: RequestId,
        file: &SourceFile,
        dimensions: (u32, u32),
    ) -> Option<CompressionRequest> {
        if id.0 <= self.last_begun {
            debug!("Selection {} of {} superseded before upload", id, file.name());
            return None;
        }
        self.last_begun = id.0;

        let preview = self.previews.register(file.bytes().clone());
        let original = ImageAsset::new(file, dimensions, preview);

        if let Some(stale) = self.pending.take() {
            debug!("Request {} superseded by {}", stale.id, id);
            self.previews.revoke(stale.original.preview);
        }

        let previous = mem::replace(&mut self.state, SessionState::Busy);
        if previous.is_settled() {
            if let Some(older) = self.displaced.replace(previous) {
                self.revoke_original(&older);
            }
        }

        debug!(
            "Request {}: {} {}x{} ({:.2} KiB), scale={} quality={}",
            id,
            original.name,
            original.width,
            original.height,
            original.size_kib,
            self.parameters.scale_percent,
            self.parameters.quality
        );
        self.pending = Some(Pending { id, original });

        Some(CompressionRequest::new(file.clone(), self.parameters))
    }

    /// Applies the service outcome for `id`, unless a newer request was
    /// issued in the meantime.
    pub fn complete(
        &mut self,
        id: RequestId,
        result: Result<CompressionResponse>,
    ) -> SelectOutcome {
        let pending = match self.pending.take() {
            Some(pending) if pending.id == id => pending,
            other => {
                self.pending = other;
                debug!("Discarding response for superseded request {}", id);
                return SelectOutcome::Superseded;
            }
        };

        if let Some(displaced) = self.displaced.take() {
            self.revoke_original(&displaced);
        }

        match result {
            Ok(response) => {
                let compressed = CompressedAsset::from(response);
                info!(
                    "Request {}: {} compressed to {:.2} KiB ({}x{})",
                    id, pending.original.name, compressed.size_kib, compressed.width, compressed.height
                );
                self.state = SessionState::Ready {
                    original: pending.original,
                    compressed,
                };
                SelectOutcome::Ready
            }
            Err(e) => {
                warn!("Request {}: upload of {} failed: {}", id, pending.original.name, e);
                self.state = SessionState::Failed {
                    original: pending.original,
                    reason: e.to_string(),
                };
                SelectOutcome::Failed(e)
            }
        }
    }

    /// Returns to `Idle` and releases every preview.
    ///
    /// Requests still in flight are treated as superseded.
    pub fn reset(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.previews.revoke(pending.original.preview);
        }
        if let Some(displaced) = self.displaced.take() {
            self.revoke_original(&displaced);
        }
        let state = mem::take(&mut self.state);
        self.revoke_original(&state);
        self.last_begun = self.latest_selection;
    }

    fn revoke_original(&self, state: &SessionState) {
        if let Some(original) = state.original() {
            self.previews.revoke(original.preview);
        }
    }
}

/// Drives one image at a time from selection to a rendered comparison.
pub struct CompressionSession<S> {
    service: S,
    core: Mutex<SessionCore>,
    response_deadline: Duration,
}

impl CompressionSession<RetryingService<HttpCompressionService>> {
    /// Session against the HTTP compression service described by `config`.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let service = RetryingService::new(
            HttpCompressionService::new(config)?,
            config.retry_policy.clone(),
        );
        Ok(Self::new(service, config))
    }
}

impl<S: CompressionService> CompressionSession<S> {
    pub fn new(service: S, config: &ClientConfig) -> Self {
        Self {
            service,
            core: Mutex::new(SessionCore::new(config.defaults)),
            response_deadline: config.response_deadline,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Sets the parameters for the next selection. Requests already issued
    /// keep the values they were built with.
    pub fn configure(&self, scale_percent: i32, quality: i32) {
        self.core.lock().configure(scale_percent, quality);
    }

    pub fn parameters(&self) -> Parameters {
        self.core.lock().parameters()
    }

    pub fn state(&self) -> SessionState {
        self.core.lock().state().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.core.lock().state().is_busy()
    }

    pub fn last_settled(&self) -> Option<SessionState> {
        self.core.lock().last_settled().cloned()
    }

    pub fn preview(&self, preview: PreviewRef) -> Option<Bytes> {
        self.core.lock().previews().resolve(preview)
    }

    pub fn live_previews(&self) -> usize {
        self.core.lock().previews().live_count()
    }

    pub fn reset(&self) {
        self.core.lock().reset();
    }

    /// Decodes, uploads and records the result for `file`.
    ///
    /// # Errors
    /// * `SessionError::NoFileSelected` when `file` is `None`
    /// * `SessionError::Decode` when the dimensions cannot be read
    ///
    /// Both leave the session untouched. Service and transport failures are
    /// not errors here: they land in `SessionState::Failed` and are returned
    /// through [`SelectOutcome::Failed`].
    pub async fn select_file(&self, file: Option<SourceFile>) -> Result<SelectOutcome> {
        let file = file.ok_or(SessionError::NoFileSelected)?;
        let id = self.core.lock().next_selection();

        let dimensions = match probe_dimensions(file.clone()).await {
            Ok(dimensions) => dimensions,
            Err(e) => {
                warn!("Selection {} ignored: {}", id, e);
                return Err(e);
            }
        };

        let request = self.core.lock().begin(id, &file, dimensions);
        let Some(request) = request else {
            return Ok(SelectOutcome::Superseded);
        };

        let result = tokio::time::timeout(self.response_deadline, self.service.compress(request))
            .await
            .unwrap_or_else(|_| Err(SessionError::Timeout(self.response_deadline)));

        Ok(self.core.lock().complete(id, result))
    }
}

impl<S> fmt::Debug for CompressionSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.lock();
        f.debug_struct("CompressionSession")
            .field("state", core.state())
            .field("parameters", &core.parameters())
            .finish()
    }
}
