/// Viewer state machine with stale-load suppression
use crate::error::LoadError;
use crate::loader::LoadedModel;

/// Identifies one load attempt. Only the most recent token may change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadPhase {
    Resolving,
    Decoding,
    Normalizing,
}

impl LoadPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::Decoding => "decoding",
            Self::Normalizing => "normalizing",
        }
    }
}

#[derive(Debug)]
pub enum LoadEvent {
    Phase(LoadPhase),
    Finished(Result<LoadedModel, LoadError>),
}

/// Progress report from a running load, tagged with its token
#[derive(Debug)]
pub struct LoadUpdate {
    pub token: LoadToken,
    pub event: LoadEvent,
}

impl LoadUpdate {
    pub fn phase(token: LoadToken, phase: LoadPhase) -> Self {
        Self {
            token,
            event: LoadEvent::Phase(phase),
        }
    }

    pub fn finished(token: LoadToken, result: Result<LoadedModel, LoadError>) -> Self {
        Self {
            token,
            event: LoadEvent::Finished(result),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewerState {
    #[default]
    Idle,
    Resolving,
    Decoding,
    Normalizing,
    Ready(LoadedModel),
    Failed(LoadError),
}

impl ViewerState {
    pub fn phase(&self) -> Option<LoadPhase> {
        match self {
            Self::Resolving => Some(LoadPhase::Resolving),
            Self::Decoding => Some(LoadPhase::Decoding),
            Self::Normalizing => Some(LoadPhase::Normalizing),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase().is_some()
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        match self {
            Self::Ready(model) => Some(model),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&LoadError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    fn from_phase(phase: LoadPhase) -> Self {
        match phase {
            LoadPhase::Resolving => Self::Resolving,
            LoadPhase::Decoding => Self::Decoding,
            LoadPhase::Normalizing => Self::Normalizing,
        }
    }

    /// Phases only move forward, and only an in-flight load can settle
    fn advance(self, event: LoadEvent) -> Self {
        let Some(current) = self.phase() else {
            return self;
        };
        match event {
            LoadEvent::Phase(next) if next > current => Self::from_phase(next),
            LoadEvent::Phase(_) => self,
            LoadEvent::Finished(Ok(model)) => Self::Ready(model),
            LoadEvent::Finished(Err(err)) => Self::Failed(err),
        }
    }
}

/// Owns the current state and the generation counter that decides which
/// load is allowed to touch it.
#[derive(Debug, Default)]
pub struct Viewer {
    generation: u64,
    state: ViewerState,
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn model_mut(&mut self) -> Option<&mut LoadedModel> {
        match &mut self.state {
            ViewerState::Ready(model) => Some(model),
            _ => None,
        }
    }

    /// Start a new load. Every earlier token becomes stale.
    pub fn begin_load(&mut self) -> LoadToken {
        self.generation += 1;
        self.state = ViewerState::Resolving;
        LoadToken(self.generation)
    }

    /// Back to idle. Loads still in flight are ignored from now on.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.state = ViewerState::Idle;
    }

    pub fn is_current(&self, token: LoadToken) -> bool {
        token.0 == self.generation
    }

    /// Apply an update. Returns false when it came from a superseded load
    /// and was dropped.
    pub fn apply(&mut self, update: LoadUpdate) -> bool {
        if !self.is_current(update.token) {
            return false;
        }
        let state = std::mem::take(&mut self.state);
        self.state = state.advance(update.event);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exhibilo_core::{normalize, DecodedAsset, Mesh, ModelFormat, ModelMesh, Material, SceneNode};

    fn model(name: &str) -> LoadedModel {
        let root = SceneNode::new(None).with_mesh(ModelMesh::new(Mesh::cube(4.0), Material::default()));
        let mut asset = DecodedAsset::new(ModelFormat::Stl, root);
        let normalization = normalize(&mut asset);
        LoadedModel {
            name: name.to_owned(),
            asset,
            normalization,
        }
    }

    #[test]
    fn test_phases_advance_to_ready() {
        let mut viewer = Viewer::new();
        assert_eq!(viewer.state(), &ViewerState::Idle);

        let token = viewer.begin_load();
        assert_eq!(viewer.state(), &ViewerState::Resolving);
        assert!(viewer.apply(LoadUpdate::phase(token, LoadPhase::Decoding)));
        assert_eq!(viewer.state().phase(), Some(LoadPhase::Decoding));
        assert!(viewer.apply(LoadUpdate::phase(token, LoadPhase::Normalizing)));
        assert!(viewer.apply(LoadUpdate::finished(token, Ok(model("a.stl")))));

        assert_eq!(viewer.state().model().map(|m| m.name.as_str()), Some("a.stl"));
        assert!(!viewer.state().is_loading());
    }

    #[test]
    fn test_phases_never_move_backwards() {
        let mut viewer = Viewer::new();
        let token = viewer.begin_load();
        viewer.apply(LoadUpdate::phase(token, LoadPhase::Normalizing));
        viewer.apply(LoadUpdate::phase(token, LoadPhase::Decoding));
        assert_eq!(viewer.state(), &ViewerState::Normalizing);
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut viewer = Viewer::new();
        let first = viewer.begin_load();
        let second = viewer.begin_load();

        assert!(viewer.apply(LoadUpdate::finished(second, Ok(model("b.glb")))));
        assert!(!viewer.apply(LoadUpdate::finished(first, Ok(model("a.stl")))));
        assert!(!viewer.apply(LoadUpdate::phase(first, LoadPhase::Decoding)));

        assert_eq!(viewer.state().model().map(|m| m.name.as_str()), Some("b.glb"));
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut viewer = Viewer::new();
        let token = viewer.begin_load();
        let err = LoadError::NotFound {
            status: 404,
            url: "http://localhost/missing.glb".into(),
        };
        viewer.apply(LoadUpdate::finished(token, Err(err.clone())));
        assert_eq!(viewer.state().error(), Some(&err));

        // late phase reports from the same token cannot revive it
        viewer.apply(LoadUpdate::phase(token, LoadPhase::Normalizing));
        assert_eq!(viewer.state().error(), Some(&err));
    }

    #[test]
    fn test_clear_invalidates_in_flight_load() {
        let mut viewer = Viewer::new();
        let token = viewer.begin_load();
        viewer.clear();
        assert!(!viewer.apply(LoadUpdate::finished(token, Ok(model("a.stl")))));
        assert_eq!(viewer.state(), &ViewerState::Idle);
    }
}
