use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    classifier::Classifier,
    config::Config,
    quiz::{QuestionSource, SessionStore},
};

#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub questions: Arc<dyn QuestionSource>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(
        config: &Config,
        classifier: Arc<dyn Classifier>,
        questions: Arc<dyn QuestionSource>,
    ) -> Self {
        Self {
            classifier,
            questions,
            sessions: SessionStore::new(config.session_idle_timeout),
        }
    }
}

impl FromRef<AppState> for Arc<dyn Classifier> {
    fn from_ref(state: &AppState) -> Self {
        state.classifier.clone()
    }
}

impl FromRef<AppState> for Arc<dyn QuestionSource> {
    fn from_ref(state: &AppState) -> Self {
        state.questions.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
