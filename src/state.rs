//! Shared application state for the bundled routes.

use crate::scope::Waypoint;
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub waypoint: Waypoint,
}

impl FromRef<AppState> for Waypoint {
    fn from_ref(state: &AppState) -> Self {
        state.waypoint.clone()
    }
}
