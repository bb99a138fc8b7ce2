mod manager;
mod state;

pub use manager::SessionManager;
pub use state::{AppState, Role, Session, SessionStore, Turn, View};
