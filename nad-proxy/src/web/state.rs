//! Web server shared state.

use std::sync::Arc;

use crate::client::AmpClient;

/// State shared by all API handlers: the single amplifier connection.
#[derive(Clone)]
pub struct WebState {
    pub client: Arc<AmpClient>,
}

impl WebState {
    pub fn new(client: Arc<AmpClient>) -> WebState {
        WebState { client }
    }
}
