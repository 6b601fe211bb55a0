use std::sync::Arc;

use axum::{
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::{app::AppState, auth::AuthState, model::CurrentUser};

// Gate for the signed-in tree: nothing renders while the observer is silent,
// and the login tree is the only thing reachable without a session
pub async fn mw_require_auth<B>(
    State(app): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, StatusCode> {
    match app.auth_state() {
        AuthState::Loading => Err(StatusCode::SERVICE_UNAVAILABLE),
        AuthState::Unauthenticated => Err(StatusCode::UNAUTHORIZED),
        AuthState::Authenticated(session) => {
            request.extensions_mut().insert(CurrentUser { session });
            Ok(next.run(request).await)
        }
    }
}
