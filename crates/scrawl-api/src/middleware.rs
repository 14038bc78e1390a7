use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::token::{self, Claims};

/// Extract and verify the bearer token, then attach the claims for
/// downstream handlers. Rejection stops the chain before any handler runs.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let verified = token::bearer_token(req.headers())
        .and_then(|raw| token::verify(&state.jwt_secret, raw));

    let claims = match verified {
        Ok(claims) => claims,
        Err(kind) => {
            debug!("rejected {}: {}", req.uri().path(), kind);
            return Err(ApiError::Unauthenticated);
        }
    };

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Admin gate, layered after `require_auth`. The embedded privilege flag is
/// a fast reject; a live lookup then catches tokens whose account was
/// deleted after issuance.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let account_id = match req.extensions().get::<Claims>() {
        Some(claims) if claims.privilege => claims.sub,
        Some(claims) => {
            debug!("account {} is not an admin", claims.sub);
            return Err(ApiError::Forbidden);
        }
        None => return Err(ApiError::Unauthenticated),
    };

    let db = state.clone();
    let live = tokio::task::spawn_blocking(move || db.db.get_account_by_id(account_id)).await??;

    match live {
        Some(account) if account.privilege => Ok(next.run(req).await),
        _ => {
            warn!("stale admin token for account {}", account_id);
            Err(ApiError::Forbidden)
        }
    }
}
