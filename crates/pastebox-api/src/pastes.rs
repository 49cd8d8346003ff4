use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use tracing::debug;

use pastebox_core::{PasteError, PasteForm, ids};
use pastebox_types::api::{CreatePasteRequest, PasteResponse};
use pastebox_types::models::{OwnedPaste, Paste, Privacy};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::run_blocking;

pub const PASSWORD_HEADER: &str = "x-paste-password";

pub fn paste_url(id: i64) -> String {
    format!("/paste/{}", ids::encode(id))
}

fn to_response(paste: Paste, owner: Option<String>) -> PasteResponse {
    PasteResponse {
        id: ids::encode(paste.id),
        url: paste_url(paste.id),
        has_password: paste.has_password(),
        title: paste.title,
        body: paste.body,
        created: paste.created_at,
        expires: paste.expires_at,
        delete_after_read: paste.delete_after_read,
        privacy: paste.privacy,
        syntax: paste.syntax,
        owner,
    }
}

fn owned_response(owned: OwnedPaste) -> PasteResponse {
    to_response(owned.paste, owned.owner.map(|o| o.username))
}

pub async fn create_paste(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<CreatePasteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = PasteForm {
        title: req.title,
        body: req.body,
        expires: req.expires,
        delete_after_read: req.delete_after_read,
        privacy: req.privacy,
        password: req.password,
        syntax: req.syntax,
        owner_id: caller.user_id,
    };

    let paste = run_blocking(move || Ok(state.pastes.create(form)?)).await?;
    let location = paste_url(paste.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(to_response(paste, caller.username)),
    ))
}

pub async fn get_paste(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PasteResponse>, ApiError> {
    let id = ids::decode(&id)?;
    let password = headers
        .get(PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let owned = run_blocking(move || {
        // Checked before `get` so a refused read never burns the paste.
        let peeked = state.pastes.peek(id)?;
        if !caller.can_read(&peeked.paste) {
            debug!("Hiding private paste {} from {:?}", id, caller.user_id);
            return Err(PasteError::NotFound.into());
        }
        Ok(state.pastes.get(id, password.as_deref())?)
    })
    .await?;

    Ok(Json(owned_response(owned)))
}

pub async fn delete_paste(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ids::decode(&id)?;

    run_blocking(move || {
        let peeked = state.pastes.peek(id)?;
        if !caller.can_read(&peeked.paste) {
            return Err(PasteError::NotFound.into());
        }
        if !caller.can_delete(&peeked.paste) {
            return Err(ApiError::Forbidden);
        }
        Ok(state.pastes.delete(id)?)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Password protected bodies are blanked in listings.
pub async fn list_pastes(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<PasteResponse>>, ApiError> {
    let owner = caller.user_id;
    let pastes = run_blocking(move || Ok(state.pastes.list(owner)?)).await?;

    let items = pastes
        .into_iter()
        .filter(|p| caller.is_authenticated() || p.privacy == Privacy::Public)
        .map(|mut p| {
            if p.has_password() {
                p.body.clear();
            }
            to_response(p, caller.username.clone())
        })
        .collect();

    Ok(Json(items))
}
