use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use strata_protocol::endpoints;
use strata_types::ObjectId;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with every remote endpoint.
///
/// Upload bodies larger than `max_object_size` plus the id prefix are
/// refused with 413 before reaching the handler.
pub fn build_router(state: AppState, max_object_size: u64) -> Router {
    let upload_limit = usize::try_from(max_object_size)
        .unwrap_or(usize::MAX)
        .saturating_add(ObjectId::LEN);

    Router::new()
        .route(endpoints::MANIFEST, get(handler::manifest))
        .route(endpoints::EXISTS, get(handler::exists))
        .route(
            &format!("{}/:id", endpoints::OBJECTS),
            get(handler::object),
        )
        .route(
            endpoints::SEND_OBJECT,
            post(handler::send_object).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(endpoints::BEGIN_PUSH, get(handler::begin_push))
        .route(endpoints::END_PUSH, get(handler::end_push))
        .route(endpoints::REF_PARSE, get(handler::ref_parse))
        .route(endpoints::UPDATE_REF, get(handler::update_ref))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
