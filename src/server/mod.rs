// HTTP server
// Maps GET paths onto queries and query results onto JSON responses
//
// Status codes:
// - 200 for every successful result, including empty lists, lists with
//   null slots and the "no grades" sentinel
// - 404 with {"message": ...} when the requested record or route is missing

use crate::query::{
    Collection, ErrorBody, Query, QueryEngine, QueryError, QueryResult, RELATIONS,
};
use crate::storage::Id;
use anyhow::Result;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;

pub type AppState = Arc<QueryEngine>;

/// Build the router over a shared engine
/// Every path also answers with a trailing slash
pub fn router(engine: AppState) -> Router {
    let mut router = Router::new();
    router = route(router, "/route", fixed(Query::Ping));
    router = route(router, "/data", fixed(Query::Dump));

    for collection in Collection::ALL {
        let list = format!("/api/{}", collection.segment());
        let item = format!("{}/:id", list);
        router = route(router, &list, fixed(Query::List(collection)));
        router = route(router, &item, by_id(move |id| Query::Get(collection, id)));
    }

    for (collection, relation, build) in RELATIONS {
        let path = format!("/api/{}/:id/{}", collection.segment(), relation);
        router = route(router, &path, by_id(build));
    }

    router.fallback(not_found).with_state(engine)
}

fn route(
    router: Router<AppState>,
    path: &str,
    method: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, method.clone())
        .route(&format!("{}/", path), method)
}

/// Bind, log the address and serve until Ctrl-C
pub async fn serve(engine: QueryEngine, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running on {}", listener.local_addr()?);

    axum::serve(listener, router(Arc::new(engine)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// A route whose query does not depend on the path
fn fixed(query: Query) -> MethodRouter<AppState> {
    get(move |State(engine): State<AppState>| async move { respond(&engine, &query) })
}

/// A route whose query takes the `:id` path segment
///
/// An id that does not percent-decode to UTF-8 is looked up as its raw
/// segment, which matches no record, so it gets the same answer as any
/// other unknown id.
fn by_id<F>(build: F) -> MethodRouter<AppState>
where
    F: Fn(Id) -> Query + Clone + Send + Sync + 'static,
{
    get(
        move |State(engine): State<AppState>,
              uri: Uri,
              id: Result<Path<String>, PathRejection>| async move {
            let id = match id {
                Ok(Path(id)) => id,
                Err(rejection) => {
                    tracing::debug!(%rejection, "undecodable id, using raw segment");
                    raw_id(&uri).to_string()
                }
            };
            respond(&engine, &build(Id::from(id)))
        },
    )
}

/// The still-encoded id segment of `/api/{collection}/{id}[/...]`
fn raw_id(uri: &Uri) -> &str {
    uri.path().split('/').nth(3).unwrap_or_default()
}

async fn not_found(uri: Uri) -> Response {
    QueryError::UnknownRoute(uri.path().to_string()).into_response()
}

/// Execute a query and render whatever it produced
pub fn respond(engine: &QueryEngine, query: &Query) -> Response {
    tracing::debug!(?query, "executing query");
    match engine.execute(query) {
        Ok(QueryResult::Text(text)) => text.into_response(),
        Ok(result) => Json(result).into_response(),
        Err(err) => err.into_response(),
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = match &self {
            QueryError::NotFound { .. }
            | QueryError::BadJoin { .. }
            | QueryError::UnknownRoute(_) => StatusCode::NOT_FOUND,
        };
        tracing::debug!(error = %self, status = status.as_u16(), "query failed");
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}
