use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/entries", entry_routes())
        .nest("/admin/entries", admin_entry_routes(config))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn entry_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::entry::list_entries))
        .routes(routes!(handlers::entry::get_entry))
}

fn admin_entry_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::admin::list_dashboard,
            handlers::admin::create_entry
        ))
        .routes(routes!(
            handlers::admin::update_entry,
            handlers::admin::delete_entry
        ))
        .layer(handlers::admin::entry_upload_body_limit(config))
}
