use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{annotations, assets, files, upload};
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let uploads = OpenApiRouter::new()
        .routes(routes!(upload::upload_model))
        .layer(upload::upload_body_limit(config.storage.max_blob_size));

    OpenApiRouter::new()
        .routes(routes!(assets::list_assets))
        .routes(routes!(assets::get_asset, assets::delete_asset))
        .routes(routes!(files::get_file))
        .routes(routes!(annotations::create_annotation))
        .routes(routes!(annotations::list_annotations))
        .merge(uploads)
}
