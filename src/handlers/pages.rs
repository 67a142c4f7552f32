use axum::Json;

use crate::models::StaticPage;

/// about
#[utoipa::path(
    get,
    path = "/pages/about",
    responses((status = 200, description = "About the project", body = StaticPage))
)]
pub async fn about() -> Json<StaticPage> {
    Json(StaticPage {
        title: "About".to_string(),
        body: "Blogicum is a small blogging platform: write posts, file them under \
               categories and places, schedule them for later and discuss them in the comments."
            .to_string(),
    })
}

/// rules
#[utoipa::path(
    get,
    path = "/pages/rules",
    responses((status = 200, description = "Community rules", body = StaticPage))
)]
pub async fn rules() -> Json<StaticPage> {
    Json(StaticPage {
        title: "Rules".to_string(),
        body: "Be polite. Post only what you have the right to publish. Staff may edit or \
               remove posts and comments that break these rules."
            .to_string(),
    })
}
