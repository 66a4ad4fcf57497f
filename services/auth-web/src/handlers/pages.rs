//! Content pages

use axum::response::Html;

use crate::extractors::{CurrentUser, MaybeUser};
use crate::views;

/// GET / - Shows the current user when signed in
pub async fn index(MaybeUser(user): MaybeUser) -> Html<String> {
    Html(views::index(user.as_ref()))
}

/// GET /account - Requires a session; anonymous visitors detour through login
pub async fn account(CurrentUser(user): CurrentUser) -> Html<String> {
    Html(views::account(&user))
}
