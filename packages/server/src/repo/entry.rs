use sea_orm::sea_query::{Expr, ExprTrait, Func, SimpleExpr};
use sea_orm::{
    ConnectionTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, QueryOrder, QuerySelect,
    prelude::DateTimeUtc,
};

use crate::entity::{asset, entry};

/// One page of the public feed, already clamped.
pub struct EntryPage {
    pub entries: Vec<entry::Model>,
    /// The page actually returned (requested page clamped into range).
    pub page: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// One admin-dashboard row: entry summary plus asset aggregates.
#[derive(Debug, FromQueryResult)]
pub struct DashboardRow {
    pub id: i32,
    pub entry_date: String,
    pub title: String,
    pub updated_at: DateTimeUtc,
    pub photo_count: i64,
    /// 0/1 from the aggregate; SQLite has no native bool.
    pub has_notebook: i64,
}

pub async fn find_by_id<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Option<entry::Model>, DbErr> {
    entry::Entity::find_by_id(id).one(conn).await
}

/// Fetch one feed page ordered by entry_date descending, id descending.
///
/// The requested page is clamped into `[1, total_pages]` and the clamped
/// value returned, so an out-of-range request resolves in a single call
/// instead of a retry loop.
pub async fn list_page<C: ConnectionTrait>(
    conn: &C,
    requested_page: u64,
    per_page: u64,
) -> Result<EntryPage, DbErr> {
    let total = entry::Entity::find().count(conn).await?;
    if total == 0 {
        return Ok(EntryPage {
            entries: Vec::new(),
            page: 1,
            total: 0,
            total_pages: 0,
        });
    }

    let total_pages = total.div_ceil(per_page);
    let page = requested_page.clamp(1, total_pages);

    let entries = entry::Entity::find()
        .order_by_desc(entry::Column::EntryDate)
        .order_by_desc(entry::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(conn)
        .await?;

    Ok(EntryPage {
        entries,
        page,
        total,
        total_pages,
    })
}

/// `COALESCE(SUM(CASE WHEN assets.kind = 'photo' THEN 1 ELSE 0 END), 0)`
fn photo_count_expr() -> SimpleExpr {
    Func::coalesce::<[Expr; 2], Expr>([
        Func::sum::<Expr>(
            Expr::case(
                Expr::col((asset::Entity, asset::Column::Kind)).eq("photo"),
                Expr::val(1),
            )
            .finally(Expr::val(0))
            .into(),
        )
        .into(),
        Expr::val(0).into(),
    ])
    .into()
}

/// `COALESCE(MAX(CASE WHEN assets.kind = 'notebook_page' THEN 1 ELSE 0 END), 0)`
fn has_notebook_expr() -> SimpleExpr {
    Func::coalesce::<[Expr; 2], Expr>([
        Func::max::<Expr>(
            Expr::case(
                Expr::col((asset::Entity, asset::Column::Kind)).eq("notebook_page"),
                Expr::val(1),
            )
            .finally(Expr::val(0))
            .into(),
        )
        .into(),
        Expr::val(0).into(),
    ])
    .into()
}

/// One aggregate LEFT JOIN query for the whole dashboard, never one query
/// per entry.
pub async fn list_dashboard_rows<C: ConnectionTrait>(conn: &C) -> Result<Vec<DashboardRow>, DbErr> {
    entry::Entity::find()
        .left_join(asset::Entity)
        .select_only()
        .column(entry::Column::Id)
        .column(entry::Column::EntryDate)
        .column(entry::Column::Title)
        .column(entry::Column::UpdatedAt)
        .column_as(photo_count_expr(), "photo_count")
        .column_as(has_notebook_expr(), "has_notebook")
        .group_by(entry::Column::Id)
        .group_by(entry::Column::EntryDate)
        .group_by(entry::Column::Title)
        .group_by(entry::Column::UpdatedAt)
        .order_by_desc(entry::Column::EntryDate)
        .order_by_desc(entry::Column::Id)
        .into_model::<DashboardRow>()
        .all(conn)
        .await
}
