use std::collections::HashMap;

use sea_orm::sea_query::{Expr, ExprTrait, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect,
    Select,
};

use crate::entity::asset::{self, AssetKind};

/// `CASE kind WHEN 'notebook_page' THEN 0 ELSE 1 END`: the notebook page
/// sorts before photos regardless of its sort_index.
fn notebook_first() -> SimpleExpr {
    Expr::case(Expr::col(asset::Column::Kind).eq("notebook_page"), Expr::val(0))
        .finally(Expr::val(1))
        .into()
}

fn ordered(select: Select<asset::Entity>) -> Select<asset::Entity> {
    select
        .order_by(notebook_first(), Order::Asc)
        .order_by_asc(asset::Column::SortIndex)
        .order_by_asc(asset::Column::Id)
}

/// All assets of one entry in display order: notebook page first, then
/// photos by sort_index ascending, id ascending as the final tie-break.
pub async fn list_for_entry<C: ConnectionTrait>(
    conn: &C,
    entry_id: i32,
) -> Result<Vec<asset::Model>, DbErr> {
    ordered(asset::Entity::find().filter(asset::Column::EntryId.eq(entry_id)))
        .all(conn)
        .await
}

/// Display-ordered assets for a page of entries, grouped by entry id.
/// One query for the whole page.
pub async fn list_for_entries<C: ConnectionTrait>(
    conn: &C,
    entry_ids: &[i32],
) -> Result<HashMap<i32, Vec<asset::Model>>, DbErr> {
    if entry_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = ordered(
        asset::Entity::find().filter(asset::Column::EntryId.is_in(entry_ids.to_vec())),
    )
    .all(conn)
    .await?;

    let mut grouped: HashMap<i32, Vec<asset::Model>> = HashMap::new();
    for row in rows {
        grouped.entry(row.entry_id).or_default().push(row);
    }
    Ok(grouped)
}

/// The entry's notebook-page asset, if it has one.
pub async fn find_notebook<C: ConnectionTrait>(
    conn: &C,
    entry_id: i32,
) -> Result<Option<asset::Model>, DbErr> {
    asset::Entity::find()
        .filter(asset::Column::EntryId.eq(entry_id))
        .filter(asset::Column::Kind.eq(AssetKind::NotebookPage))
        .one(conn)
        .await
}

/// The entry's photo assets in display order.
pub async fn list_photos<C: ConnectionTrait>(
    conn: &C,
    entry_id: i32,
) -> Result<Vec<asset::Model>, DbErr> {
    asset::Entity::find()
        .filter(asset::Column::EntryId.eq(entry_id))
        .filter(asset::Column::Kind.eq(AssetKind::Photo))
        .order_by_asc(asset::Column::SortIndex)
        .order_by_asc(asset::Column::Id)
        .all(conn)
        .await
}

/// File paths of every asset owned by an entry (collected before deletion).
pub async fn file_paths_for_entry<C: ConnectionTrait>(
    conn: &C,
    entry_id: i32,
) -> Result<Vec<String>, DbErr> {
    asset::Entity::find()
        .select_only()
        .column(asset::Column::FilePath)
        .filter(asset::Column::EntryId.eq(entry_id))
        .into_tuple::<String>()
        .all(conn)
        .await
}
