use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Select,
};
use serde::{Deserialize, Serialize};

use crate::database::entities::LevelEntity;

pub const DEFAULT_PER_PAGE: u64 = 25;
pub const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    #[serde(alias = "perPage")]
    pub per_page: Option<u64>,
    pub search: Option<String>,
}

impl ListQuery {
    /// 1-based page number
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    /// Trimmed search term, `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

const LIKE_ESCAPE: char = '\\';

/// `term` with `%`, `_` and the escape character made literal.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Substring match on a name column; wildcards in `term` match literally.
pub fn name_contains(term: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(term))).escape(LIKE_ESCAPE)
}

/// Fetch one page of an already filtered and ordered select.
pub async fn paginate<E, C>(conn: &C, select: Select<E>, query: &ListQuery) -> Result<Page<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let page = query.page();
    let per_page = query.per_page();

    let paginator = select.paginate(conn, per_page);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        items,
        page,
        per_page,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}

/// List one level of a container in display order, optionally filtered by
/// a case-insensitive name substring.
pub async fn list_level<E, C>(
    conn: &C,
    container_id: i32,
    query: &ListQuery,
) -> Result<Page<E::Model>, DbErr>
where
    E: LevelEntity,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let mut select = E::find().filter(E::container_column().eq(container_id));
    if let Some(term) = query.search_term() {
        // SQLite LIKE is case-insensitive for ASCII
        select = select.filter(Expr::col(E::name_column()).like(name_contains(term)));
    }

    let select = select
        .order_by_asc(E::order_column())
        .order_by_asc(E::id_column());

    paginate(conn, select, query).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults_and_bounds() {
        let query = ListQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(query.search_term(), None);

        let query = ListQuery {
            page: Some(0),
            per_page: Some(5000),
            search: Some("  risk ".to_string()),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), MAX_PER_PAGE);
        assert_eq!(query.search_term(), Some("risk"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("risk"), "risk");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }
}
