use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub iso_code: String,
    pub dial_code: String,
    pub flag_emoji: Option<String>,
    pub flag_svg_url: Option<String>,
}

impl Country {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Country>("SELECT * FROM countries ORDER BY name ASC")
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn migration_seeds_countries() {
        let db = DBService::new_in_memory().await.unwrap();
        let countries = Country::find_all(&db.pool).await.unwrap();
        let india = countries.iter().find(|c| c.iso_code == "IN").unwrap();
        assert_eq!(india.dial_code, "+91");
    }
}
