use crate::models::{Category, CreateCategoryRequest};
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct CategoryRecord {
    id: i64,
    name: String,
    icon: String,
    color: String,
    is_expense: bool,
}

impl From<CategoryRecord> for Category {
    fn from(record: CategoryRecord) -> Self {
        Category {
            id: record.id,
            name: record.name,
            icon: record.icon,
            color: record.color,
            is_expense: record.is_expense,
        }
    }
}

pub(crate) struct CategoryRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, req: &CreateCategoryRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO categories (name, icon, color, is_expense) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&req.name)
        .bind(&req.icon)
        .bind(&req.color)
        .bind(req.is_expense)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn list(&mut self) -> Result<Vec<Category>, RepositoryError> {
        let records = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, icon, color, is_expense FROM categories ORDER BY name ASC",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    pub async fn list_by_type(&mut self, is_expense: bool) -> Result<Vec<Category>, RepositoryError> {
        let records = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, icon, color, is_expense FROM categories WHERE is_expense = $1 ORDER BY name ASC",
        )
        .bind(is_expense)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<Category>, RepositoryError> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, icon, color, is_expense FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(record.map(|r| r.into()))
    }

    pub async fn count(&mut self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }

    pub async fn update(&mut self, id: i64, name: &str, icon: Option<&str>, color: Option<&str>, is_expense: bool) -> Result<(), RepositoryError> {
        // COALESCE keeps the stored icon/color when the caller leaves them out.
        let result = sqlx::query(
            "UPDATE categories SET name = $1, icon = COALESCE($2, icon), color = COALESCE($3, color), is_expense = $4 WHERE id = $5",
        )
        .bind(name)
        .bind(icon)
        .bind(color)
        .bind(is_expense)
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::get_test_db;

    fn request(name: &str, is_expense: bool) -> CreateCategoryRequest {
        CreateCategoryRequest::new(name.to_string(), "ic_category_food".to_string(), "#FFB3BA".to_string(), is_expense).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_category() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = CategoryRepository::new(uow.connection());

        let id = repo.create(&request("Groceries", true)).await.unwrap();
        assert!(id > 0);

        let cat = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(cat.name, "Groceries");
        assert_eq!(cat.icon, "ic_category_food");
        assert!(cat.is_expense);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_name_and_filtered_by_type() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = CategoryRepository::new(uow.connection());

        repo.create(&request("Taxi", true)).await.unwrap();
        repo.create(&request("Cafe", true)).await.unwrap();
        repo.create(&request("Salary", false)).await.unwrap();

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Cafe", "Salary", "Taxi"]);

        let income = repo.list_by_type(false).await.unwrap();
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].name, "Salary");
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_keeps_color_when_omitted() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = CategoryRepository::new(uow.connection());

        let id = repo.create(&request("Cafe", true)).await.unwrap();
        repo.update(id, "Coffee", None, None, true).await.unwrap();

        let cat = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(cat.name, "Coffee");
        assert_eq!(cat.color, "#FFB3BA");
        assert_eq!(cat.icon, "ic_category_food");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_category() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = CategoryRepository::new(uow.connection());

        assert!(matches!(repo.update(42, "X", None, None, true).await, Err(RepositoryError::NotFound)));
        assert!(matches!(repo.delete(42).await, Err(RepositoryError::NotFound)));
    }
}
