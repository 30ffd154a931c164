use crate::defaults::DEFAULT_CATEGORIES;
use crate::models::{Category, CreateCategoryRequest};
use crate::repository::CategoryRepository;
use database::{Database, RepositoryError, Table};
use rand::seq::SliceRandom;
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Category already exists: {0}")]
    Conflict(String),
    #[error("Category not found")]
    NotFound,
}

impl From<RepositoryError> for CategoryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => CategoryError::NotFound,
            RepositoryError::UniqueViolation(msg) => CategoryError::Conflict(msg),
            RepositoryError::CheckViolation(msg) => CategoryError::InvalidInput(msg),
            RepositoryError::Infrastructure(e) => CategoryError::Infrastructure(e.to_string()),
            _ => CategoryError::Infrastructure(err.to_string()),
        }
    }
}

pub const PASTEL_COLORS: &[&str] = &[
    "#FFB3BA", "#FFDFBA", "#FFFFBA", "#BAFFC9", "#BAE1FF",
    "#E2F0CB", "#FDFD96", "#FFC3A0", "#FFD1DC", "#D4F0F0",
    "#CCE2CB", "#B6CFB6", "#97C1A9", "#FCB7AF", "#FFDAC1",
    "#E7FFAC", "#FFABAB", "#D5AAFF", "#85E3FF", "#B9F6CA",
];

pub struct CategoryService;

impl CategoryService {
    fn get_random_pastel_color() -> String {
        let mut rng = rand::thread_rng();
        PASTEL_COLORS.choose(&mut rng).unwrap_or(&"#FFFFFF").to_string()
    }

    #[instrument(skip(db))]
    pub async fn create_category(
        db: &Database,
        name: String,
        icon: Option<String>,
        color: Option<String>,
        is_expense: bool,
    ) -> Result<i64, CategoryError> {
        let color = color.unwrap_or_else(Self::get_random_pastel_color);
        let req = CreateCategoryRequest::new(name, icon.unwrap_or_default(), color, is_expense)
            .map_err(CategoryError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        let id = repo.create(&req).await?;

        uow.commit().await?;
        db.notify_changed(Table::Categories);

        Ok(id)
    }

    #[instrument(skip(db))]
    pub async fn update_category(
        db: &Database,
        id: i64,
        name: String,
        icon: Option<String>,
        color: Option<String>,
        is_expense: bool,
    ) -> Result<(), CategoryError> {
        if name.trim().is_empty() {
            return Err(CategoryError::InvalidInput("Category name cannot be empty".into()));
        }

        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        repo.update(id, name.trim(), icon.as_deref(), color.as_deref(), is_expense).await?;

        uow.commit().await?;
        db.notify_changed(Table::Categories);
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn delete_category(
        db: &Database,
        id: i64,
    ) -> Result<(), CategoryError> {
        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        repo.delete(id).await?;

        uow.commit().await?;
        db.notify_changed(Table::Categories);
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list_categories(db: &Database) -> Result<Vec<Category>, CategoryError> {
        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        let categories = repo.list().await?;

        Ok(categories)
    }

    #[instrument(skip(db))]
    pub async fn list_by_type(db: &Database, is_expense: bool) -> Result<Vec<Category>, CategoryError> {
        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        Ok(repo.list_by_type(is_expense).await?)
    }

    #[instrument(skip(db))]
    pub async fn get_category(db: &Database, id: i64) -> Result<Category, CategoryError> {
        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        let category = repo.find_by_id(id).await?
            .ok_or(CategoryError::NotFound)?;

        Ok(category)
    }

    #[instrument(skip(db))]
    pub async fn seed_defaults(db: &Database) -> Result<usize, CategoryError> {
        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        if repo.count().await? > 0 {
            tracing::debug!("Categories already present, skipping seed");
            return Ok(0);
        }

        for default in DEFAULT_CATEGORIES {
            let req = CreateCategoryRequest::new(
                default.name.to_string(),
                default.icon.to_string(),
                default.color.to_string(),
                default.is_expense,
            )
            .map_err(CategoryError::InvalidInput)?;
            repo.create(&req).await?;
        }

        uow.commit().await?;
        db.notify_changed(Table::Categories);
        tracing::info!("Seeded {} default categories", DEFAULT_CATEGORIES.len());
        Ok(DEFAULT_CATEGORIES.len())
    }
}
