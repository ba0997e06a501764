// src/application/category_manager.rs
use tracing::{info, instrument};

use crate::application::access::{owned_category, owned_subcategory};
use crate::application::{CategoryRepository, SessionProvider};
use crate::domain::{Category, CategoryTree, DomainError, Subcategory};
use crate::util::text::validate_name;
use crate::util::time;

/// The caller's private two-level category tree.
pub struct CategoryManager<R: CategoryRepository, S: SessionProvider> {
    repository: R,
    session: S,
}

impl<R: CategoryRepository, S: SessionProvider> CategoryManager<R, S> {
    pub fn new(repository: R, session: S) -> Self {
        Self {
            repository,
            session,
        }
    }

    pub fn create_category(&mut self, name: &str) -> Result<Category, DomainError> {
        let user = self.session.current_user()?;
        let name = validate_name("category", name)?;

        let category = self.repository.insert_category(&user, &name, time::now())?;
        info!(category_id = category.id, owner = %user, "Created category");
        Ok(category)
    }

    pub fn create_subcategory(&mut self, category_id: i64, name: &str) -> Result<Subcategory, DomainError> {
        let user = self.session.current_user()?;
        let name = validate_name("subcategory", name)?;
        let parent = owned_category(&mut self.repository, category_id, &user)?;

        let subcategory = self
            .repository
            .insert_subcategory(&parent, &name, time::now())?;
        info!(subcategory_id = subcategory.id, category_id, "Created subcategory");
        Ok(subcategory)
    }

    pub fn list_categories(&mut self) -> Result<Vec<CategoryTree>, DomainError> {
        let user = self.session.current_user()?;
        let categories = self.repository.list_categories(&user)?;

        categories
            .into_iter()
            .map(|category| {
                let subcategories = self.repository.list_subcategories(category.id)?;
                Ok(CategoryTree {
                    category,
                    subcategories,
                })
            })
            .collect()
    }

    pub fn rename_category(&mut self, category_id: i64, name: &str) -> Result<(), DomainError> {
        let user = self.session.current_user()?;
        let name = validate_name("category", name)?;
        owned_category(&mut self.repository, category_id, &user)?;

        if !self.repository.rename_category(category_id, &user, &name)? {
            return Err(DomainError::CategoryNotFound(category_id));
        }
        Ok(())
    }

    /// Delete a category with its subcategories. Its filters survive as
    /// uncategorized.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_category(&mut self, category_id: i64) -> Result<(), DomainError> {
        let user = self.session.current_user()?;
        owned_category(&mut self.repository, category_id, &user)?;

        if !self.repository.delete_category(category_id, &user)? {
            return Err(DomainError::CategoryNotFound(category_id));
        }
        info!(category_id, "Deleted category");
        Ok(())
    }

    /// Delete a subcategory. Its filters stay in the parent category.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_subcategory(&mut self, subcategory_id: i64) -> Result<(), DomainError> {
        let user = self.session.current_user()?;
        owned_subcategory(&mut self.repository, subcategory_id, &user)?;

        if !self.repository.delete_subcategory(subcategory_id, &user)? {
            return Err(DomainError::SubcategoryNotFound(subcategory_id));
        }
        info!(subcategory_id, "Deleted subcategory");
        Ok(())
    }
}
