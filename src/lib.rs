// src/lib.rs
pub mod application;
pub mod cli;
pub mod constants;
pub mod domain;
pub mod infrastructure;
pub mod ports;
pub mod util;

use anyhow::{bail, Context, Result};
use application::{
    CategoryManager, CategoryRepository, FilterBrowser, FilterLibrary, FilterMetrics,
    FilterOrganizer, FilterRepository, ListingRequest, ListingScope, SessionProvider,
    StaticSession,
};
use domain::{CategorySelector, ClearScope, FilterUpdate, NewFilter, OwnerId};
use infrastructure::{Config, SqliteRepository};
use ports::{ListingPresenter, OutputFormat};
use tracing::{debug, info};
use crate::cli::args::{Args, CategoryCommand, Command};

pub fn run(args: Args) -> Result<()> {
    debug!(?args, "Starting conveyor-filters with arguments");

    let config = Config::locate(args.config.as_deref())?;

    // Flags win over the config file
    let database_path = match args.database {
        Some(path) => {
            debug!(?path, "Using provided database path");
            path
        }
        None => config.database_path()?,
    };
    let session = StaticSession::new(
        args.user
            .or_else(|| config.session.user.clone())
            .map(OwnerId::new),
    );

    let mut repository = SqliteRepository::open(&database_path)?;
    let output = execute(&mut repository, &session, config.listing.page_size, args.command);
    repository.close()?;

    print!("{}", output?);
    Ok(())
}

/// Run one command against a store and return what it prints.
pub fn execute<R, S>(
    repository: &mut R,
    session: &S,
    page_size: usize,
    command: Command,
) -> Result<String>
where
    R: FilterRepository + CategoryRepository,
    S: SessionProvider,
{
    match command {
        Command::Browse {
            sort,
            cursor,
            search,
            mine,
            selector,
            limit,
            json,
        } => {
            let scope = if mine {
                ListingScope::Mine(selector.selector())
            } else if !selector.is_empty() {
                bail!("--category, --subcategory and --uncategorized require --mine");
            } else {
                ListingScope::Public
            };
            let request = ListingRequest {
                sort,
                cursor,
                scope,
                search,
                page_size: limit,
            };

            let page = FilterBrowser::new(repository, session)
                .with_default_page_size(page_size)
                .browse(&request)?;
            Ok(ListingPresenter::new(OutputFormat::from_json_flag(json)).render_page(&page)?)
        }

        Command::List { selector, json } => {
            let mut organizer = FilterOrganizer::new(repository, session);
            let filters = match selector.selector() {
                CategorySelector::Main(id) => organizer.list_main_category(id)?,
                CategorySelector::Sub(id) => organizer.list_subcategory(id)?,
                CategorySelector::Uncategorized => organizer.list_uncategorized()?,
                CategorySelector::All => {
                    bail!("one of --category, --subcategory or --uncategorized is required")
                }
            };
            Ok(ListingPresenter::new(OutputFormat::from_json_flag(json)).render_summaries(&filters)?)
        }

        Command::Create {
            name,
            payload,
            description,
            visibility,
        } => {
            let new = NewFilter {
                name,
                description,
                config: payload,
                visibility,
            };
            let filter = FilterLibrary::new(repository, session).create_filter(&new)?;
            info!(filter_id = filter.id, "Created filter");
            Ok(format!("{}\n", filter.id))
        }

        Command::Show { filter_id, json } => {
            let filter = FilterLibrary::new(repository, session).get_filter(filter_id)?;
            Ok(ListingPresenter::new(OutputFormat::from_json_flag(json)).render_filter(&filter)?)
        }

        Command::Update {
            filter_id,
            name,
            description,
            payload,
            visibility,
        } => {
            let update = FilterUpdate {
                name,
                description,
                config: payload,
                visibility,
            };
            if update.is_empty() {
                bail!("nothing to update");
            }
            let filter = FilterLibrary::new(repository, session).update_filter(filter_id, &update)?;
            Ok(format!("updated {}\n", filter.id))
        }

        Command::Delete { filter_id } => {
            FilterLibrary::new(repository, session).delete_filter(filter_id)?;
            Ok(format!("deleted {}\n", filter_id))
        }

        Command::Assign {
            filter_id,
            category,
            subcategory,
        } => {
            FilterOrganizer::new(repository, session).assign_category(filter_id, category, subcategory)?;
            Ok(format!("assigned {}\n", filter_id))
        }

        Command::ClearCategory {
            filter_id,
            subcategory_only,
        } => {
            let scope = if subcategory_only {
                ClearScope::SubcategoryOnly
            } else {
                ClearScope::All
            };
            FilterOrganizer::new(repository, session).clear_category(filter_id, scope)?;
            Ok(format!("cleared {}\n", filter_id))
        }

        Command::Move {
            filter_id,
            position,
        } => {
            FilterOrganizer::new(repository, session).move_filter(filter_id, position)?;
            Ok(format!("moved {} to {}\n", filter_id, position))
        }

        Command::View { filter_id } => {
            FilterMetrics::new(&mut *repository, session).record_view(filter_id)?;
            let filter = FilterLibrary::new(repository, session).get_filter(filter_id)?;
            Ok(ListingPresenter::new(OutputFormat::Text).render_filter(&filter)?)
        }

        Command::Export { filter_id } => {
            FilterMetrics::new(&mut *repository, session).record_export(filter_id)?;
            let filter = FilterLibrary::new(repository, session).get_filter(filter_id)?;
            Ok(format!("{}\n", filter.config))
        }

        Command::Category(command) => execute_category(repository, session, command),
    }
}

fn execute_category<R, S>(repository: &mut R, session: &S, command: CategoryCommand) -> Result<String>
where
    R: CategoryRepository,
    S: SessionProvider,
{
    let mut manager = CategoryManager::new(repository, session);
    match command {
        CategoryCommand::Add { name } => {
            let category = manager.create_category(&name)?;
            Ok(format!("{}\n", category.id))
        }
        CategoryCommand::AddSub { category_id, name } => {
            let subcategory = manager
                .create_subcategory(category_id, &name)
                .with_context(|| format!("Failed to add subcategory to category {}", category_id))?;
            Ok(format!("{}\n", subcategory.id))
        }
        CategoryCommand::List { json } => {
            let tree = manager.list_categories()?;
            Ok(ListingPresenter::new(OutputFormat::from_json_flag(json)).render_categories(&tree)?)
        }
        CategoryCommand::Rename { category_id, name } => {
            manager.rename_category(category_id, &name)?;
            Ok(format!("renamed {}\n", category_id))
        }
        CategoryCommand::Remove { category_id } => {
            manager.delete_category(category_id)?;
            Ok(format!("removed category {}\n", category_id))
        }
        CategoryCommand::RemoveSub { subcategory_id } => {
            manager.delete_subcategory(subcategory_id)?;
            Ok(format!("removed subcategory {}\n", subcategory_id))
        }
    }
}

#[cfg(test)]
/// must be public to be used from integration tests
mod tests {
    use crate::util::testing;
    #[ctor::ctor]
    fn init() {
        testing::init_test_setup().expect("Failed to initialize test setup");
    }
}
