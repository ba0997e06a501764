// src/cli/args.rs
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::{CategorySelector, SortMode, Visibility};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
#[command(arg_required_else_help = true, disable_help_subcommand = true)]
pub struct Args {
    /// Path to the filter database (overrides the config file)
    #[arg(short, long, value_name = "DATABASE", global = true)]
    pub database: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(long, value_name = "CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Act as this user (overrides the config file)
    #[arg(short, long, value_name = "USER", global = true)]
    pub user: Option<String>,

    /// Verbosity level (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Category narrowing for the caller's own filters. At most one may be given.
#[derive(ClapArgs, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct SelectorArgs {
    /// Filters directly in this main category
    #[arg(long, value_name = "CATEGORY_ID")]
    pub category: Option<i64>,

    /// Filters in this subcategory
    #[arg(long, value_name = "SUBCATEGORY_ID")]
    pub subcategory: Option<i64>,

    /// Filters with no category
    #[arg(long)]
    pub uncategorized: bool,
}

impl SelectorArgs {
    pub fn selector(&self) -> CategorySelector {
        match (self.category, self.subcategory, self.uncategorized) {
            (Some(id), _, _) => CategorySelector::Main(id),
            (_, Some(id), _) => CategorySelector::Sub(id),
            (_, _, true) => CategorySelector::Uncategorized,
            _ => CategorySelector::All,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selector() == CategorySelector::All
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Browse filters one page at a time
    Browse {
        /// Sort order: popular, new, updated, most-used (or p, n, u, m)
        #[arg(short, long, default_value = "popular")]
        sort: SortMode,

        /// Cursor printed by the previous page
        #[arg(short, long)]
        cursor: Option<String>,

        /// Match name or description
        #[arg(long)]
        search: Option<String>,

        /// Only your own filters, private ones included
        #[arg(long)]
        mine: bool,

        #[command(flatten)]
        selector: SelectorArgs,

        /// Page size
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List your filters in one category bucket, in manual order
    List {
        #[command(flatten)]
        selector: SelectorArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a filter
    Create {
        #[arg(value_name = "NAME")]
        name: String,

        /// Filter payload (JSON as exported by the game)
        #[arg(long, value_name = "JSON")]
        payload: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, default_value = "private")]
        visibility: Visibility,
    },

    /// Show one filter
    Show {
        #[arg(value_name = "FILTER_ID")]
        filter_id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit an owned filter
    Update {
        #[arg(value_name = "FILTER_ID")]
        filter_id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Replacement filter payload
        #[arg(long, value_name = "JSON")]
        payload: Option<String>,

        #[arg(long)]
        visibility: Option<Visibility>,
    },

    /// Delete an owned filter
    Delete {
        #[arg(value_name = "FILTER_ID")]
        filter_id: i64,
    },

    /// Put a filter into a category, optionally a subcategory of it
    Assign {
        #[arg(value_name = "FILTER_ID")]
        filter_id: i64,

        #[arg(long, value_name = "CATEGORY_ID")]
        category: i64,

        #[arg(long, value_name = "SUBCATEGORY_ID")]
        subcategory: Option<i64>,
    },

    /// Remove a filter from its category
    ClearCategory {
        #[arg(value_name = "FILTER_ID")]
        filter_id: i64,

        /// Keep the main category, clear only the subcategory
        #[arg(long)]
        subcategory_only: bool,
    },

    /// Set a filter's manual position within its bucket
    Move {
        #[arg(value_name = "FILTER_ID")]
        filter_id: i64,

        #[arg(value_name = "POSITION")]
        position: i64,
    },

    /// Record a view of a filter
    View {
        #[arg(value_name = "FILTER_ID")]
        filter_id: i64,
    },

    /// Record an export and print the filter payload
    Export {
        #[arg(value_name = "FILTER_ID")]
        filter_id: i64,
    },

    /// Manage your categories
    #[command(subcommand)]
    Category(CategoryCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoryCommand {
    /// Create a main category
    Add {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Create a subcategory under a category
    AddSub {
        #[arg(value_name = "CATEGORY_ID")]
        category_id: i64,

        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Show your categories with their subcategories
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    Rename {
        #[arg(value_name = "CATEGORY_ID")]
        category_id: i64,

        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Delete a category; its filters become uncategorized
    Remove {
        #[arg(value_name = "CATEGORY_ID")]
        category_id: i64,
    },

    /// Delete a subcategory; its filters stay in the parent category
    RemoveSub {
        #[arg(value_name = "SUBCATEGORY_ID")]
        subcategory_id: i64,
    },
}
