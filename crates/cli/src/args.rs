//! Command-line argument structures.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use h2space_core::content::ContentStatus;
use h2space_core::listing::{SortKey, StatusFilter, DEFAULT_PAGE_SIZE};

#[derive(Parser)]
#[command(name = "h2space")]
#[command(version)]
#[command(about = "Operator console for H2Space content", long_about = None)]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List content with filters, sorting and pagination
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one content item with its analytics
    Show {
        id: String,

        /// Count this read as a view
        #[arg(long)]
        track_view: bool,
    },

    /// Create content (without an id) or edit existing content, then save
    Edit(EditArgs),

    /// List the versions of a content item, newest first
    Versions { id: String },

    /// Compare two versions of a content item
    Compare {
        id: String,
        /// First version id
        a: String,
        /// Second version id
        b: String,
    },

    /// Restore a version and save it as a new version
    Restore {
        id: String,
        version: String,

        /// Publish while saving the restored values
        #[arg(long)]
        publish: bool,
    },

    /// Delete content
    Delete {
        id: String,

        /// Type "delete" to confirm
        #[arg(long)]
        confirm: String,
    },

    /// Upload a media file
    Upload {
        path: PathBuf,

        /// Use the upload as the featured image of this content item
        #[arg(long, value_name = "ID")]
        featured_for: Option<String>,
    },

    /// List the available categories
    Categories,

    /// List the available tags
    Tags,

    /// Content counts by status and total views
    Stats,

    /// SEO score and issues for a content item
    Seo {
        id: String,

        /// Fill empty SEO fields from the content and save
        #[arg(long)]
        auto_populate: bool,
    },
}

#[derive(Args)]
pub struct ListArgs {
    /// Case-insensitive title search
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// all, draft, published or archived
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,

    #[arg(long)]
    pub category: Option<String>,

    /// Only content carrying this tag (filtered by the service)
    #[arg(long)]
    pub tag: Option<String>,

    /// Earliest date, YYYY-MM-DD (filtered by the service)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest date, YYYY-MM-DD (filtered by the service)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// date, views or title
    #[arg(long, default_value = "date")]
    pub sort: SortKey,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,

    #[arg(short, long, default_value_t = 1)]
    pub page: usize,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
}

#[derive(Args)]
pub struct EditArgs {
    /// Content to edit; omit to create new content
    pub id: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    /// Body HTML
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the body HTML from a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    #[arg(long)]
    pub excerpt: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Featured image URL; an empty value clears it
    #[arg(long)]
    pub featured_image: Option<String>,

    #[arg(long)]
    pub status: Option<ContentStatus>,

    /// Add a tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub add_tags: Vec<String>,

    /// Remove a tag (repeatable)
    #[arg(long = "remove-tag", value_name = "TAG")]
    pub remove_tags: Vec<String>,

    /// Fill empty SEO fields from the title, excerpt and featured image
    #[arg(long)]
    pub auto_seo: bool,

    /// Save with status published
    #[arg(long)]
    pub publish: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_defaults() {
        let cli = Cli::parse_from(["h2space", "list"]);
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.status, StatusFilter::All);
        assert_eq!(args.sort, SortKey::Date);
        assert_eq!(args.page, 1);
        assert_eq!(args.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn edit_collects_repeated_tags() {
        let cli = Cli::parse_from([
            "h2space", "edit", "c1", "--tag", "rust", "--tag", "tokio", "--remove-tag", "old",
            "--publish",
        ]);
        let Commands::Edit(args) = cli.command else {
            panic!("expected edit");
        };
        assert_eq!(args.id.as_deref(), Some("c1"));
        assert_eq!(args.add_tags, vec!["rust", "tokio"]);
        assert_eq!(args.remove_tags, vec!["old"]);
        assert!(args.publish);
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(Cli::try_parse_from(["h2space", "list", "--status", "deleted"]).is_err());
    }
}
