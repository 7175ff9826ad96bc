//! Command handlers. Each one drives the editor components against the
//! content service and prints a human summary or JSON.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use h2space_core::confirmation::Confirmation;
use h2space_core::content::{Content, ContentListItem};
use h2space_core::listing::{ContentQuery, PageSlice, SortDirection, SortState};
use h2space_core::repository::ContentRepository;
use h2space_core::seo::SeoReport;
use h2space_core::tags::TagInsert;
use h2space_core::validation::FieldErrors;
use h2space_core::versions::{ChangeKind, FieldChange};
use h2space_editor::{
    ContentListView, DraftEdit, EditingSession, EditorConfig, SaveError, SessionError,
    VersionHistoryManager,
};
use h2space_events::EventBus;
use serde::Serialize;

use crate::args::{Commands, EditArgs, ListArgs};

/// Shared collaborators for every command.
pub struct Context {
    pub repo: Arc<dyn ContentRepository>,
    pub bus: Arc<EventBus>,
    pub config: EditorConfig,
    pub json: bool,
}

impl Context {
    async fn open(&self, id: &str) -> anyhow::Result<EditingSession> {
        let session =
            EditingSession::open(self.repo.clone(), self.bus.clone(), self.config.clone(), id)
                .await?;
        Ok(session)
    }

    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }
}

pub async fn run(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::List(args) => list(ctx, args).await,
        Commands::Show { id, track_view } => show(ctx, &id, track_view).await,
        Commands::Edit(args) => edit(ctx, args).await,
        Commands::Versions { id } => versions(ctx, &id).await,
        Commands::Compare { id, a, b } => compare(ctx, &id, &a, &b).await,
        Commands::Restore {
            id,
            version,
            publish,
        } => restore(ctx, &id, &version, publish).await,
        Commands::Delete { id, confirm } => delete(ctx, &id, &confirm).await,
        Commands::Upload { path, featured_for } => {
            upload(ctx, &path, featured_for.as_deref()).await
        }
        Commands::Categories => {
            let categories = ctx.repo.get_categories().await?;
            ctx.emit(&categories, || categories.iter().for_each(|c| println!("{c}")))
        }
        Commands::Tags => {
            let tags = ctx.repo.get_tags().await?;
            ctx.emit(&tags, || tags.iter().for_each(|t| println!("{t}")))
        }
        Commands::Stats => stats(ctx).await,
        Commands::Seo { id, auto_populate } => seo(ctx, &id, auto_populate).await,
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

async fn list(ctx: &Context, args: ListArgs) -> anyhow::Result<()> {
    let query = ContentQuery {
        tag: args.tag,
        from: args.from,
        to: args.to,
        ..ContentQuery::default()
    };
    let mut view = ContentListView::new(ctx.repo.clone())
        .with_page_size(args.page_size)
        .with_query(query);
    view.refresh().await.context("Failed to load content")?;

    view.set_search(args.search);
    view.set_status(args.status);
    view.set_category(args.category);
    let direction = if args.asc {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    };
    view.set_sort(SortState::new(args.sort, direction));
    view.go_to(args.page);

    let page = view.visible();
    ctx.emit(&page, || print_page(&page))
}

fn print_page(page: &PageSlice<ContentListItem>) {
    if page.items.is_empty() {
        println!("No content found");
        return;
    }
    for item in &page.items {
        println!(
            "{:<24} {:<10} {:>6}  {}  {}",
            item.id,
            item.status.as_str(),
            item.view_count(),
            item.updated_at.format("%Y-%m-%d"),
            item.title
        );
    }
    println!(
        "Page {} of {} ({} items)",
        page.page, page.total_pages, page.total_items
    );
}

async fn stats(ctx: &Context) -> anyhow::Result<()> {
    let mut view = ContentListView::new(ctx.repo.clone());
    view.refresh().await.context("Failed to load content")?;
    let stats = view.stats();
    ctx.emit(&stats, || {
        println!("Total:     {}", stats.total);
        println!("Published: {}", stats.published);
        println!("Drafts:    {}", stats.drafts);
        println!("Archived:  {}", stats.archived);
        println!("Views:     {}", stats.total_views);
    })
}

// ---------------------------------------------------------------------------
// Single content
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ShowOutput {
    content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    analytics: Option<h2space_core::content::ContentAnalytics>,
}

async fn show(ctx: &Context, id: &str, track_view: bool) -> anyhow::Result<()> {
    let content = ctx.repo.get_content(id).await?;
    if track_view {
        if let Err(e) = ctx.repo.track_view(id).await {
            tracing::warn!(content_id = %id, error = %e, "Failed to record view");
        }
    }
    let analytics = match ctx.repo.get_analytics(id).await {
        Ok(analytics) => Some(analytics),
        Err(e) => {
            tracing::debug!(content_id = %id, error = %e, "Analytics unavailable");
            None
        }
    };

    let output = ShowOutput { content, analytics };
    ctx.emit(&output, || {
        let c = &output.content;
        println!("{} [{}]", c.title, c.status);
        println!("id:       {}", c.id);
        println!("category: {}", c.category);
        println!("tags:     {}", c.tags.join(", "));
        println!("updated:  {}", c.updated_at.to_rfc3339());
        println!();
        println!("{}", c.excerpt);
        if let Some(a) = &output.analytics {
            println!();
            println!(
                "{} views, {} unique visitors, {:.0}s average time on page",
                a.views, a.unique_visitors, a.avg_time_on_page
            );
        }
    })
}

async fn edit(ctx: &Context, args: EditArgs) -> anyhow::Result<()> {
    let session = match &args.id {
        Some(id) => ctx.open(id).await?,
        None => EditingSession::open_new(ctx.repo.clone(), ctx.bus.clone(), ctx.config.clone())
            .await,
    };
    let draft = session.draft();

    let body = match &args.body_file {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => args.body,
    };

    let edits = [
        args.title.map(DraftEdit::Title),
        body.map(DraftEdit::Body),
        args.excerpt.map(DraftEdit::Excerpt),
        args.category.map(DraftEdit::Category),
        args.status.map(DraftEdit::Status),
        args.featured_image
            .map(|url| DraftEdit::FeaturedImage(Some(url).filter(|u| !u.is_empty()))),
    ];
    for edit in edits.into_iter().flatten() {
        draft.edit(edit).await;
    }

    for tag in &args.remove_tags {
        if !draft.remove_tag(tag).await {
            tracing::warn!(tag = %tag, "Tag not present");
        }
    }
    for tag in &args.add_tags {
        match draft.add_tag(tag).await {
            TagInsert::Added => {}
            TagInsert::Empty => tracing::warn!("Ignoring empty tag"),
            TagInsert::Duplicate => tracing::warn!(tag = %tag, "Tag already present"),
            TagInsert::LimitReached => {
                bail!("Maximum {} tags allowed", ctx.config.max_tags)
            }
        }
    }
    if args.auto_seo {
        draft.auto_populate_seo().await;
    }

    if args.id.is_some() && !draft.is_dirty().await {
        println!("No changes to save");
        return Ok(());
    }

    let content = save(&session, args.publish).await?;
    session.close();
    ctx.emit(&content, || println!("Saved {} ({})", content.id, content.status))
}

async fn save(session: &EditingSession, as_publish: bool) -> anyhow::Result<Content> {
    match session.save(as_publish).await {
        Ok(content) => Ok(content),
        Err(SessionError::Save(SaveError::Validation(errors))) => {
            bail!("{}", describe_field_errors(&errors))
        }
        Err(e) => Err(e.into()),
    }
}

fn describe_field_errors(errors: &FieldErrors) -> String {
    let mut lines = vec!["Please fix the errors before saving:".to_string()];
    lines.extend(
        errors
            .iter()
            .map(|(field, message)| format!("  {field}: {message}")),
    );
    lines.join("\n")
}

async fn delete(ctx: &Context, id: &str, confirm: &str) -> anyhow::Result<()> {
    let session = ctx.open(id).await?;
    let mut confirmation = Confirmation::for_delete();
    confirmation.input(confirm);
    session.delete(&confirmation).await?;

    #[derive(Serialize)]
    struct Deleted<'a> {
        deleted: &'a str,
    }
    ctx.emit(&Deleted { deleted: id }, || println!("Deleted {id}"))
}

async fn upload(ctx: &Context, path: &Path, featured_for: Option<&str>) -> anyhow::Result<()> {
    let (file_name, bytes) = read_upload(path).await?;

    let upload = match featured_for {
        Some(id) => {
            let session = ctx.open(id).await?;
            let upload = session.upload_featured_image(&file_name, bytes).await?;
            save(&session, false).await?;
            session.close();
            upload
        }
        None => {
            let session =
                EditingSession::open_new(ctx.repo.clone(), ctx.bus.clone(), ctx.config.clone())
                    .await;
            session.upload_media(&file_name, bytes).await?
        }
    };
    ctx.emit(&upload, || println!("{}", upload.url))
}

/// File name and contents of a file to upload.
async fn read_upload(path: &Path) -> anyhow::Result<(String, Vec<u8>)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Not a file path: {}", path.display()))?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((file_name, bytes))
}

async fn seo(ctx: &Context, id: &str, auto_populate: bool) -> anyhow::Result<()> {
    let session = ctx.open(id).await?;
    let draft = session.draft();
    if auto_populate {
        draft.auto_populate_seo().await;
        if draft.is_dirty().await {
            save(&session, false).await?;
        }
    }
    let report = draft.seo_report().await;
    session.close();
    ctx.emit(&report, || print_seo(&report))
}

fn print_seo(report: &SeoReport) {
    println!("SEO score: {}%", report.score);
    for issue in &report.issues {
        println!("  - {issue}");
    }
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

async fn versions(ctx: &Context, id: &str) -> anyhow::Result<()> {
    let history = VersionHistoryManager::new(ctx.repo.clone(), id);
    let versions = history.list_versions().await?;
    ctx.emit(&versions, || {
        if versions.is_empty() {
            println!("No version history available");
        }
        for (index, version) in versions.iter().enumerate() {
            let marker = if index == 0 { " (current)" } else { "" };
            println!(
                "v{:<4} {:<28} {}  {}{}",
                version.version_number,
                version.id,
                version.created_at.format("%Y-%m-%d %H:%M"),
                version.created_by.name,
                marker
            );
            if !version.changes.is_empty() {
                println!("      {}", describe_changes(&version.changes));
            }
        }
    })
}

async fn compare(ctx: &Context, id: &str, a: &str, b: &str) -> anyhow::Result<()> {
    let history = VersionHistoryManager::new(ctx.repo.clone(), id);
    let comparison = history.compare(a, b).await?;
    ctx.emit(&comparison, || {
        println!(
            "v{} -> v{}",
            comparison.earlier.version_number, comparison.later.version_number
        );
        if comparison.changes.is_empty() {
            println!("  no recorded changes");
        } else {
            println!("  {}", describe_changes(&comparison.changes));
        }
    })
}

async fn restore(ctx: &Context, id: &str, version: &str, publish: bool) -> anyhow::Result<()> {
    let session = ctx.open(id).await?;
    session.restore_version(version).await?;
    let content = save(&session, publish).await?;
    session.close();
    ctx.emit(&content, || {
        println!("Restored {version} into {} ({})", content.id, content.status)
    })
}

fn describe_changes(changes: &[FieldChange]) -> String {
    changes
        .iter()
        .map(|change| {
            let sign = match change.kind {
                ChangeKind::Added => '+',
                ChangeKind::Modified => '~',
                ChangeKind::Removed => '-',
            };
            format!("{sign}{}", change.field)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
