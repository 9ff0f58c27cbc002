//! Command handlers. Each one restores the session, drives a controller or
//! flow, and prints the outcome.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use musicly_client::album_detail::AlbumDetailController;
use musicly_client::api::{Attachment, AttachmentKind, CatalogApi, ListQuery};
use musicly_client::auth::{self, FormState, LoginFlow, ResetPasswordFlow};
use musicly_client::config::ClientConfig;
use musicly_client::controller::ResourceController;
use musicly_client::error::ClientError;
use musicly_client::notice::Notice;
use musicly_client::routes::Route;
use musicly_client::session::Session;
use musicly_client::storage::FileStorage;
use musicly_core::album::{Album, AlbumDraft, AlbumPatch};
use musicly_core::audio::{Audio, AudioDraft, AudioPatch};
use musicly_core::bilingual::Bilingual;
use musicly_core::category::{Category, CategoryDraft, CategoryPatch};
use musicly_core::error_codes::INVALID_CREDENTIALS_MESSAGE;
use musicly_core::forms::{LoginForm, ResetPasswordForm};

use crate::cli::{
    AlbumCommand, AudioCommand, AudioFlags, CategoryCommand, Cli, Command, CommonCommand,
    DraftText, PatchText,
};
use crate::render::{self, Card};

struct Context {
    config: ClientConfig,
    api: CatalogApi,
    storage: Arc<FileStorage>,
}

impl Context {
    fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let api = CatalogApi::new(&config).map_err(report)?;
        let storage = Arc::new(FileStorage::new(config.session_file.clone()));
        Ok(Self {
            config,
            api,
            storage,
        })
    }

    /// The stored session, required by every catalog command.
    fn session(&self, route: Route) -> anyhow::Result<Session> {
        let restored = Session::restore(self.storage.as_ref())
            .with_context(|| format!("Failed to read {}", self.storage.path().display()))?;
        let shown = route.clone().guard(restored.as_ref());
        let session = match restored {
            Some(session) if shown == route => session,
            _ => bail!("Not signed in. Run `musicly-admin login` first."),
        };
        if session.is_expired(chrono::Utc::now()) {
            tracing::warn!("Stored access token has expired; the server will likely reject it");
        }
        tracing::debug!(route = %route.path(), "Session restored");
        Ok(session)
    }

    fn controller<R>(&self, route: Route) -> anyhow::Result<ResourceController<R, CatalogApi>>
    where
        R: Card,
    {
        let session = self.session(route)?;
        Ok(ResourceController::new(self.api.clone(), session).with_page_size(self.config.page_size))
    }
}

/// Turn a client error into an operator-facing error, keeping the cause.
fn report(err: ClientError) -> anyhow::Error {
    let mut message = err.user_message();
    if err.is_unauthorized() && message != INVALID_CREDENTIALS_MESSAGE {
        message.push_str(" (run `musicly-admin login`)");
    }
    anyhow::Error::new(err).context(message)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env().context("Invalid configuration")?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }
    tracing::debug!(api = %config.api_base_url, session_file = %config.session_file.display(), "Loaded client configuration");

    let ctx = Context::new(config)?;
    match cli.command {
        Command::Login { email, password } => login(&ctx, email, password).await,
        Command::Logout => {
            auth::logout(ctx.storage.as_ref()).map_err(report)?;
            println!("Signed out");
            Ok(())
        }
        Command::Whoami => whoami(&ctx),
        Command::ResetPassword {
            token,
            password,
            confirm,
        } => reset_password(&ctx, token, password, confirm).await,
        Command::Categories { action } => categories(&ctx, action).await,
        Command::Albums { action } => albums(&ctx, action).await,
        Command::Audios { action } => audios(&ctx, action).await,
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn login(ctx: &Context, email: String, password: String) -> anyhow::Result<()> {
    let flow = LoginFlow::new(ctx.api.clone(), ctx.storage.clone());
    let session = flow
        .submit(LoginForm::new(email, password))
        .await
        .map_err(report)?;

    let who = session.user().email().unwrap_or("user");
    match flow.state().await {
        FormState::Succeeded { redirect } => println!("Signed in as {who}. Continue at {}", redirect.path()),
        _ => println!("Signed in as {who}"),
    }
    Ok(())
}

fn whoami(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.session(Route::HOME)?;
    let user = session.user();
    println!("id: {}", user.id);
    if let Some(name) = user.name() {
        println!("name: {name}");
    }
    if let Some(email) = user.email() {
        println!("email: {email}");
    }
    match session.expires_at() {
        Some(exp) => println!("token expires: {}", exp.to_rfc3339()),
        None => println!("token expires: unknown"),
    }
    Ok(())
}

async fn reset_password(
    ctx: &Context,
    token: String,
    password: String,
    confirm: String,
) -> anyhow::Result<()> {
    let flow = ResetPasswordFlow::new(ctx.api.clone(), token);
    flow.submit(ResetPasswordForm::new(password, confirm))
        .await
        .map_err(report)?;
    if let Some(notice) = flow.notice().await {
        println!("{}", render::notice(&notice));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

async fn categories(ctx: &Context, action: CategoryCommand) -> anyhow::Result<()> {
    let ctl = ctx.controller::<Category>(Route::Categories)?;
    match action {
        CategoryCommand::Common(common) => run_common(&ctl, common).await,
        CategoryCommand::Create { text, thumbnail } => {
            let (title, description) = draft_text(&text);
            let draft = CategoryDraft::new(title, description, text.slug);
            let files = attachments([(AttachmentKind::Thumbnail, thumbnail.as_deref())]).await?;
            ctl.open_create().await;
            settle(&ctl, ctl.create(draft, files).await).await
        }
        CategoryCommand::Update { id, text } => {
            let (title, description, slug) = patch_text(text);
            let patch = CategoryPatch {
                title,
                description,
                slug,
            };
            ctl.open_edit(id.clone()).await;
            settle(&ctl, ctl.update(&id, patch).await).await
        }
    }
}

async fn albums(ctx: &Context, action: AlbumCommand) -> anyhow::Result<()> {
    match action {
        AlbumCommand::Show { slug } => {
            let detail = album_detail(ctx, &slug).await?;
            let snapshot = detail.snapshot().await;
            let Some(album) = &snapshot.album else {
                bail!("Not Found");
            };
            println!("{}", album.card());
            for (position, track) in snapshot.tracks().iter().enumerate() {
                println!("  {}. {} ({})", position + 1, track.title.en(), track.id);
            }
            Ok(())
        }
        AlbumCommand::AddAudio { slug, audio_id } => {
            let detail = album_detail(ctx, &slug).await?;
            let result = detail.add_audio(&audio_id).await;
            print_outcome(detail.snapshot().await.notice.as_ref(), result)
        }
        AlbumCommand::RemoveAudio { slug, audio_id } => {
            let detail = album_detail(ctx, &slug).await?;
            let result = detail.remove_audio(&audio_id).await;
            print_outcome(detail.snapshot().await.notice.as_ref(), result)
        }
        AlbumCommand::CreateAudio { album, text, flags } => {
            let detail = album_detail(ctx, &album).await?;
            let (draft, files) = audio_draft(&text, &flags).await?;
            let result = detail.create_audio(draft, files).await;
            print_outcome(detail.snapshot().await.notice.as_ref(), result)
        }
        AlbumCommand::Common(common) => {
            let ctl = ctx.controller::<Album>(Route::Albums)?;
            run_common(&ctl, common).await
        }
        AlbumCommand::Create {
            text,
            category,
            thumbnail,
        } => {
            let ctl = ctx.controller::<Album>(Route::Albums)?;
            let category = resolve_category(ctx, ctl.session(), &category).await?;
            let (title, description) = draft_text(&text);
            let draft = AlbumDraft::new(title, description, text.slug, category);
            let files = attachments([(AttachmentKind::Thumbnail, thumbnail.as_deref())]).await?;
            ctl.open_create().await;
            settle(&ctl, ctl.create(draft, files).await).await
        }
        AlbumCommand::Update { id, text, category } => {
            let ctl = ctx.controller::<Album>(Route::Albums)?;
            let category = match category {
                Some(key) => Some(resolve_category(ctx, ctl.session(), &key).await?),
                None => None,
            };
            let (title, description, slug) = patch_text(text);
            let patch = AlbumPatch {
                title,
                description,
                slug,
                category,
            };
            ctl.open_edit(id.clone()).await;
            settle(&ctl, ctl.update(&id, patch).await).await
        }
    }
}

async fn audios(ctx: &Context, action: AudioCommand) -> anyhow::Result<()> {
    let ctl = ctx.controller::<Audio>(Route::Podcasts)?;
    match action {
        AudioCommand::Common(common) => run_common(&ctl, common).await,
        AudioCommand::Create { text, flags } => {
            let (draft, files) = audio_draft(&text, &flags).await?;
            ctl.open_create().await;
            settle(&ctl, ctl.create(draft, files).await).await
        }
        AudioCommand::Update {
            id,
            text,
            free,
            published,
        } => {
            let (title, description, slug) = patch_text(text);
            let patch = AudioPatch {
                title,
                description,
                slug,
                is_free: free,
                published,
            };
            ctl.open_edit(id.clone()).await;
            settle(&ctl, ctl.update(&id, patch).await).await
        }
        AudioCommand::Play { id } => {
            let url = ctx.api.play_url(ctl.session(), &id).await.map_err(report)?;
            println!("{url}");
            Ok(())
        }
    }
}

async fn run_common<R: Card>(
    ctl: &ResourceController<R, CatalogApi>,
    command: CommonCommand,
) -> anyhow::Result<()> {
    match command {
        CommonCommand::List(args) => {
            let result = match args.offset {
                Some(offset) => ctl.search_page(&args.search, offset).await,
                None => ctl.fetch(&args.search).await,
            };
            result.map_err(report)?;
            println!("{}", render::list(&ctl.items().await));
            Ok(())
        }
        CommonCommand::Delete { id } => {
            ctl.open_delete(id.clone()).await;
            settle(ctl, ctl.remove(&id).await).await
        }
        CommonCommand::Thumbnail { id, file } => {
            ctl.open_thumbnail(id.clone()).await;
            let thumbnail = match file {
                Some(path) => Some(read_attachment(AttachmentKind::Thumbnail, &path).await?),
                None => {
                    println!("No file given; thumbnail left unchanged");
                    None
                }
            };
            settle(ctl, ctl.update_thumbnail(&id, thumbnail).await).await
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn settle<R: Card>(
    ctl: &ResourceController<R, CatalogApi>,
    result: Result<(), ClientError>,
) -> anyhow::Result<()> {
    print_outcome(ctl.notice().await.as_ref(), result)
}

fn print_outcome(
    notice: Option<&Notice>,
    result: Result<(), ClientError>,
) -> anyhow::Result<()> {
    match result {
        Ok(()) => {
            if let Some(notice) = notice {
                println!("{}", render::notice(notice));
            }
            Ok(())
        }
        Err(err) => Err(report(err)),
    }
}

async fn album_detail(ctx: &Context, slug: &str) -> anyhow::Result<AlbumDetailController> {
    let session = ctx.session(Route::AlbumDetail {
        slug: slug.to_string(),
    })?;
    let detail = AlbumDetailController::new(ctx.api.clone(), session);
    detail.load(slug).await.map_err(report)?;
    if detail.snapshot().await.not_found {
        bail!("Not Found: no album with slug '{slug}'");
    }
    Ok(detail)
}

/// Accept a category id or slug and return the id.
async fn resolve_category(ctx: &Context, session: &Session, key: &str) -> anyhow::Result<String> {
    let categories: Vec<Category> = ctx
        .api
        .list(session, &ListQuery::default())
        .await
        .map_err(report)?;
    match categories.iter().find(|c| c.id == key || c.slug == key) {
        Some(category) => Ok(category.id.clone()),
        None => bail!("Unknown category '{key}'"),
    }
}

fn draft_text(text: &DraftText) -> (Bilingual, Bilingual) {
    (
        Bilingual::new(text.title_en.as_str(), text.title_ar.as_str()),
        Bilingual::new(text.description_en.as_str(), text.description_ar.as_str()),
    )
}

fn patch_text(text: PatchText) -> (Option<Bilingual>, Option<Bilingual>, Option<String>) {
    let title = text.title_en.zip(text.title_ar).map(|(en, ar)| Bilingual::new(en, ar));
    let description = text
        .description_en
        .zip(text.description_ar)
        .map(|(en, ar)| Bilingual::new(en, ar));
    (title, description, text.slug)
}

async fn audio_draft(
    text: &DraftText,
    flags: &AudioFlags,
) -> anyhow::Result<(AudioDraft, Vec<Attachment>)> {
    let (title, description) = draft_text(text);
    let draft = AudioDraft::new(title, description, text.slug.as_str())
        .free(flags.free)
        .published(flags.published);
    let files = attachments([
        (AttachmentKind::Audio, flags.audio.as_deref()),
        (AttachmentKind::Thumbnail, flags.thumbnail.as_deref()),
    ])
    .await?;
    Ok((draft, files))
}

async fn attachments<const N: usize>(
    files: [(AttachmentKind, Option<&Path>); N],
) -> anyhow::Result<Vec<Attachment>> {
    let mut out = Vec::new();
    for (kind, path) in files {
        if let Some(path) = path {
            out.push(read_attachment(kind, path).await?);
        }
    }
    Ok(out)
}

async fn read_attachment(kind: AttachmentKind, path: &Path) -> anyhow::Result<Attachment> {
    Attachment::from_path(kind, path).await.map_err(report)
}
