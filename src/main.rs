use std::{io::Write, process, sync::Arc};

use postdown::{
    application::{
        Extensions, archive,
        error::AppError,
        feed::{FeedDefaults, FeedService, FeedSettings},
        negotiation::Negotiator,
        render::ContentConverter,
        resource::ResourceRenderer,
        syndication::SyndicationService,
    },
    cache::{CacheConfig, FeedCache, MemoryCacheStore},
    config,
    domain::entities::SiteSettingsRecord,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        memory::MemoryContentStore,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let app = build_application_context(&settings)?;

    match command {
        config::Command::Serve(_) => serve_http(&settings, app.http_state).await,
        config::Command::Feed(_) => {
            let markdown = app.feed.markdown_feed().await?;
            write_stdout(&markdown)
        }
        config::Command::Render(args) => run_render(&app, &args).await,
    }
}

struct ApplicationContext {
    http_state: HttpState,
    feed: Arc<FeedService>,
    renderer: Arc<ResourceRenderer>,
}

fn build_application_context(settings: &config::Settings) -> Result<ApplicationContext, AppError> {
    let store = Arc::new(MemoryContentStore::new(SiteSettingsRecord::from(
        &settings.site,
    )));
    archive::load_into(
        &store,
        &settings.content.archive,
        SiteSettingsRecord::from(&settings.site),
    )?;

    let extensions = Extensions::new();
    let converter = ContentConverter::new(settings.conversion.clone(), extensions.clone());
    let feed_settings = Arc::new(FeedSettings::new(
        FeedDefaults::from(&settings.feed),
        extensions.clone(),
    ));

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = FeedCache::new(
        Arc::new(MemoryCacheStore::new(&cache_config)),
        cache_config.namespace.clone(),
    );

    let feed = Arc::new(FeedService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        converter.clone(),
        cache,
        feed_settings.clone(),
        extensions.clone(),
    ));
    let renderer = Arc::new(ResourceRenderer::new(
        store.clone(),
        store.clone(),
        store.clone(),
        converter.clone(),
    ));
    let syndication = Arc::new(SyndicationService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        converter,
        feed_settings,
    ));
    let negotiator = Arc::new(Negotiator::new(
        settings.negotiation.allowed_types.clone(),
        extensions,
    ));

    let http_state = HttpState {
        negotiator,
        feed: feed.clone(),
        renderer: renderer.clone(),
        syndication,
        resources: store.clone(),
        site: store,
    };

    Ok(ApplicationContext {
        http_state,
        feed,
        renderer,
    })
}

async fn run_render(app: &ApplicationContext, args: &config::RenderArgs) -> Result<(), AppError> {
    let resource = app.renderer.find(&args.slug).await?.ok_or(AppError::NotFound)?;

    let markdown = if args.comments {
        app.renderer.render_resource_with_comments(&resource).await?
    } else {
        app.renderer.render_resource(&resource).await?
    };
    write_stdout(&markdown)
}

fn write_stdout(text: &str) -> Result<(), AppError> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|err| AppError::from(InfraError::from(err)))
}

async fn serve_http(settings: &config::Settings, http_state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(http_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "postdown::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal());
    let grace = settings.server.graceful_shutdown;

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        () = async {
            shutdown_signal().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target = "postdown::serve",
                grace_seconds = grace.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "postdown::serve", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            target = "postdown::serve",
            error = %err,
            "Failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
