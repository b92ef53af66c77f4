use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use sonequabot_core::eventbus::EventBus;
use sonequabot_core::platforms::overlay_hub::OverlayHubClient;
use sonequabot_core::platforms::twitch_irc::TwitchIrcPlatform;
use sonequabot_core::platforms::{ChatTransport, NotificationSink};
use sonequabot_core::services::builtin_commands::default_registry;
use sonequabot_core::services::sentiment::{
    AzureTextAnalyticsClassifier, LexiconClassifier, SentimentClassifier, SentimentPipeline,
};
use sonequabot_core::services::{ChatEventHandler, MessageService, PresenceTracker};
use sonequabot_core::Error;

mod config;
use config::{BotConfig, ClassifierKind};

fn init_tracing() {
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("log bridge not installed: {}", e);
    }
    let filter = EnvFilter::from_default_env()
        .add_directive("sonequabot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {}", e);
    }
}

fn build_classifier(config: &BotConfig) -> Result<Arc<dyn SentimentClassifier>, Error> {
    let classifier: Arc<dyn SentimentClassifier> = match config.classifier {
        ClassifierKind::Lexicon => Arc::new(LexiconClassifier::new()),
        ClassifierKind::Azure => Arc::new(AzureTextAnalyticsClassifier::new(config.azure_config()?)?),
    };
    Ok(classifier)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = BotConfig::parse();
    config.validate().context("invalid configuration")?;
    let channel = config.channel();
    info!(
        "SonequaBot starting. channel=#{}, hub={}, classifier={:?}",
        channel, config.hub_url, config.classifier
    );

    let bus = Arc::new(EventBus::new());

    let (overlay, overlay_task) = OverlayHubClient::spawn(config.overlay_config(), bus.shutdown_rx.clone());
    let sink: Arc<dyn NotificationSink> = Arc::new(overlay);

    let classifier = build_classifier(&config).context("could not build the sentiment classifier")?;
    info!("Sentiment classifier => {}", classifier.name());

    // subscribe before joining so the JOIN acknowledgement is not missed
    let rx = bus.subscribe(None).await;

    let mut platform = TwitchIrcPlatform::new(config.credentials(), &channel, bus.clone());
    platform.connect().await.context("could not connect to Twitch IRC")?;
    let platform = Arc::new(platform);
    let transport: Arc<dyn ChatTransport> = platform.clone();

    let pipeline = SentimentPipeline::new(classifier, sink.clone());
    let messages = MessageService::new(default_registry(), pipeline, transport.clone(), sink.clone())
        .with_ignored_users(config.ignored_users());
    let presence = Arc::new(PresenceTracker::new(sink));
    let handler = ChatEventHandler::new(messages, presence, transport).with_greeting(&config.greeting);
    let handler_task = tokio::spawn(handler.run(rx, bus.shutdown_rx.clone()));

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Could not listen for Ctrl-C => {}", e);
    }
    info!("Shutdown requested.");
    bus.shutdown();

    if let Err(e) = handler_task.await {
        error!("Chat handler task failed => {}", e);
    }
    match Arc::try_unwrap(platform) {
        Ok(mut platform) => platform.disconnect().await?,
        Err(_) => warn!("Twitch IRC connection still in use; dropping it"),
    }
    if let Err(e) = overlay_task.await {
        error!("Overlay hub task failed => {}", e);
    }

    info!("Main finished. Goodbye!");
    Ok(())
}
