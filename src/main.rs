use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use woki_dj::{Data, Error, config::Config};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("woki_dj=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Config::from_env()?;
    info!("Loaded configuration: {:?}", config);

    let token = config.discord_token.clone();
    let prefix = config.command_prefix.clone();
    let status = woki_dj::status_line(&prefix);

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: woki_dj::commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                ctx.set_activity(Some(serenity::ActivityData::playing(status)));
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(Data::new(config))
            })
        });

    let mut client = ClientBuilder::new(token, intents)
        .framework(framework.build())
        .register_songbird()
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down");
                shard_manager.shutdown_all().await;
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    client.start().await.map_err(Into::into)
}
