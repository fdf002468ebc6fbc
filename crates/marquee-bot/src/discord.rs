//! Serenity glue: command registration, interaction dispatch and rendering of
//! [`Reply`] values.

use std::sync::Arc;

use marquee_core::{
  catalog::Catalog,
  movie::{GuildId, MovieId, UserId},
  store::RatingsStore,
};
use serenity::{
  async_trait,
  builder::{CreateApplicationCommands, CreateComponents},
  client::{Context, EventHandler},
  model::{
    application::{
      command::{Command, CommandOptionType},
      component::ButtonStyle,
      interaction::{
        application_command::ApplicationCommandInteraction,
        message_component::MessageComponentInteraction, Interaction, InteractionResponseType,
      },
    },
    gateway::Ready,
    id,
  },
};

use crate::{
  commands::{self, Reply},
  controls,
  error::{Error, Result},
  format, App,
};

// ─── Command definitions ──────────────────────────────────────────────────────

const START: &str = "start";
const MOVIE: &str = "movie";
const TOP: &str = "top";

fn define_commands(commands: &mut CreateApplicationCommands) -> &mut CreateApplicationCommands {
  commands
    .create_application_command(|c| {
      c.name(START).description("Start watching a movie").create_option(|o| {
        o.name("name")
          .description("The name or IMDb link of the movie")
          .kind(CommandOptionType::String)
          .required(true)
      })
    })
    .create_application_command(|c| {
      c.name(MOVIE).description("Show a movie's ratings in this server").create_option(|o| {
        o.name("query")
          .description("The exact title or IMDb link of the movie")
          .kind(CommandOptionType::String)
          .required(true)
      })
    })
    .create_application_command(|c| {
      c.name(TOP).description("Show this server's top-rated movies").create_option(|o| {
        o.name("limit")
          .description("How many movies to list")
          .kind(CommandOptionType::Integer)
          .min_int_value(1)
          .max_int_value(25)
          .required(false)
      })
    })
}

/// Register the slash commands for one guild, or globally.
async fn register(ctx: &Context, guild_id: Option<u64>) -> Result<usize> {
  let registered = match guild_id {
    Some(guild) => id::GuildId(guild).set_application_commands(&ctx.http, define_commands).await?,
    None => Command::set_global_application_commands(&ctx.http, define_commands).await?,
  };
  Ok(registered.len())
}

// ─── Handler ──────────────────────────────────────────────────────────────────

/// Serenity event handler dispatching interactions to [`commands`].
pub struct Handler<S: RatingsStore, C: Catalog> {
  app: Arc<App<S, C>>,
}

impl<S: RatingsStore, C: Catalog> Handler<S, C> {
  pub fn new(app: Arc<App<S, C>>) -> Self { Self { app } }

  async fn on_command(&self, ctx: &Context, command: &ApplicationCommandInteraction) -> Result<()> {
    let Some(guild) = command.guild_id else {
      return respond(ctx, command, Reply::private(format::GUILD_ONLY)).await;
    };
    let guild_id = GuildId(guild.0);
    let app = &self.app;

    match command.data.name.as_str() {
      START => {
        let name = string_option(command, "name").unwrap_or_default();
        // The catalog can be slow; acknowledge first, answer in a follow-up.
        command
          .create_interaction_response(&ctx.http, |r| {
            r.kind(InteractionResponseType::DeferredChannelMessageWithSource)
          })
          .await?;
        let reply = match commands::start(&app.store, &app.catalog, guild_id, &name).await {
          Ok(reply) => reply,
          Err(e) => {
            tracing::error!(error = %e, %guild_id, name = %name, "start failed");
            Reply::text(format::FAILURE)
          }
        };
        follow_up(ctx, command, reply).await
      }
      MOVIE => {
        let query = string_option(command, "query").unwrap_or_default();
        let reply = commands::show_movie(&app.store, guild_id, &query).await;
        respond(ctx, command, or_failure(reply, "movie")).await
      }
      TOP => {
        let limit = integer_option(command, "limit")
          .and_then(|n| usize::try_from(n).ok())
          .map_or(app.config.leaderboard_limit(), |n| n.clamp(1, app.config.leaderboard_limit()));
        let reply = commands::top(&app.store, guild_id, limit).await;
        respond(ctx, command, or_failure(reply, "top")).await
      }
      other => {
        tracing::warn!(command = other, "unknown command");
        Ok(())
      }
    }
  }

  async fn on_component(&self, ctx: &Context, component: &MessageComponentInteraction) -> Result<()> {
    let reply = commands::rate(
      &self.app.store,
      component.guild_id.map(|guild| GuildId(guild.0)),
      UserId(component.user.id.0),
      &component.data.custom_id,
    )
    .await;

    match reply {
      Ok(None) => Ok(()),
      Ok(Some(reply)) => respond_component(ctx, component, reply).await,
      Err(e) => {
        tracing::error!(error = %e, custom_id = %component.data.custom_id, "rating failed");
        respond_component(ctx, component, Reply::private(format::FAILURE)).await
      }
    }
  }
}

#[async_trait]
impl<S, C> EventHandler for Handler<S, C>
where
  S: RatingsStore + 'static,
  C: Catalog + 'static,
{
  async fn ready(&self, ctx: Context, ready: Ready) {
    tracing::info!(user = %ready.user.name, "connected to Discord");

    // Failing to register is not fatal: commands from an earlier run stay
    // registered with Discord.
    let guild_id = self.app.config.guild_id;
    match register(&ctx, guild_id).await {
      Ok(count) => match guild_id {
        Some(guild) => tracing::info!(count, guild, "registered commands for guild"),
        None => tracing::info!(count, "registered commands globally"),
      },
      Err(e) => tracing::error!(error = %e, "failed to register commands"),
    }
  }

  async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
    let outcome = match &interaction {
      Interaction::ApplicationCommand(command) => self.on_command(&ctx, command).await,
      Interaction::MessageComponent(component) => self.on_component(&ctx, component).await,
      _ => Ok(()),
    };
    if let Err(e) = outcome {
      tracing::error!(error = %e, "failed to answer interaction");
    }
  }
}

// ─── Rendering ────────────────────────────────────────────────────────────────

fn or_failure(reply: Result<Reply>, command: &str) -> Reply {
  reply.unwrap_or_else(|e: Error| {
    tracing::error!(error = %e, command, "command failed");
    Reply::text(format::FAILURE)
  })
}

fn rating_components(components: &mut CreateComponents, movie_id: MovieId) -> &mut CreateComponents {
  for row in controls::rating_rows(movie_id) {
    components.create_action_row(|action_row| {
      for button in &row {
        action_row.create_button(|b| {
          b.custom_id(&button.custom_id).label(&button.label).style(ButtonStyle::Primary)
        });
      }
      action_row
    });
  }
  components
}

async fn respond(ctx: &Context, command: &ApplicationCommandInteraction, reply: Reply) -> Result<()> {
  command
    .create_interaction_response(&ctx.http, |r| {
      r.kind(InteractionResponseType::ChannelMessageWithSource)
        .interaction_response_data(|d| {
          d.content(&reply.content).ephemeral(reply.ephemeral);
          if let Some(movie_id) = reply.controls {
            d.components(|c| rating_components(c, movie_id));
          }
          d
        })
    })
    .await?;
  Ok(())
}

async fn follow_up(ctx: &Context, command: &ApplicationCommandInteraction, reply: Reply) -> Result<()> {
  command
    .create_followup_message(&ctx.http, |m| {
      m.content(&reply.content).ephemeral(reply.ephemeral);
      if let Some(movie_id) = reply.controls {
        m.components(|c| rating_components(c, movie_id));
      }
      m
    })
    .await?;
  Ok(())
}

async fn respond_component(
  ctx: &Context,
  component: &MessageComponentInteraction,
  reply: Reply,
) -> Result<()> {
  component
    .create_interaction_response(&ctx.http, |r| {
      r.kind(InteractionResponseType::ChannelMessageWithSource)
        .interaction_response_data(|d| d.content(&reply.content).ephemeral(reply.ephemeral))
    })
    .await?;
  Ok(())
}

// ─── Options ──────────────────────────────────────────────────────────────────

fn string_option(command: &ApplicationCommandInteraction, name: &str) -> Option<String> {
  command
    .data
    .options
    .iter()
    .find(|o| o.name == name)
    .and_then(|o| o.value.as_ref())
    .and_then(|v| v.as_str())
    .map(str::to_owned)
}

fn integer_option(command: &ApplicationCommandInteraction, name: &str) -> Option<i64> {
  command
    .data
    .options
    .iter()
    .find(|o| o.name == name)
    .and_then(|o| o.value.as_ref())
    .and_then(|v| v.as_i64())
}
