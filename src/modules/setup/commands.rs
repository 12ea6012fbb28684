use crate::db::entities::platform_roles::Platform;
use crate::services::gateway::DiscordGateway;
use crate::services::localization::ContextL10nExt;
use crate::{Context, Error};
use fluent::FluentArgs;
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

/// Server configuration for temporary voice rooms
#[poise::command(
    slash_command,
    guild_only,
    subcommands("creator", "platform_role", "staff"),
    install_context = "Guild",
    interaction_context = "Guild",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn setup(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

async fn reply(ctx: Context<'_>, content: String) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .allowed_mentions(serenity::CreateAllowedMentions::new())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

fn guild_id(ctx: Context<'_>) -> Result<serenity::GuildId, Error> {
    ctx.guild_id().ok_or_else(|| anyhow::anyhow!("guild only"))
}

/// Manage the channels that open a room when joined
#[poise::command(
    slash_command,
    guild_only,
    subcommands("creator_create", "creator_message", "creator_list", "creator_remove"),
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn creator(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Turn a voice channel into a creator channel, or update its settings
#[poise::command(
    slash_command,
    guild_only,
    rename = "create",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn creator_create(
    ctx: Context<'_>,
    #[description = "Voice channel members join to get a room"]
    #[channel_types("Voice")]
    channel: serenity::GuildChannel,
    #[description = "Room name, e.g. {USER}'s Channel [{PLATFORM:-Any}]"]
    #[max_length = 100]
    template: Option<String>,
    #[description = "Default user limit, 0 for unlimited"]
    #[min = 0]
    #[max = 99]
    limit: Option<u32>,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let l10n = ctx.l10n_user();

    let creator = ctx
        .data()
        .rooms
        .registry()
        .upsert_creator(channel.id, guild_id, template, limit.unwrap_or(0))
        .await?;
    info!(
        "Creator channel {} configured in guild {} by {}",
        channel.id,
        guild_id,
        ctx.author().id
    );

    let mut args = FluentArgs::new();
    args.set("channel", format!("<#{}>", channel.id));
    args.set("template", creator.name_template);
    args.set("limit", creator.limit());
    reply(ctx, l10n.t("creator-saved", Some(&args))).await
}

/// Set or clear the welcome message posted in new rooms
#[poise::command(
    slash_command,
    guild_only,
    rename = "message",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn creator_message(
    ctx: Context<'_>,
    #[description = "Creator channel"]
    #[channel_types("Voice")]
    channel: serenity::GuildChannel,
    #[description = "Message text; {OWNER_MENTION} mentions the owner. Empty restores the default"]
    #[max_length = 1500]
    text: Option<String>,
) -> Result<(), Error> {
    let l10n = ctx.l10n_user();
    let cleared = text.as_deref().is_none_or(|t| t.trim().is_empty());

    let found = ctx
        .data()
        .rooms
        .registry()
        .set_welcome_message(channel.id, text)
        .await?;

    let key = match (found, cleared) {
        (false, _) => "creator-not-found",
        (true, true) => "creator-message-cleared",
        (true, false) => "creator-message-saved",
    };
    let mut args = FluentArgs::new();
    args.set("channel", format!("<#{}>", channel.id));
    reply(ctx, l10n.t(key, Some(&args))).await
}

/// List the creator channels of this server
#[poise::command(
    slash_command,
    guild_only,
    rename = "list",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn creator_list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let l10n = ctx.l10n_user();

    let creators = ctx
        .data()
        .rooms
        .registry()
        .creators_in_guild(guild_id)
        .await?;
    if creators.is_empty() {
        return reply(ctx, l10n.t("creator-list-empty", None)).await;
    }

    let lines: Vec<String> = creators
        .iter()
        .map(|c| {
            let mut args = FluentArgs::new();
            args.set("channel", format!("<#{}>", c.channel_id()));
            args.set("template", c.name_template.clone());
            args.set("limit", c.limit());
            l10n.t("creator-list-entry", Some(&args))
        })
        .collect();

    let mut args = FluentArgs::new();
    args.set("entries", lines.join("\n"));
    reply(ctx, l10n.t("creator-list", Some(&args))).await
}

/// Stop a channel from creating rooms
#[poise::command(
    slash_command,
    guild_only,
    rename = "remove",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn creator_remove(
    ctx: Context<'_>,
    #[description = "Creator channel"]
    #[channel_types("Voice")]
    channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let l10n = ctx.l10n_user();
    let removed = ctx
        .data()
        .rooms
        .registry()
        .remove_creator(channel.id)
        .await?;

    let key = if removed {
        "creator-removed"
    } else {
        "creator-not-found"
    };
    let mut args = FluentArgs::new();
    args.set("channel", format!("<#{}>", channel.id));
    reply(ctx, l10n.t(key, Some(&args))).await
}

/// Tag rooms of members with a role as a platform
#[poise::command(
    slash_command,
    guild_only,
    rename = "platform",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn platform_role(
    ctx: Context<'_>,
    #[description = "Platform"] platform: Platform,
    #[description = "Role that marks members on this platform"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let l10n = ctx.l10n_user();

    ctx.data()
        .rooms
        .relations()
        .set_platform_role(guild_id, role.id, platform)
        .await?;

    let mut args = FluentArgs::new();
    args.set("role", format!("<@&{}>", role.id));
    args.set("platform", platform.label());
    reply(ctx, l10n.t("platform-role-set", Some(&args))).await
}

/// Manage roles that are never locked out of rooms
#[poise::command(
    slash_command,
    guild_only,
    subcommands("staff_add", "staff_remove", "staff_list"),
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn staff(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Rooms are re-applied so a changed staff set takes effect right away.
async fn refresh_rooms(ctx: Context<'_>, guild_id: serenity::GuildId) {
    let gateway = DiscordGateway::from_context(ctx.serenity_context());
    if let Err(e) = ctx.data().rooms.reevaluate_guild(&gateway, guild_id).await {
        warn!("Re-evaluating rooms in {} failed: {:?}", guild_id, e);
    }
}

/// Add a staff role
#[poise::command(
    slash_command,
    guild_only,
    rename = "add",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn staff_add(
    ctx: Context<'_>,
    #[description = "Role"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let l10n = ctx.l10n_user();

    let added = ctx
        .data()
        .rooms
        .relations()
        .add_staff_role(guild_id, role.id)
        .await?;
    if added {
        refresh_rooms(ctx, guild_id).await;
    }

    let mut args = FluentArgs::new();
    args.set("role", format!("<@&{}>", role.id));
    let key = if added { "staff-added" } else { "staff-exists" };
    reply(ctx, l10n.t(key, Some(&args))).await
}

/// Remove a staff role
#[poise::command(
    slash_command,
    guild_only,
    rename = "remove",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn staff_remove(
    ctx: Context<'_>,
    #[description = "Role"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let l10n = ctx.l10n_user();

    let removed = ctx
        .data()
        .rooms
        .relations()
        .remove_staff_role(guild_id, role.id)
        .await?;
    if removed {
        refresh_rooms(ctx, guild_id).await;
    }

    let mut args = FluentArgs::new();
    args.set("role", format!("<@&{}>", role.id));
    let key = if removed { "staff-removed" } else { "staff-missing" };
    reply(ctx, l10n.t(key, Some(&args))).await
}

/// List staff roles
#[poise::command(
    slash_command,
    guild_only,
    rename = "list",
    default_member_permissions = "ADMINISTRATOR"
)]
pub async fn staff_list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id(ctx)?;
    let l10n = ctx.l10n_user();

    let mut roles: Vec<serenity::RoleId> = ctx
        .data()
        .rooms
        .relations()
        .staff_roles(guild_id)
        .await?
        .into_iter()
        .collect();
    if roles.is_empty() {
        return reply(ctx, l10n.t("staff-list-empty", None)).await;
    }
    roles.sort();

    let mentions: Vec<String> = roles.iter().map(|r| format!("<@&{}>", r)).collect();
    let mut args = FluentArgs::new();
    args.set("roles", mentions.join(", "));
    reply(ctx, l10n.t("staff-list", Some(&args))).await
}
