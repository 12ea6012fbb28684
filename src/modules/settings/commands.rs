use super::lists::{MAX_SELECTED, build_list_menus};
use crate::db::entities::user_preferences::{ChatRestriction, CommandAccess, SoundboardRestriction};
use crate::services::gateway::DiscordGateway;
use crate::services::localization::ContextL10nExt;
use crate::services::preferences::PreferenceUpdate;
use crate::services::relations::{RelationChange, RelationKind};
use crate::{Context, Error};
use fluent::FluentArgs;
use poise::ChoiceParameter as _;
use poise::serenity_prelude as serenity;
use tracing::warn;

/// Mentions listed by `/settings show` per relation.
const MAX_LISTED: usize = 20;

/// Your preferences for the rooms you own
#[poise::command(
    slash_command,
    guild_only,
    subcommands(
        "show",
        "chat",
        "soundboard",
        "commands",
        "trust",
        "untrust",
        "block",
        "unblock",
        "lists",
        "rules"
    ),
    install_context = "Guild",
    interaction_context = "Guild"
)]
pub async fn settings(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

async fn reply(ctx: Context<'_>, content: String) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Pushes the author's changed settings into every room they own here.
async fn refresh_owned_rooms(ctx: Context<'_>, guild_id: serenity::GuildId) {
    let gateway = DiscordGateway::from_context(ctx.serenity_context());
    if let Err(e) = ctx
        .data()
        .rooms
        .reevaluate_owned_rooms(&gateway, guild_id, ctx.author().id)
        .await
    {
        warn!(
            "Re-evaluating rooms of {} in {} failed: {:?}",
            ctx.author().id,
            guild_id,
            e
        );
    }
}

async fn update_preference(
    ctx: Context<'_>,
    update: PreferenceUpdate,
    mode: &'static str,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or_else(|| anyhow::anyhow!("guild only"))?;
    let l10n = ctx.l10n_user();

    ctx.data()
        .rooms
        .preferences()
        .update(ctx.author().id, guild_id, update)
        .await?;
    refresh_owned_rooms(ctx, guild_id).await;

    let mut args = FluentArgs::new();
    args.set("mode", mode);
    reply(ctx, l10n.t("settings-updated", Some(&args))).await
}

fn mentions(users: &[serenity::UserId], none: String) -> String {
    if users.is_empty() {
        return none;
    }
    let mut listed: Vec<String> = users
        .iter()
        .take(MAX_LISTED)
        .map(|u| format!("<@{}>", u))
        .collect();
    if users.len() > MAX_LISTED {
        listed.push(format!("+{}", users.len() - MAX_LISTED));
    }
    listed.join(", ")
}

/// Show your current room settings
#[poise::command(slash_command, guild_only)]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or_else(|| anyhow::anyhow!("guild only"))?;
    let owner_id = ctx.author().id;
    let l10n = ctx.l10n_user();
    let rooms = &ctx.data().rooms;

    let prefs = rooms.preferences().get(owner_id, guild_id).await?;
    let chat = prefs.as_ref().map(|p| p.chat_restriction).unwrap_or_default();
    let soundboard = prefs
        .as_ref()
        .map(|p| p.soundboard_restriction)
        .unwrap_or_default();
    let access = prefs.as_ref().map(|p| p.command_access).unwrap_or_default();

    let trusted = rooms
        .relations()
        .list(RelationKind::Trust, owner_id, guild_id)
        .await?;
    let blocked = rooms
        .relations()
        .list(RelationKind::Block, owner_id, guild_id)
        .await?;

    let mut args = FluentArgs::new();
    args.set("chat", chat.name());
    args.set("soundboard", soundboard.name());
    args.set("access", access.name());
    args.set("trustedCount", trusted.len());
    args.set("blockedCount", blocked.len());
    args.set("trusted", mentions(&trusted, l10n.t("settings-none", None)));
    args.set("blocked", mentions(&blocked, l10n.t("settings-none", None)));

    ctx.send(
        poise::CreateReply::default()
            .content(l10n.t("settings-show", Some(&args)))
            .allowed_mentions(serenity::CreateAllowedMentions::new())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Choose when everyone may chat in your rooms
#[poise::command(slash_command, guild_only)]
pub async fn chat(
    ctx: Context<'_>,
    #[description = "Chat restriction"] mode: ChatRestriction,
) -> Result<(), Error> {
    update_preference(ctx, PreferenceUpdate::Chat(mode), mode.name()).await
}

/// Choose who may use the soundboard in your rooms
#[poise::command(slash_command, guild_only)]
pub async fn soundboard(
    ctx: Context<'_>,
    #[description = "Soundboard restriction"] mode: SoundboardRestriction,
) -> Result<(), Error> {
    update_preference(ctx, PreferenceUpdate::Soundboard(mode), mode.name()).await
}

/// Choose who may use /group commands in your rooms
#[poise::command(slash_command, guild_only)]
pub async fn commands(
    ctx: Context<'_>,
    #[description = "Who may manage your rooms"] mode: CommandAccess,
) -> Result<(), Error> {
    update_preference(ctx, PreferenceUpdate::CommandAccess(mode), mode.name()).await
}

async fn add_relation(
    ctx: Context<'_>,
    kind: RelationKind,
    user: serenity::User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or_else(|| anyhow::anyhow!("guild only"))?;
    let l10n = ctx.l10n_user();

    let change = ctx
        .data()
        .rooms
        .relations()
        .add(kind, ctx.author().id, guild_id, user.id)
        .await?;

    let key = match (kind, change) {
        (_, RelationChange::SelfTarget) => "relation-self",
        (RelationKind::Trust, RelationChange::Added) => "trust-added",
        (RelationKind::Trust, RelationChange::Unchanged) => "trust-exists",
        (RelationKind::Block, RelationChange::Added) => "block-added",
        (RelationKind::Block, RelationChange::Unchanged) => "block-exists",
    };
    if change == RelationChange::Added {
        refresh_owned_rooms(ctx, guild_id).await;
    }

    let mut args = FluentArgs::new();
    args.set("user", format!("<@{}>", user.id));
    reply(ctx, l10n.t(key, Some(&args))).await
}

async fn remove_relation(
    ctx: Context<'_>,
    kind: RelationKind,
    user: serenity::User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or_else(|| anyhow::anyhow!("guild only"))?;
    let l10n = ctx.l10n_user();

    let removed = ctx
        .data()
        .rooms
        .relations()
        .remove(kind, ctx.author().id, guild_id, user.id)
        .await?;

    let key = match (kind, removed) {
        (RelationKind::Trust, true) => "untrust-done",
        (RelationKind::Trust, false) => "untrust-missing",
        (RelationKind::Block, true) => "unblock-done",
        (RelationKind::Block, false) => "unblock-missing",
    };
    if removed {
        refresh_owned_rooms(ctx, guild_id).await;
    }

    let mut args = FluentArgs::new();
    args.set("user", format!("<@{}>", user.id));
    reply(ctx, l10n.t(key, Some(&args))).await
}

/// Let a user chat and move members in your rooms
#[poise::command(slash_command, guild_only)]
pub async fn trust(
    ctx: Context<'_>,
    #[description = "User to trust"] user: serenity::User,
) -> Result<(), Error> {
    add_relation(ctx, RelationKind::Trust, user).await
}

/// Remove a user from your trusted list
#[poise::command(slash_command, guild_only)]
pub async fn untrust(
    ctx: Context<'_>,
    #[description = "User to remove"] user: serenity::User,
) -> Result<(), Error> {
    remove_relation(ctx, RelationKind::Trust, user).await
}

/// Keep a user out of your rooms
#[poise::command(slash_command, guild_only)]
pub async fn block(
    ctx: Context<'_>,
    #[description = "User to block"] user: serenity::User,
) -> Result<(), Error> {
    add_relation(ctx, RelationKind::Block, user).await
}

/// Remove a user from your blocked list
#[poise::command(slash_command, guild_only)]
pub async fn unblock(
    ctx: Context<'_>,
    #[description = "User to unblock"] user: serenity::User,
) -> Result<(), Error> {
    remove_relation(ctx, RelationKind::Block, user).await
}

/// Edit your trusted and blocked lists with user pickers
#[poise::command(slash_command, guild_only)]
pub async fn lists(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or_else(|| anyhow::anyhow!("guild only"))?;
    let owner_id = ctx.author().id;
    let l10n = ctx.l10n_user();
    let relations = ctx.data().rooms.relations();

    let trusted = relations.list(RelationKind::Trust, owner_id, guild_id).await?;
    let blocked = relations.list(RelationKind::Block, owner_id, guild_id).await?;

    // A menu cannot show more users than it holds, and submitting it would
    // drop the rest.
    let max = usize::from(MAX_SELECTED);
    if trusted.len() > max || blocked.len() > max {
        let mut args = FluentArgs::new();
        args.set("max", max);
        return reply(ctx, l10n.t("settings-lists-too-long", Some(&args))).await;
    }

    ctx.send(
        poise::CreateReply::default()
            .flags(serenity::MessageFlags::IS_COMPONENTS_V2)
            .components(build_list_menus(&l10n, &trusted, &blocked))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Set or clear the rules posted in rooms you open from a creator channel
#[poise::command(slash_command, guild_only)]
pub async fn rules(
    ctx: Context<'_>,
    #[description = "Creator channel the rules apply to"]
    #[channel_types("Voice")]
    channel: serenity::GuildChannel,
    #[description = "Rules text; leave empty to clear"]
    #[max_length = 1500]
    text: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or_else(|| anyhow::anyhow!("guild only"))?;
    let l10n = ctx.l10n_user();
    let rooms = &ctx.data().rooms;

    if rooms.registry().creator(channel.id).await?.is_none() {
        return reply(ctx, l10n.t("rules-not-creator", None)).await;
    }

    rooms
        .preferences()
        .set_rules(ctx.author().id, guild_id, channel.id, text.as_deref())
        .await?;

    let key = if text.as_deref().is_some_and(|t| !t.trim().is_empty()) {
        "rules-saved"
    } else {
        "rules-cleared"
    };
    let mut args = FluentArgs::new();
    args.set("channel", format!("<#{}>", channel.id));
    reply(ctx, l10n.t(key, Some(&args))).await
}
