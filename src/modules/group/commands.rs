use crate::db::entities::platform_roles::Platform;
use crate::services::gateway::{DiscordGateway, VoiceGateway};
use crate::services::localization::{ContextL10nExt, L10nProxy};
use crate::services::ownership::{ClaimOutcome, TransferOutcome};
use crate::services::rooms::Room;
use crate::{Context, Error};
use fluent::FluentArgs;
use poise::serenity_prelude as serenity;
use tracing::warn;

/// Manage the voice room you are in
#[poise::command(
    slash_command,
    guild_only,
    subcommands("limit", "platform", "build", "claim", "transfer"),
    install_context = "Guild",
    interaction_context = "Guild"
)]
pub async fn group(_ctx: Context<'_>) -> Result<(), Error> {
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

/// The tracked room the author is connected to. Replies and returns None
/// otherwise.
async fn current_room(
    ctx: Context<'_>,
    gateway: &DiscordGateway,
    l10n: &L10nProxy,
) -> Result<Option<Room>, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(None);
    };
    let rooms = &ctx.data().rooms;

    if let Some(channel_id) = gateway.voice_channel_of(guild_id, ctx.author().id) {
        if let Some(room) = rooms.registry().room(channel_id).await? {
            return Ok(Some(room));
        }
    }

    let creators = rooms.registry().creators_in_guild(guild_id).await?;
    let content = if creators.is_empty() {
        l10n.t("group-no-creators", None)
    } else {
        let list = creators
            .iter()
            .map(|c| format!("<#{}>", c.channel_id()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut args = FluentArgs::new();
        args.set("creators", list);
        l10n.t("group-not-in-room", Some(&args))
    };
    reply(ctx, content).await?;
    Ok(None)
}

/// The author's room, if they may run room commands in it.
async fn accessible_room(
    ctx: Context<'_>,
    gateway: &DiscordGateway,
    l10n: &L10nProxy,
) -> Result<Option<Room>, Error> {
    let Some(room) = current_room(ctx, gateway, l10n).await? else {
        return Ok(None);
    };

    if !ctx.data().rooms.may_command(&room, ctx.author().id).await? {
        reply(ctx, l10n.t("group-no-access", None)).await?;
        return Ok(None);
    }
    Ok(Some(room))
}

/// Set the member limit of your room
#[poise::command(slash_command, guild_only)]
pub async fn limit(
    ctx: Context<'_>,
    #[description = "Maximum number of members"]
    #[min = 1]
    #[max = 99]
    limit: u32,
) -> Result<(), Error> {
    let l10n = ctx.l10n_user();
    let gateway = DiscordGateway::from_context(ctx.serenity_context());
    let Some(room) = accessible_room(ctx, &gateway, &l10n).await? else {
        return Ok(());
    };

    let content = match ctx
        .data()
        .rooms
        .set_limit(&gateway, room.channel_id(), limit.clamp(1, 99))
        .await
    {
        Ok(Some(room)) => {
            let mut args = FluentArgs::new();
            args.set("limit", room.limit());
            l10n.t("group-limit-set", Some(&args))
        }
        Ok(None) => l10n.t("room-not-tracked", None),
        Err(e) => {
            warn!("Setting limit on {} failed: {:?}", room.channel_id(), e);
            l10n.t("group-update-failed", None)
        }
    };
    reply(ctx, content).await
}

/// Set the platform shown in your room's name
#[poise::command(slash_command, guild_only)]
pub async fn platform(
    ctx: Context<'_>,
    #[description = "Platform you are playing on"] platform: Platform,
) -> Result<(), Error> {
    let l10n = ctx.l10n_user();
    let gateway = DiscordGateway::from_context(ctx.serenity_context());
    let Some(room) = accessible_room(ctx, &gateway, &l10n).await? else {
        return Ok(());
    };

    let content = match ctx
        .data()
        .rooms
        .set_platform(&gateway, room.channel_id(), platform)
        .await
    {
        Ok(Some(_)) => {
            let mut args = FluentArgs::new();
            args.set("platform", platform.label());
            l10n.t("group-platform-set", Some(&args))
        }
        Ok(None) => l10n.t("room-not-tracked", None),
        Err(e) => {
            warn!("Setting platform on {} failed: {:?}", room.channel_id(), e);
            l10n.t("group-update-failed", None)
        }
    };
    reply(ctx, content).await
}

/// Set or clear the build shown in your room's name
#[poise::command(slash_command, guild_only)]
pub async fn build(
    ctx: Context<'_>,
    #[description = "Build or activity; leave empty to clear"]
    #[max_length = 50]
    build: Option<String>,
) -> Result<(), Error> {
    let l10n = ctx.l10n_user();
    let gateway = DiscordGateway::from_context(ctx.serenity_context());
    let Some(room) = accessible_room(ctx, &gateway, &l10n).await? else {
        return Ok(());
    };

    let content = match ctx
        .data()
        .rooms
        .set_build(&gateway, room.channel_id(), build)
        .await
    {
        Ok(Some(room)) => match room.build {
            Some(build) => {
                let mut args = FluentArgs::new();
                args.set("build", build);
                l10n.t("group-build-set", Some(&args))
            }
            None => l10n.t("group-build-cleared", None),
        },
        Ok(None) => l10n.t("room-not-tracked", None),
        Err(e) => {
            warn!("Setting build on {} failed: {:?}", room.channel_id(), e);
            l10n.t("group-update-failed", None)
        }
    };
    reply(ctx, content).await
}

/// Claim your room once its owner has left
#[poise::command(slash_command, guild_only)]
pub async fn claim(ctx: Context<'_>) -> Result<(), Error> {
    let l10n = ctx.l10n_user();
    let gateway = DiscordGateway::from_context(ctx.serenity_context());
    let Some(room) = current_room(ctx, &gateway, &l10n).await? else {
        return Ok(());
    };

    let outcome = ctx
        .data()
        .rooms
        .claim(&gateway, room.channel_id(), ctx.author().id)
        .await?;

    let key = match outcome {
        ClaimOutcome::Claimed => "claim-success",
        ClaimOutcome::AlreadyOwner => "claim-already-owner",
        ClaimOutcome::OwnerPresent => "claim-owner-present",
        ClaimOutcome::ClaimantNotConnected => "claim-not-connected",
        ClaimOutcome::NotTracked => "room-not-tracked",
    };
    reply(ctx, l10n.t(key, None)).await
}

/// Hand your room over to another member in it
#[poise::command(slash_command, guild_only)]
pub async fn transfer(
    ctx: Context<'_>,
    #[description = "The new owner"] user: serenity::User,
) -> Result<(), Error> {
    let l10n = ctx.l10n_user();
    let gateway = DiscordGateway::from_context(ctx.serenity_context());
    let Some(room) = current_room(ctx, &gateway, &l10n).await? else {
        return Ok(());
    };

    let outcome = ctx
        .data()
        .rooms
        .transfer(&gateway, room.channel_id(), ctx.author().id, user.id)
        .await?;

    let content = match outcome {
        TransferOutcome::Transferred => {
            let mut args = FluentArgs::new();
            args.set("user", format!("<@{}>", user.id));
            l10n.t("transfer-success", Some(&args))
        }
        TransferOutcome::NotOwner => l10n.t("transfer-not-owner", None),
        TransferOutcome::SelfTransfer => l10n.t("transfer-self", None),
        TransferOutcome::TargetNotConnected => l10n.t("transfer-target-not-connected", None),
        TransferOutcome::NotTracked => l10n.t("room-not-tracked", None),
    };
    reply(ctx, content).await
}
