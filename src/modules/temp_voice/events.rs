use crate::services::gateway::DiscordGateway;
use crate::services::lifecycle::{MemberInfo, VoiceTransition};
use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use tracing::debug;

pub fn handler<'a>(
    ctx: &'a serenity::Context,
    event: &'a serenity::FullEvent,
    data: &'a Data,
) -> poise::BoxFuture<'a, Result<(), Error>> {
    Box::pin(async move { handle_event(ctx, event, data).await })
}

async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::VoiceStateUpdate { old, new, .. } => {
            let Some(guild_id) = new.guild_id else {
                return Ok(());
            };

            let old_channel = old.as_ref().and_then(|s| s.channel_id);
            if old_channel == new.channel_id {
                return Ok(());
            }

            let transition = VoiceTransition {
                guild_id,
                user_id: new.user_id,
                member: member_info(new),
                old_channel,
                new_channel: new.channel_id,
            };
            debug!(
                "Voice transition in {}: {} {:?} -> {:?}",
                guild_id, new.user_id, old_channel, new.channel_id
            );

            let gateway = DiscordGateway::from_context(ctx);
            data.rooms
                .handle_voice_transition(&gateway, transition)
                .await?;
        }
        serenity::FullEvent::GuildCreate { guild, .. } => {
            let gateway = DiscordGateway::from_context(ctx);
            data.rooms.sweep_guild(&gateway, guild.id).await?;
        }
        serenity::FullEvent::ChannelUpdate { new, .. } => {
            let gateway = DiscordGateway::from_context(ctx);
            data.rooms.sync_room(&gateway, new.id).await?;
        }
        serenity::FullEvent::ChannelDelete { channel, .. } => {
            data.rooms.forget_channel(channel.id).await?;
        }
        _ => {}
    }

    Ok(())
}

fn member_info(state: &serenity::VoiceState) -> MemberInfo {
    match &state.member {
        Some(member) => MemberInfo {
            display_name: member.display_name().to_string(),
            role_ids: member.roles.iter().copied().collect(),
        },
        None => MemberInfo {
            display_name: state.user_id.to_string(),
            role_ids: vec![],
        },
    }
}
