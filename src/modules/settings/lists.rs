use crate::Data;
use crate::services::gateway::DiscordGateway;
use crate::services::localization::L10nProxy;
use crate::services::relations::RelationKind;
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

pub const CUSTOM_ID_PREFIX: &str = "settings-lists-";
const TRUSTED_SELECT: &str = "settings-lists-trusted";
const BLOCKED_SELECT: &str = "settings-lists-blocked";

/// Most users a select menu can hold.
pub const MAX_SELECTED: u8 = 25;

fn list_kind(custom_id: &str) -> Option<RelationKind> {
    match custom_id {
        TRUSTED_SELECT => Some(RelationKind::Trust),
        BLOCKED_SELECT => Some(RelationKind::Block),
        _ => None,
    }
}

/// The full trusted and blocked lists after one menu was submitted. The
/// other list is carried over as stored.
fn combined_selection(
    kind: RelationKind,
    values: &[serenity::UserId],
    trusted: Vec<serenity::UserId>,
    blocked: Vec<serenity::UserId>,
) -> (Vec<serenity::UserId>, Vec<serenity::UserId>) {
    match kind {
        RelationKind::Trust => (values.to_vec(), blocked),
        RelationKind::Block => (trusted, values.to_vec()),
    }
}

fn user_select(
    custom_id: &'static str,
    placeholder: String,
    current: &[serenity::UserId],
) -> serenity::CreateContainerComponent<'static> {
    let menu = serenity::CreateSelectMenu::new(
        custom_id,
        serenity::CreateSelectMenuKind::User {
            default_users: Some(current.to_vec().into()),
        },
    )
    .placeholder(placeholder)
    .min_values(0)
    .max_values(MAX_SELECTED);

    serenity::CreateContainerComponent::ActionRow(serenity::CreateActionRow::SelectMenu(menu))
}

pub fn build_list_menus(
    l10n: &L10nProxy,
    trusted: &[serenity::UserId],
    blocked: &[serenity::UserId],
) -> Vec<serenity::CreateComponent<'static>> {
    let inner_components = vec![
        serenity::CreateContainerComponent::TextDisplay(serenity::CreateTextDisplay::new(
            format!(
                "## {}\n{}",
                l10n.t("settings-lists-title", None),
                l10n.t("settings-lists-desc", None)
            ),
        )),
        serenity::CreateContainerComponent::Separator(serenity::CreateSeparator::new(true)),
        user_select(
            TRUSTED_SELECT,
            l10n.t("settings-lists-trusted-placeholder", None),
            trusted,
        ),
        user_select(
            BLOCKED_SELECT,
            l10n.t("settings-lists-blocked-placeholder", None),
            blocked,
        ),
    ];

    vec![serenity::CreateComponent::Container(
        serenity::CreateContainer::new(inner_components),
    )]
}

/// Stores a submitted trusted or blocked menu for the user who submitted it
/// and redraws both menus from the stored lists.
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), crate::Error> {
    let Some(guild_id) = interaction.guild_id else {
        return Ok(());
    };
    let Some(kind) = list_kind(&interaction.data.custom_id) else {
        return Ok(());
    };
    let values: Vec<serenity::UserId> = match &interaction.data.kind {
        serenity::ComponentInteractionDataKind::UserSelect { values } => {
            values.iter().copied().collect()
        }
        _ => return Ok(()),
    };

    let owner_id = interaction.user.id;
    let relations = data.rooms.relations();
    let (trusted, blocked) = combined_selection(
        kind,
        &values,
        relations.list(RelationKind::Trust, owner_id, guild_id).await?,
        relations.list(RelationKind::Block, owner_id, guild_id).await?,
    );
    let (trust_diff, block_diff) = relations
        .apply_selection(owner_id, guild_id, &trusted, &blocked)
        .await?;

    if !trust_diff.is_empty() || !block_diff.is_empty() {
        info!(
            "{} updated lists in {}: trust {:?}, block {:?}",
            owner_id, guild_id, trust_diff, block_diff
        );
        let gateway = DiscordGateway::from_context(ctx);
        if let Err(e) = data
            .rooms
            .reevaluate_owned_rooms(&gateway, guild_id, owner_id)
            .await
        {
            warn!("Re-evaluating rooms of {} in {} failed: {:?}", owner_id, guild_id, e);
        }
    }

    let l10n = data.l10n.get_proxy(&interaction.locale.to_string());
    let trusted = relations.list(RelationKind::Trust, owner_id, guild_id).await?;
    let blocked = relations.list(RelationKind::Block, owner_id, guild_id).await?;
    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .components(build_list_menus(&l10n, &trusted, &blocked)),
            ),
        )
        .await?;

    Ok(())
}
