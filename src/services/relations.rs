use crate::db::entities::platform_roles::{self, Platform};
use crate::db::entities::{staff_roles, user_blocks, user_trusts};
use crate::db::{from_db_id, to_db_id};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Trust,
    Block,
}

impl RelationKind {
    fn opposite(self) -> Self {
        match self {
            RelationKind::Trust => RelationKind::Block,
            RelationKind::Block => RelationKind::Trust,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationChange {
    Added,
    Unchanged,
    /// Owners cannot trust or block themselves.
    SelfTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionDiff {
    pub added: Vec<serenity::UserId>,
    pub removed: Vec<serenity::UserId>,
}

impl SelectionDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Trust/block edges plus guild-wide staff and platform roles.
pub struct RelationService {
    db: DatabaseConnection,
}

impl RelationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        kind: RelationKind,
        owner_id: serenity::UserId,
        guild_id: serenity::GuildId,
    ) -> Result<Vec<serenity::UserId>, DbErr> {
        list_edges(&self.db, kind, owner_id, guild_id).await
    }

    pub async fn trusted_set(
        &self,
        owner_id: serenity::UserId,
        guild_id: serenity::GuildId,
    ) -> Result<HashSet<serenity::UserId>, DbErr> {
        Ok(self
            .list(RelationKind::Trust, owner_id, guild_id)
            .await?
            .into_iter()
            .collect())
    }

    /// Adds one edge and drops the opposite one in the same transaction, so
    /// a pair is never trusted and blocked at once.
    pub async fn add(
        &self,
        kind: RelationKind,
        owner_id: serenity::UserId,
        guild_id: serenity::GuildId,
        target_id: serenity::UserId,
    ) -> Result<RelationChange, DbErr> {
        if owner_id == target_id {
            return Ok(RelationChange::SelfTarget);
        }

        let txn = self.db.begin().await?;
        delete_edge(&txn, kind.opposite(), owner_id, guild_id, target_id).await?;
        let inserted = insert_edge(&txn, kind, owner_id, guild_id, target_id).await?;
        txn.commit().await?;

        Ok(if inserted {
            RelationChange::Added
        } else {
            RelationChange::Unchanged
        })
    }

    /// Returns whether an edge existed.
    pub async fn remove(
        &self,
        kind: RelationKind,
        owner_id: serenity::UserId,
        guild_id: serenity::GuildId,
        target_id: serenity::UserId,
    ) -> Result<bool, DbErr> {
        Ok(delete_edge(&self.db, kind, owner_id, guild_id, target_id).await? > 0)
    }

    /// Makes the stored list equal to `selection`. Rows present on both sides
    /// are left alone so their timestamps survive.
    pub async fn set_list(
        &self,
        kind: RelationKind,
        owner_id: serenity::UserId,
        guild_id: serenity::GuildId,
        selection: &[serenity::UserId],
    ) -> Result<SelectionDiff, DbErr> {
        let selected: HashSet<serenity::UserId> = selection
            .iter()
            .copied()
            .filter(|id| *id != owner_id)
            .collect();

        let txn = self.db.begin().await?;
        let existing: HashSet<serenity::UserId> = list_edges(&txn, kind, owner_id, guild_id)
            .await?
            .into_iter()
            .collect();

        let mut diff = SelectionDiff::default();
        for id in existing.difference(&selected) {
            delete_edge(&txn, kind, owner_id, guild_id, *id).await?;
            diff.removed.push(*id);
        }
        for id in selected.difference(&existing) {
            delete_edge(&txn, kind.opposite(), owner_id, guild_id, *id).await?;
            insert_edge(&txn, kind, owner_id, guild_id, *id).await?;
            diff.added.push(*id);
        }
        txn.commit().await?;

        diff.added.sort();
        diff.removed.sort();
        Ok(diff)
    }

    /// Applies a combined trust and block selection. A user picked on both
    /// sides ends up blocked.
    pub async fn apply_selection(
        &self,
        owner_id: serenity::UserId,
        guild_id: serenity::GuildId,
        trusted: &[serenity::UserId],
        blocked: &[serenity::UserId],
    ) -> Result<(SelectionDiff, SelectionDiff), DbErr> {
        let trusted: Vec<serenity::UserId> = trusted
            .iter()
            .copied()
            .filter(|id| !blocked.contains(id))
            .collect();

        let block_diff = self
            .set_list(RelationKind::Block, owner_id, guild_id, blocked)
            .await?;
        let trust_diff = self
            .set_list(RelationKind::Trust, owner_id, guild_id, &trusted)
            .await?;

        Ok((trust_diff, block_diff))
    }

    pub async fn staff_roles(
        &self,
        guild_id: serenity::GuildId,
    ) -> Result<HashSet<serenity::RoleId>, DbErr> {
        let rows = staff_roles::Entity::find()
            .filter(staff_roles::Column::GuildId.eq(to_db_id(guild_id.get())))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| serenity::RoleId::new(from_db_id(r.role_id)))
            .collect())
    }

    pub async fn add_staff_role(
        &self,
        guild_id: serenity::GuildId,
        role_id: serenity::RoleId,
    ) -> Result<bool, DbErr> {
        let model = staff_roles::ActiveModel {
            guild_id: Set(to_db_id(guild_id.get())),
            role_id: Set(to_db_id(role_id.get())),
        };

        let rows = staff_roles::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([staff_roles::Column::GuildId, staff_roles::Column::RoleId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(rows > 0)
    }

    pub async fn remove_staff_role(
        &self,
        guild_id: serenity::GuildId,
        role_id: serenity::RoleId,
    ) -> Result<bool, DbErr> {
        let res = staff_roles::Entity::delete_many()
            .filter(staff_roles::Column::GuildId.eq(to_db_id(guild_id.get())))
            .filter(staff_roles::Column::RoleId.eq(to_db_id(role_id.get())))
            .exec(&self.db)
            .await?;

        Ok(res.rows_affected > 0)
    }

    pub async fn platform_roles(
        &self,
        guild_id: serenity::GuildId,
    ) -> Result<Vec<(serenity::RoleId, Platform)>, DbErr> {
        let rows = platform_roles::Entity::find()
            .filter(platform_roles::Column::GuildId.eq(to_db_id(guild_id.get())))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| (serenity::RoleId::new(from_db_id(r.role_id)), r.platform))
            .collect())
    }

    pub async fn set_platform_role(
        &self,
        guild_id: serenity::GuildId,
        role_id: serenity::RoleId,
        platform: Platform,
    ) -> Result<(), DbErr> {
        let model = platform_roles::ActiveModel {
            role_id: Set(to_db_id(role_id.get())),
            guild_id: Set(to_db_id(guild_id.get())),
            platform: Set(platform),
        };

        platform_roles::Entity::insert(model)
            .on_conflict(
                OnConflict::column(platform_roles::Column::RoleId)
                    .update_column(platform_roles::Column::Platform)
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }
}

async fn list_edges<C: ConnectionTrait>(
    conn: &C,
    kind: RelationKind,
    owner_id: serenity::UserId,
    guild_id: serenity::GuildId,
) -> Result<Vec<serenity::UserId>, DbErr> {
    let owner = to_db_id(owner_id.get());
    let guild = to_db_id(guild_id.get());

    let ids: Vec<i64> = match kind {
        RelationKind::Trust => user_trusts::Entity::find()
            .filter(user_trusts::Column::OwnerId.eq(owner))
            .filter(user_trusts::Column::GuildId.eq(guild))
            .all(conn)
            .await?
            .into_iter()
            .map(|r| r.trusted_id)
            .collect(),
        RelationKind::Block => user_blocks::Entity::find()
            .filter(user_blocks::Column::OwnerId.eq(owner))
            .filter(user_blocks::Column::GuildId.eq(guild))
            .all(conn)
            .await?
            .into_iter()
            .map(|r| r.blocked_id)
            .collect(),
    };

    Ok(ids
        .into_iter()
        .map(|id| serenity::UserId::new(from_db_id(id)))
        .collect())
}

/// Insert-if-absent. Returns whether a row was written.
async fn insert_edge<C: ConnectionTrait>(
    conn: &C,
    kind: RelationKind,
    owner_id: serenity::UserId,
    guild_id: serenity::GuildId,
    target_id: serenity::UserId,
) -> Result<bool, DbErr> {
    let owner = to_db_id(owner_id.get());
    let guild = to_db_id(guild_id.get());
    let target = to_db_id(target_id.get());
    let now = Utc::now();

    let rows = match kind {
        RelationKind::Trust => {
            user_trusts::Entity::insert(user_trusts::ActiveModel {
                owner_id: Set(owner),
                guild_id: Set(guild),
                trusted_id: Set(target),
                created_at: Set(now.into()),
            })
            .on_conflict(
                OnConflict::columns([
                    user_trusts::Column::OwnerId,
                    user_trusts::Column::GuildId,
                    user_trusts::Column::TrustedId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?
        }
        RelationKind::Block => {
            user_blocks::Entity::insert(user_blocks::ActiveModel {
                owner_id: Set(owner),
                guild_id: Set(guild),
                blocked_id: Set(target),
                created_at: Set(now.into()),
            })
            .on_conflict(
                OnConflict::columns([
                    user_blocks::Column::OwnerId,
                    user_blocks::Column::GuildId,
                    user_blocks::Column::BlockedId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?
        }
    };

    Ok(rows > 0)
}

async fn delete_edge<C: ConnectionTrait>(
    conn: &C,
    kind: RelationKind,
    owner_id: serenity::UserId,
    guild_id: serenity::GuildId,
    target_id: serenity::UserId,
) -> Result<u64, DbErr> {
    let owner = to_db_id(owner_id.get());
    let guild = to_db_id(guild_id.get());
    let target = to_db_id(target_id.get());

    let res = match kind {
        RelationKind::Trust => {
            user_trusts::Entity::delete_many()
                .filter(user_trusts::Column::OwnerId.eq(owner))
                .filter(user_trusts::Column::GuildId.eq(guild))
                .filter(user_trusts::Column::TrustedId.eq(target))
                .exec(conn)
                .await?
        }
        RelationKind::Block => {
            user_blocks::Entity::delete_many()
                .filter(user_blocks::Column::OwnerId.eq(owner))
                .filter(user_blocks::Column::GuildId.eq(guild))
                .filter(user_blocks::Column::BlockedId.eq(target))
                .exec(conn)
                .await?
        }
    };

    Ok(res.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;

    const GUILD: u64 = 1398084425169895434;
    const OWNER: u64 = 1448575022439596062;

    fn guild() -> serenity::GuildId {
        serenity::GuildId::new(GUILD)
    }

    fn owner() -> serenity::UserId {
        serenity::UserId::new(OWNER)
    }

    fn user(id: u64) -> serenity::UserId {
        serenity::UserId::new(id)
    }

    async fn service() -> RelationService {
        RelationService::new(test_connection().await)
    }

    #[tokio::test]
    async fn trust_and_block_are_mutually_exclusive() {
        let svc = service().await;
        let target = user(500);

        assert_eq!(
            svc.add(RelationKind::Block, owner(), guild(), target).await.unwrap(),
            RelationChange::Added
        );
        assert_eq!(
            svc.add(RelationKind::Trust, owner(), guild(), target).await.unwrap(),
            RelationChange::Added
        );
        assert_eq!(svc.list(RelationKind::Trust, owner(), guild()).await.unwrap(), vec![target]);
        assert!(svc.list(RelationKind::Block, owner(), guild()).await.unwrap().is_empty());

        svc.add(RelationKind::Block, owner(), guild(), target).await.unwrap();
        assert!(svc.list(RelationKind::Trust, owner(), guild()).await.unwrap().is_empty());
        assert_eq!(svc.list(RelationKind::Block, owner(), guild()).await.unwrap(), vec![target]);
    }

    #[tokio::test]
    async fn repeated_add_is_a_no_op() {
        let svc = service().await;
        svc.add(RelationKind::Trust, owner(), guild(), user(7)).await.unwrap();
        assert_eq!(
            svc.add(RelationKind::Trust, owner(), guild(), user(7)).await.unwrap(),
            RelationChange::Unchanged
        );
        assert_eq!(svc.list(RelationKind::Trust, owner(), guild()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn self_targets_are_rejected() {
        let svc = service().await;
        assert_eq!(
            svc.add(RelationKind::Block, owner(), guild(), owner()).await.unwrap(),
            RelationChange::SelfTarget
        );
        assert!(svc.list(RelationKind::Block, owner(), guild()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_list_diffs_and_keeps_existing_rows() {
        let svc = service().await;
        svc.add(RelationKind::Trust, owner(), guild(), user(1)).await.unwrap();
        svc.add(RelationKind::Trust, owner(), guild(), user(2)).await.unwrap();

        let before = user_trusts::Entity::find_by_id((
            to_db_id(OWNER),
            to_db_id(GUILD),
            to_db_id(2),
        ))
        .one(&svc.db)
        .await
        .unwrap()
        .unwrap();

        let diff = svc
            .set_list(RelationKind::Trust, owner(), guild(), &[user(2), user(3), owner()])
            .await
            .unwrap();
        assert_eq!(diff.added, vec![user(3)]);
        assert_eq!(diff.removed, vec![user(1)]);

        let after = user_trusts::Entity::find_by_id((
            to_db_id(OWNER),
            to_db_id(GUILD),
            to_db_id(2),
        ))
        .one(&svc.db)
        .await
        .unwrap()
        .unwrap();
        assert_eq!(before.created_at, after.created_at);
    }

    #[tokio::test]
    async fn combined_selection_resolves_overlap_as_block() {
        let svc = service().await;
        let (trust, block) = svc
            .apply_selection(owner(), guild(), &[user(1), user(2)], &[user(2), user(3)])
            .await
            .unwrap();

        assert_eq!(trust.added, vec![user(1)]);
        assert_eq!(block.added, vec![user(2), user(3)]);

        let mut trusted = svc.list(RelationKind::Trust, owner(), guild()).await.unwrap();
        let mut blocked = svc.list(RelationKind::Block, owner(), guild()).await.unwrap();
        trusted.sort();
        blocked.sort();
        assert_eq!(trusted, vec![user(1)]);
        assert_eq!(blocked, vec![user(2), user(3)]);
    }

    #[tokio::test]
    async fn platform_roles_upsert_by_role() {
        let svc = service().await;
        let role = serenity::RoleId::new(77);
        svc.set_platform_role(guild(), role, Platform::Steam).await.unwrap();
        svc.set_platform_role(guild(), role, Platform::Ps5).await.unwrap();

        assert_eq!(
            svc.platform_roles(guild()).await.unwrap(),
            vec![(role, Platform::Ps5)]
        );
    }

    #[tokio::test]
    async fn staff_roles_round_trip() {
        let svc = service().await;
        let role = serenity::RoleId::new(1448575022439596062);
        assert!(svc.add_staff_role(guild(), role).await.unwrap());
        assert!(!svc.add_staff_role(guild(), role).await.unwrap());
        assert!(svc.staff_roles(guild()).await.unwrap().contains(&role));
        assert!(svc.remove_staff_role(guild(), role).await.unwrap());
        assert!(svc.staff_roles(guild()).await.unwrap().is_empty());
    }
}
