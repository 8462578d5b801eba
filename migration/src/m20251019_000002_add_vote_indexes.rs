use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One vote per wallet per proposal
        manager
            .create_index(
                Index::create()
                    .name("idx_votes_proposal_voter")
                    .table(Votes::Table)
                    .col(Votes::ProposalId)
                    .col(Votes::VoterAddress)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_votes_voter")
                    .table(Votes::Table)
                    .col(Votes::VoterAddress)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_proposals_approved")
                    .table(Proposals::Table)
                    .col(Proposals::Approved)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_proposals_approved")
                    .table(Proposals::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_votes_voter")
                    .table(Votes::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_votes_proposal_voter")
                    .table(Votes::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Votes {
    Table,
    ProposalId,
    VoterAddress,
}

#[derive(DeriveIden)]
enum Proposals {
    Table,
    Approved,
}
