use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::Expr;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Password).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Proposals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Proposals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Proposals::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Proposals::Description).text().not_null())
                    .col(
                        ColumnDef::new(Proposals::Category)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Proposals::CreatorAddress)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Proposals::FundingGoal)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Proposals::RaisedAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Proposals::VotesFor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Proposals::VotesAgainst)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    // in days
                    .col(ColumnDef::new(Proposals::Duration).integer().not_null())
                    .col(
                        ColumnDef::new(Proposals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Proposals::Approved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Proposals::MetisImpactScore)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Proposals::EnergyEfficiency)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Proposals::CommunityBenefit)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Proposals::InnovationFactor)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Proposals::TokenStake)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Votes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Votes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Votes::ProposalId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Votes::VoterAddress)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Votes::Support).boolean().not_null())
                    .col(
                        ColumnDef::new(Votes::StakedAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Votes::Locked)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Votes::VotedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_votes_proposal")
                            .from(Votes::Table, Votes::ProposalId)
                            .to(Proposals::Table, Proposals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Votes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Proposals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
}

#[derive(DeriveIden)]
enum Proposals {
    Table,
    Id,
    Title,
    Description,
    Category,
    CreatorAddress,
    FundingGoal,
    RaisedAmount,
    VotesFor,
    VotesAgainst,
    Duration,
    CreatedAt,
    Approved,
    MetisImpactScore,
    EnergyEfficiency,
    CommunityBenefit,
    InnovationFactor,
    TokenStake,
}

#[derive(DeriveIden)]
enum Votes {
    Table,
    Id,
    ProposalId,
    VoterAddress,
    Support,
    StakedAmount,
    Locked,
    VotedAt,
}
